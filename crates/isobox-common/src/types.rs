//! Domain primitive types used across the isobox workspace.

use std::fmt;

/// Identifier attached to one launch, used to correlate log lines of the
/// launcher and its bootstrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    /// Number of hex characters kept from the generated UUID.
    const SHORT_LEN: usize = 12;

    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random short container ID.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(Self::SHORT_LEN);
        Self(id)
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of the bootstrapper through its isolation steps.
///
/// The order of the variants is the order the steps run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootstrapStage {
    /// Running inside the new namespaces, nothing done yet.
    Created,
    /// Mount propagation of `/` made private and recursive.
    PrivateMount,
    /// Fresh procfs mounted for the new PID namespace.
    ProcMounted,
    /// About to replace the process image with the target command.
    Exec,
}

impl BootstrapStage {
    /// Returns the stage that follows this one, or `None` at the end.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::PrivateMount),
            Self::PrivateMount => Some(Self::ProcMounted),
            Self::ProcMounted => Some(Self::Exec),
            Self::Exec => None,
        }
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::PrivateMount => write!(f, "private-mount"),
            Self::ProcMounted => write!(f, "proc-mounted"),
            Self::Exec => write!(f, "exec"),
        }
    }
}
