//! Configuration model for the bootstrapper.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How the bootstrapper reacts when an isolation mount fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MountPolicy {
    /// Any mount failure aborts the bootstrap before the target runs.
    #[default]
    Strict,
    /// Mount failures are logged and the bootstrap continues.
    BestEffort,
}

impl MountPolicy {
    /// Returns the command-line spelling of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::BestEffort => "best-effort",
        }
    }
}

impl fmt::Display for MountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "best-effort" => Ok(Self::BestEffort),
            other => Err(format!(
                "unknown mount policy {other:?} (expected \"strict\" or \"best-effort\")"
            )),
        }
    }
}

/// Settings that travel from the launcher to the bootstrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Where the fresh procfs is mounted.
    pub proc_mount_point: PathBuf,
    /// Reaction to mount failures.
    pub mount_policy: MountPolicy,
    /// Hostname to set inside the UTS namespace, if any.
    pub hostname: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            proc_mount_point: PathBuf::from(crate::constants::PROC_MOUNT_POINT),
            mount_policy: MountPolicy::default(),
            hostname: None,
        }
    }
}
