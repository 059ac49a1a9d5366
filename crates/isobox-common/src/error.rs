//! Unified error type for the isobox workspace.
//!
//! Every variant maps to a process exit status through
//! [`IsoboxError::exit_code`], so the binary can terminate with a status
//! that tells the caller which stage failed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::constants::{
    EXIT_COMMAND_NOT_EXECUTABLE, EXIT_COMMAND_NOT_FOUND, EXIT_FAILURE, EXIT_SETUP_FAILED,
};

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum IsoboxError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A configuration value or argument is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The OS refused to create the namespaced child process.
    #[error("failed to create isolated process: {source}")]
    Spawn {
        /// Underlying OS error.
        source: io::Error,
    },

    /// Waiting for the child process failed.
    #[error("failed to wait for pid {pid}: {source}")]
    Wait {
        /// PID that was being waited on.
        pid: i32,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A mount operation inside the new mount namespace failed.
    #[error("mount of {target} failed: {source}")]
    Mount {
        /// Mount point the operation targeted.
        target: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Setting the hostname inside the UTS namespace failed.
    #[error("sethostname {hostname:?} failed: {source}")]
    Hostname {
        /// Requested hostname.
        hostname: String,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Replacing the process image with the target command failed.
    #[error("exec {command} failed: {source}")]
    Exec {
        /// Command that could not be executed.
        command: String,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The bootstrapper was started outside a freshly created PID namespace.
    #[error("refusing to bootstrap: running as pid {pid}, expected pid 1 of a new namespace")]
    NotInNamespace {
        /// PID the bootstrapper observed for itself.
        pid: i32,
    },
}

impl IsoboxError {
    /// Returns the process exit status that reports this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exec { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                EXIT_COMMAND_NOT_FOUND
            }
            Self::Exec { .. } => EXIT_COMMAND_NOT_EXECUTABLE,
            Self::Mount { .. } | Self::Hostname { .. } | Self::NotInNamespace { .. } => {
                EXIT_SETUP_FAILED
            }
            Self::Io { .. } | Self::Config { .. } | Self::Spawn { .. } | Self::Wait { .. } => {
                EXIT_FAILURE
            }
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, IsoboxError>;
