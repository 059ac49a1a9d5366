//! UTS namespace isolation.
//!
//! Allows the container to have its own hostname.

use isobox_common::error::{IsoboxError, Result};

/// Sets the hostname inside the caller's UTS namespace.
///
/// # Errors
///
/// Returns [`IsoboxError::Hostname`] for an empty name or if
/// `sethostname(2)` fails.
#[cfg(target_os = "linux")]
pub fn set_hostname(hostname: &str) -> Result<()> {
    if hostname.is_empty() {
        return Err(IsoboxError::Hostname {
            hostname: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty hostname"),
        });
    }
    nix::unistd::sethostname(hostname).map_err(|e| IsoboxError::Hostname {
        hostname: hostname.to_owned(),
        source: e.into(),
    })?;
    tracing::debug!(hostname, "container hostname set");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: UTS namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn set_hostname(_hostname: &str) -> Result<()> {
    Err(IsoboxError::Config {
        message: "Linux required for native container operations".into(),
    })
}
