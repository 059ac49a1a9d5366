//! Mount operations for the container's private mount namespace.
//!
//! Both functions must only be called from a process that already lives in
//! its own mount namespace; called from the host they would reconfigure the
//! host's mount table.

use std::path::Path;

use isobox_common::error::{IsoboxError, Result};

/// Flags for the procfs mount: no binaries, no set-user/group-ID, no devices.
#[cfg(target_os = "linux")]
#[must_use]
pub const fn proc_mount_flags() -> nix::mount::MsFlags {
    use nix::mount::MsFlags;

    MsFlags::MS_NOEXEC
        .union(MsFlags::MS_NOSUID)
        .union(MsFlags::MS_NODEV)
}

/// Re-mounts `root` as recursively private, detaching the whole tree below
/// it from the host's shared propagation group.
///
/// Must run before any other mount in the namespace, otherwise mount events
/// propagate back to the host.
///
/// # Errors
///
/// Returns [`IsoboxError::Mount`] if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn make_mount_tree_private(root: &Path) -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        None::<&str>,
        root,
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| IsoboxError::Mount {
        target: root.to_path_buf(),
        source: e.into(),
    })?;
    tracing::debug!(root = %root.display(), "mount propagation set to private");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: mount namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn make_mount_tree_private(_root: &Path) -> Result<()> {
    Err(IsoboxError::Config {
        message: "Linux required for native container operations".into(),
    })
}

/// Mounts a fresh procfs at `target`.
///
/// Inside a new PID namespace the mounted filesystem only lists processes
/// of that namespace. Mounting again on the same target stacks a new
/// instance on top of the previous one.
///
/// # Errors
///
/// Returns [`IsoboxError::Mount`] if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_proc(target: &Path) -> Result<()> {
    use isobox_common::constants::PROC_FS_TYPE;
    use nix::mount::mount;

    mount(
        Some(PROC_FS_TYPE),
        target,
        Some(PROC_FS_TYPE),
        proc_mount_flags(),
        None::<&str>,
    )
    .map_err(|e| IsoboxError::Mount {
        target: target.to_path_buf(),
        source: e.into(),
    })?;
    tracing::debug!(target = %target.display(), "procfs mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: procfs requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_proc(_target: &Path) -> Result<()> {
    Err(IsoboxError::Config {
        message: "Linux required for native container operations".into(),
    })
}
