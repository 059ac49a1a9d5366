//! Creating a child process inside new namespaces.
//!
//! Wraps `clone(2)` so that every requested namespace is assigned atomically
//! at creation time, then immediately `execv(2)`s the given program in the
//! child. Everything the child touches between the two calls, down to the
//! NUL-terminated `argv` pointer array, is prepared by the parent. `clone(2)`
//! runs no fork handlers, so the child must not allocate: it only calls
//! `dup2` and `execv` from `libc`.

use std::path::Path;

use isobox_common::error::{IsoboxError, Result};

use super::NamespaceConfig;

/// What the child's standard streams are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Share the parent's stdin, stdout and stderr.
    Inherit,
    /// Bind all three streams to `/dev/null`.
    Null,
}

impl StdioMode {
    /// Returns [`StdioMode::Inherit`] for interactive launches.
    #[must_use]
    pub const fn from_interactive(interactive: bool) -> Self {
        if interactive { Self::Inherit } else { Self::Null }
    }
}

/// Clones a child into the configured namespaces and execs `program` in it.
///
/// `argv` is passed verbatim, including `argv[0]`. The child inherits the
/// parent's environment. If the exec itself fails the child exits with 127
/// (not found) or 126.
///
/// # Errors
///
/// Returns [`IsoboxError::Spawn`] if `clone(2)` fails, for example for lack
/// of privilege or a kernel without one of the namespaces, and
/// [`IsoboxError::Config`] if `program` or `argv` contain a NUL byte.
#[cfg(target_os = "linux")]
pub fn clone_and_exec(
    program: &Path,
    argv: &[String],
    namespaces: &NamespaceConfig,
    stdio: StdioMode,
) -> Result<nix::unistd::Pid> {
    use std::fs::OpenOptions;
    use std::os::fd::AsRawFd;
    use std::os::unix::ffi::OsStrExt;

    use isobox_common::constants::{
        CHILD_STACK_SIZE, DEV_NULL, EXIT_COMMAND_NOT_EXECUTABLE, EXIT_COMMAND_NOT_FOUND,
        EXIT_SETUP_FAILED,
    };
    use nix::errno::Errno;
    use nix::sched::clone;
    use nix::sys::signal::Signal;

    use crate::exec::to_cstring;

    let path = to_cstring(program.as_os_str().as_bytes(), "program path")?;
    let args = argv
        .iter()
        .map(|arg| to_cstring(arg.as_str(), "argument"))
        .collect::<Result<Vec<_>>>()?;
    let arg_ptrs = exec_pointers(&args);

    let dev_null = match stdio {
        StdioMode::Inherit => None,
        StdioMode::Null => Some(
            OpenOptions::new()
                .read(true)
                .write(true)
                .open(DEV_NULL)
                .map_err(|e| IsoboxError::Io {
                    path: DEV_NULL.into(),
                    source: e,
                })?,
        ),
    };
    let null_fd = dev_null.as_ref().map(AsRawFd::as_raw_fd);

    let child = Box::new(|| -> isize {
        if let Some(fd) = null_fd {
            for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
                // SAFETY: fd is an open descriptor owned by `dev_null`, which
                // outlives the clone call; dup2 is async-signal-safe.
                if unsafe { libc::dup2(fd, target) } < 0 {
                    return EXIT_SETUP_FAILED as isize;
                }
            }
        }
        // SAFETY: `path` and every pointer in `arg_ptrs` point into CStrings
        // owned by the parent frame, which outlives the clone call, and the
        // array ends with a null pointer.
        unsafe { libc::execv(path.as_ptr(), arg_ptrs.as_ptr()) };
        if Errno::last() == Errno::ENOENT {
            EXIT_COMMAND_NOT_FOUND as isize
        } else {
            EXIT_COMMAND_NOT_EXECUTABLE as isize
        }
    });

    let flags = namespaces.to_clone_flags();
    let mut stack = vec![0_u8; CHILD_STACK_SIZE];
    // SAFETY: CLONE_VM is not set, so the child runs on a private copy of
    // the address space and `stack` stays valid in both processes. The
    // callback only calls dup2 and execv on data prepared above.
    let pid = unsafe { clone(child, &mut stack, flags, Some(Signal::SIGCHLD as libc::c_int)) }
        .map_err(|e| {
            tracing::error!(error = %e, ?flags, "clone failed");
            IsoboxError::Spawn { source: e.into() }
        })?;

    tracing::debug!(pid = pid.as_raw(), namespaces = ?namespaces.enabled(), "child cloned");
    Ok(pid)
}

/// Returns the `argv` array for `execv(2)`: one pointer per argument,
/// followed by a null terminator. The pointers borrow from `args`.
#[cfg(target_os = "linux")]
fn exec_pointers(args: &[std::ffi::CString]) -> Vec<*const std::ffi::c_char> {
    args.iter()
        .map(|arg| arg.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect()
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn clone_and_exec(
    _program: &Path,
    _argv: &[String],
    _namespaces: &NamespaceConfig,
    _stdio: StdioMode,
) -> Result<nix::unistd::Pid> {
    Err(IsoboxError::Config {
        message: "Linux required for native container operations".into(),
    })
}
