//! Process image replacement.
//!
//! Converts the command, its arguments and the environment into the
//! NUL-terminated form `execve(2)` expects, then replaces the running image.

use std::convert::Infallible;
use std::ffi::{CString, OsString};
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use isobox_common::error::{IsoboxError, Result};

/// Converts raw bytes to a `CString`, rejecting interior NUL bytes.
///
/// # Errors
///
/// Returns [`IsoboxError::Config`] naming `what` if `bytes` contains a NUL.
pub fn to_cstring(bytes: impl Into<Vec<u8>>, what: &str) -> Result<CString> {
    CString::new(bytes).map_err(|e| IsoboxError::Config {
        message: format!("{what} contains an interior NUL byte at offset {}", e.nul_position()),
    })
}

/// Resolves the target command to the path handed to `execve(2)`.
///
/// A command containing a `/` is used as given; a bare name is looked up
/// in `PATH`.
///
/// # Errors
///
/// Returns [`IsoboxError::Config`] for an empty command and
/// [`IsoboxError::Exec`] with kind `NotFound` when a bare name is not on
/// `PATH`.
pub fn resolve_command(command: &str) -> Result<PathBuf> {
    if command.is_empty() {
        return Err(IsoboxError::Config {
            message: "command must not be empty".into(),
        });
    }
    if command.contains('/') {
        return Ok(PathBuf::from(command));
    }
    which::which(command).map_err(|e| IsoboxError::Exec {
        command: command.to_owned(),
        source: io::Error::new(io::ErrorKind::NotFound, e),
    })
}

/// Builds `argv` as `[command, args...]`.
///
/// # Errors
///
/// Returns an error if any element contains a NUL byte.
pub fn build_argv(command: &str, args: &[String]) -> Result<Vec<CString>> {
    std::iter::once(command)
        .chain(args.iter().map(String::as_str))
        .map(|arg| to_cstring(arg, "argument"))
        .collect()
}

/// Builds `envp` entries of the form `KEY=VALUE` from environment pairs.
///
/// Values are passed through byte for byte; non-UTF-8 content is kept.
///
/// # Errors
///
/// Returns an error if any entry contains a NUL byte.
pub fn build_envp<I>(vars: I) -> Result<Vec<CString>>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .map(|(key, value)| {
            let mut entry = key.into_vec();
            entry.push(b'=');
            entry.extend_from_slice(&value.into_vec());
            to_cstring(entry, "environment entry")
        })
        .collect()
}

/// Replaces the current process image with `program`.
///
/// On success this never returns: the calling process keeps its PID but
/// now runs `program`. The `Ok` type is uninhabited.
///
/// # Errors
///
/// Returns [`IsoboxError::Exec`] if `execve(2)` fails; the process is then
/// still running the caller's code.
pub fn replace_image(program: &Path, argv: &[CString], envp: &[CString]) -> Result<Infallible> {
    let path = to_cstring(program.as_os_str().as_bytes(), "command path")?;
    tracing::info!(program = %program.display(), argc = argv.len(), "replacing process image");
    let Err(errno) = nix::unistd::execve(&path, argv, envp);
    Err(IsoboxError::Exec {
        command: program.display().to_string(),
        source: errno.into(),
    })
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[test]
    fn paths_are_not_looked_up() {
        let path = resolve_command("/definitely/not/here").unwrap();
        assert_eq!(path, PathBuf::from("/definitely/not/here"));
    }

    #[test]
    fn bare_names_are_found_on_path() {
        let path = resolve_command("sh").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("sh"));
    }

    #[test]
    fn unknown_bare_name_is_not_found() {
        let err = resolve_command("isobox-no-such-program-7f3a").unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn empty_command_is_config_error() {
        assert!(matches!(resolve_command(""), Err(IsoboxError::Config { .. })));
    }

    #[test]
    fn argv_starts_with_command() {
        let argv = build_argv("/bin/sh", &["-c".into(), "ps".into()]).unwrap();
        let argv: Vec<_> = argv.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(argv, ["/bin/sh", "-c", "ps"]);
    }

    #[test]
    fn argv_rejects_nul_bytes() {
        let err = build_argv("/bin/sh", &["a\0b".into()]).unwrap_err();
        assert!(err.to_string().contains("offset 1"), "got: {err}");
    }

    #[test]
    fn envp_joins_pairs_verbatim() {
        let envp = build_envp([
            (OsString::from("PATH"), OsString::from("/usr/bin:/bin")),
            (OsString::from("EMPTY"), OsString::new()),
            (OsString::from("RAW"), OsString::from_vec(vec![0xff, b'x'])),
        ])
        .unwrap();
        assert_eq!(envp[0].as_bytes(), b"PATH=/usr/bin:/bin");
        assert_eq!(envp[1].as_bytes(), b"EMPTY=");
        assert_eq!(envp[2].as_bytes(), b"RAW=\xffx");
    }

    #[test]
    fn failed_exec_of_missing_file_is_not_found() {
        let argv = build_argv("/nonexistent/isobox-target", &[]).unwrap();
        let err = replace_image(Path::new("/nonexistent/isobox-target"), &argv, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn failed_exec_of_non_executable_file_is_126() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("not-executable");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();
        let argv = build_argv(script.to_str().unwrap(), &[]).unwrap();
        let err = replace_image(&script, &argv, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 126);
    }
}
