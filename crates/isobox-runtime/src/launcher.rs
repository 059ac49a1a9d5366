//! Parent side of the isolation bootstrap.
//!
//! Re-executes the running binary with the `init` sentinel inside fresh
//! UTS, PID, mount, network, and IPC namespaces, then blocks until that
//! child terminates. The child's exit status is reported to the caller, but
//! the binary itself always exits with
//! [`LAUNCHER_EXIT_STATUS`](isobox_common::constants::LAUNCHER_EXIT_STATUS).

use std::fmt;
use std::path::{Path, PathBuf};

use isobox_common::config::BootstrapConfig;
use isobox_common::constants::{INIT_SENTINEL, SELF_EXE};
use isobox_common::error::{IsoboxError, Result};
use isobox_common::types::ContainerId;
use isobox_core::namespace::NamespaceConfig;
use isobox_core::namespace::clone::{StdioMode, clone_and_exec};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;

/// Everything needed to create one isolated child.
#[derive(Debug, Clone)]
pub struct LaunchDescriptor {
    /// Correlation ID passed on to the bootstrapper.
    pub id: ContainerId,
    /// Target command, as a path or a name looked up in `PATH`.
    pub command: String,
    /// Arguments following the command.
    pub args: Vec<String>,
    /// Attach the child's standard streams to ours.
    pub interactive: bool,
    /// Namespaces requested at creation.
    pub namespaces: NamespaceConfig,
    /// Options forwarded to the bootstrapper.
    pub bootstrap: BootstrapConfig,
    /// Binary to re-execute.
    pub program: PathBuf,
}

impl LaunchDescriptor {
    /// Creates a descriptor isolating all namespaces with default bootstrap
    /// options and a fresh ID.
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: ContainerId::generate(),
            command: command.into(),
            args,
            interactive: false,
            namespaces: NamespaceConfig::all(),
            bootstrap: BootstrapConfig::default(),
            program: PathBuf::from(SELF_EXE),
        }
    }

    /// Returns the argument vector of the re-invoked child.
    ///
    /// The sentinel always comes first after `argv[0]`, and the target
    /// command follows a `--` separator so that its own arguments are never
    /// parsed as bootstrap options.
    #[must_use]
    pub fn init_argv(&self) -> Vec<String> {
        let mut argv = vec![
            self.program.display().to_string(),
            INIT_SENTINEL.to_owned(),
            "--id".to_owned(),
            self.id.to_string(),
            "--mount-policy".to_owned(),
            self.bootstrap.mount_policy.to_string(),
            "--proc-mount-point".to_owned(),
            self.bootstrap.proc_mount_point.display().to_string(),
        ];
        if let Some(hostname) = &self.bootstrap.hostname {
            argv.push("--hostname".to_owned());
            argv.push(hostname.clone());
        }
        argv.push("--".to_owned());
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// How the child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Normal exit with the given status.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
}

impl ChildExit {
    /// Decodes a terminal wait status; returns `None` for stop/continue
    /// notifications.
    #[must_use]
    pub const fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Self::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(Self::Signaled(signal)),
            _ => None,
        }
    }

    /// Returns whether the child exited with status 0.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "killed by {signal}"),
        }
    }
}

/// Exclusive handle on a created child.
///
/// [`ChildHandle::wait`] consumes the handle, so a child is waited at most
/// once; a handle dropped without waiting reaps its child on drop, so it
/// is waited exactly once.
#[derive(Debug)]
pub struct ChildHandle {
    pid: Pid,
    reaped: bool,
}

impl ChildHandle {
    /// Clones a child into `namespaces` running `program` with `argv`.
    ///
    /// # Errors
    ///
    /// Returns [`IsoboxError::Spawn`] if the OS refuses to create the child.
    pub fn spawn(
        program: &Path,
        argv: &[String],
        namespaces: &NamespaceConfig,
        stdio: StdioMode,
    ) -> Result<Self> {
        let pid = clone_and_exec(program, argv, namespaces, stdio)?;
        Ok(Self { pid, reaped: false })
    }

    /// Returns the child's PID as seen from the parent's namespace.
    #[must_use]
    pub const fn pid(&self) -> Pid {
        self.pid
    }

    /// Blocks until the child terminates.
    ///
    /// # Errors
    ///
    /// Returns [`IsoboxError::Wait`] if `waitpid(2)` fails for a reason
    /// other than an interrupted call.
    pub fn wait(mut self) -> Result<ChildExit> {
        self.reaped = true;
        wait_for(self.pid)
    }
}

impl Drop for ChildHandle {
    fn drop(&mut self) {
        if !self.reaped {
            tracing::warn!(pid = self.pid.as_raw(), "child handle dropped before wait, reaping");
            if let Err(e) = wait_for(self.pid) {
                tracing::error!(error = %e, "failed to reap child");
            }
        }
    }
}

fn wait_for(pid: Pid) -> Result<ChildExit> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => match ChildExit::from_wait_status(status) {
                Some(exit) => return Ok(exit),
                None => tracing::trace!(?status, "ignoring non-terminal wait status"),
            },
            Err(Errno::EINTR) => {}
            Err(e) => {
                return Err(IsoboxError::Wait {
                    pid: pid.as_raw(),
                    source: e.into(),
                });
            }
        }
    }
}

/// Creates the isolated child described by `descriptor` without waiting.
///
/// # Errors
///
/// Returns [`IsoboxError::Spawn`] if process creation fails.
pub fn spawn(descriptor: &LaunchDescriptor) -> Result<ChildHandle> {
    let argv = descriptor.init_argv();
    tracing::debug!(?argv, "re-invoking self");
    ChildHandle::spawn(
        &descriptor.program,
        &argv,
        &descriptor.namespaces,
        StdioMode::from_interactive(descriptor.interactive),
    )
}

/// Spawns the isolated child and blocks until it terminates.
///
/// # Errors
///
/// Returns [`IsoboxError::Spawn`] if the child cannot be created; no wait
/// happens in that case. Returns [`IsoboxError::Wait`] if waiting fails.
pub fn start(descriptor: &LaunchDescriptor) -> Result<ChildExit> {
    let span = tracing::info_span!("launch", id = %descriptor.id);
    let _guard = span.enter();

    tracing::info!(
        command = %descriptor.command,
        interactive = descriptor.interactive,
        namespaces = ?descriptor.namespaces.enabled(),
        "starting container"
    );
    let child = spawn(descriptor)?;
    let pid = child.pid().as_raw();
    tracing::info!(pid, "waiting for container init");
    let exit = child.wait()?;
    tracing::info!(pid, %exit, "container init terminated");
    Ok(exit)
}

#[cfg(test)]
mod tests {
    use isobox_common::config::MountPolicy;

    use super::*;

    fn descriptor() -> LaunchDescriptor {
        let mut d = LaunchDescriptor::new("/bin/sh", vec!["-c".into(), "ps -ef".into()]);
        d.id = ContainerId::new("abc123");
        d
    }

    #[test]
    fn init_argv_starts_with_self_and_sentinel() {
        let argv = descriptor().init_argv();
        assert_eq!(argv[0], "/proc/self/exe");
        assert_eq!(argv[1], "init");
    }

    #[test]
    fn init_argv_puts_command_after_separator() {
        let argv = descriptor().init_argv();
        let sep = argv.iter().position(|a| a == "--").unwrap();
        assert_eq!(&argv[sep + 1..], ["/bin/sh", "-c", "ps -ef"]);
    }

    #[test]
    fn init_argv_forwards_bootstrap_options() {
        let mut d = descriptor();
        d.bootstrap.mount_policy = MountPolicy::BestEffort;
        d.bootstrap.hostname = Some("box".into());
        let argv = d.init_argv();
        let joined = argv.join(" ");
        assert!(joined.contains("--id abc123"), "{joined}");
        assert!(joined.contains("--mount-policy best-effort"), "{joined}");
        assert!(joined.contains("--proc-mount-point /proc"), "{joined}");
        assert!(joined.contains("--hostname box --"), "{joined}");
    }

    #[test]
    fn new_descriptor_isolates_everything() {
        let d = LaunchDescriptor::new("sh", Vec::new());
        assert_eq!(d.namespaces, NamespaceConfig::all());
        assert!(!d.interactive);
        assert_eq!(d.program, PathBuf::from("/proc/self/exe"));
    }

    #[test]
    fn wait_reports_exit_status() {
        let child = ChildHandle::spawn(
            Path::new("/bin/sh"),
            &["sh".into(), "-c".into(), "exit 7".into()],
            &NamespaceConfig::none(),
            StdioMode::Null,
        )
        .unwrap();
        let exit = child.wait().unwrap();
        assert_eq!(exit, ChildExit::Exited(7));
        assert!(!exit.success());
    }

    #[test]
    fn wait_reports_signal() {
        let child = ChildHandle::spawn(
            Path::new("/bin/sh"),
            &["sh".into(), "-c".into(), "kill -KILL $$".into()],
            &NamespaceConfig::none(),
            StdioMode::Null,
        )
        .unwrap();
        assert_eq!(child.wait().unwrap(), ChildExit::Signaled(Signal::SIGKILL));
    }

    #[test]
    fn dropped_handle_reaps_child() {
        let child = ChildHandle::spawn(
            Path::new("/bin/true"),
            &["true".into()],
            &NamespaceConfig::none(),
            StdioMode::Null,
        )
        .unwrap();
        let pid = child.pid();
        drop(child);
        assert_eq!(waitpid(pid, None), Err(Errno::ECHILD));
    }

    #[test]
    fn start_waits_for_program_without_namespaces() {
        let mut d = descriptor();
        d.namespaces = NamespaceConfig::none();
        d.program = PathBuf::from("/bin/false");
        assert_eq!(start(&d).unwrap(), ChildExit::Exited(1));
    }

    #[test]
    fn unprivileged_start_fails_without_waiting() {
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let err = start(&descriptor()).unwrap_err();
        assert!(matches!(err, IsoboxError::Spawn { .. }));
    }

    #[test]
    fn display_describes_exit() {
        assert_eq!(ChildExit::Exited(3).to_string(), "exited with status 3");
        assert_eq!(ChildExit::Signaled(Signal::SIGTERM).to_string(), "killed by SIGTERM");
    }
}
