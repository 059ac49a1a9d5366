//! Child side of the isolation bootstrap.
//!
//! Runs as PID 1 of the namespaces the launcher created. It makes mount
//! propagation private, mounts a procfs scoped to the new PID namespace,
//! optionally names the UTS namespace, and finally replaces itself with the
//! target command. The steps run in exactly this order: any mount made
//! before propagation is private would leak to the host, and the target
//! must find the scoped procfs already in place.

use std::convert::Infallible;
use std::ffi::OsString;
use std::path::Path;

use isobox_common::config::{BootstrapConfig, MountPolicy};
use isobox_common::constants::MOUNT_ROOT;
use isobox_common::error::{IsoboxError, Result};
use isobox_common::types::BootstrapStage;
use isobox_core::exec::{build_argv, build_envp, replace_image, resolve_command};
use isobox_core::filesystem::mount::{make_mount_tree_private, mount_proc};
use isobox_core::namespace::uts::set_hostname;

/// The command the bootstrapper turns into, with its inherited environment.
#[derive(Debug, Clone)]
pub struct BootstrapContext {
    /// Target command, as a path or a name looked up in `PATH`.
    pub command: String,
    /// Arguments following the command.
    pub args: Vec<String>,
    /// Environment passed to the target verbatim.
    pub environment: Vec<(OsString, OsString)>,
}

impl BootstrapContext {
    /// Captures the current process environment for `command`.
    #[must_use]
    pub fn from_process(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            environment: std::env::vars_os().collect(),
        }
    }
}

/// Drives one bootstrap through its stages.
#[derive(Debug)]
pub struct Bootstrapper<'a> {
    config: &'a BootstrapConfig,
    stage: BootstrapStage,
}

impl<'a> Bootstrapper<'a> {
    /// Creates a bootstrapper in the [`BootstrapStage::Created`] stage.
    #[must_use]
    pub const fn new(config: &'a BootstrapConfig) -> Self {
        Self {
            config,
            stage: BootstrapStage::Created,
        }
    }

    /// Returns the last stage completed. [`BootstrapStage::Exec`] is set
    /// just before the image is replaced.
    #[must_use]
    pub const fn stage(&self) -> BootstrapStage {
        self.stage
    }

    /// Prepares the namespace and replaces the process with the target.
    ///
    /// # Errors
    ///
    /// Returns [`IsoboxError::NotInNamespace`] when not running as PID 1,
    /// [`IsoboxError::Mount`] when a mount fails under
    /// [`MountPolicy::Strict`], [`IsoboxError::Hostname`] when naming the
    /// UTS namespace fails, and [`IsoboxError::Exec`] when the target cannot
    /// be executed.
    pub fn run(&mut self, context: BootstrapContext) -> Result<Infallible> {
        ensure_namespace_init()?;
        let config = self.config;

        self.advance(
            BootstrapStage::PrivateMount,
            make_mount_tree_private(Path::new(MOUNT_ROOT)),
        )?;
        self.advance(BootstrapStage::ProcMounted, mount_proc(&config.proc_mount_point))?;

        if let Some(hostname) = &config.hostname {
            set_hostname(hostname)?;
        }

        let program = resolve_command(&context.command)?;
        let argv = build_argv(&context.command, &context.args)?;
        let envp = build_envp(context.environment)?;
        self.enter(BootstrapStage::Exec);
        replace_image(&program, &argv, &envp)
    }

    fn enter(&mut self, stage: BootstrapStage) {
        debug_assert_eq!(self.stage.next(), Some(stage));
        tracing::debug!(from = %self.stage, to = %stage, "bootstrap stage");
        self.stage = stage;
    }

    /// Moves to `stage` once the mount step for it has returned `result`.
    /// A failure stops the bootstrap in the current stage unless the mount
    /// policy tolerates it.
    fn advance(&mut self, stage: BootstrapStage, result: Result<()>) -> Result<()> {
        match (result, self.config.mount_policy) {
            (Ok(()), _) => {}
            (Err(e), MountPolicy::BestEffort) => {
                tracing::warn!(%stage, error = %e, "isolation degraded, continuing");
            }
            (Err(e), MountPolicy::Strict) => return Err(e),
        }
        self.enter(stage);
        Ok(())
    }
}

/// Verifies the caller is PID 1, i.e. the first process of a new PID
/// namespace, before anything touches the mount table.
///
/// # Errors
///
/// Returns [`IsoboxError::NotInNamespace`] with the observed PID otherwise.
pub fn ensure_namespace_init() -> Result<()> {
    let pid = nix::unistd::getpid().as_raw();
    if pid == 1 {
        Ok(())
    } else {
        Err(IsoboxError::NotInNamespace { pid })
    }
}

/// Bootstraps the target `command` with `args` in the current process.
///
/// Only returns on failure; the caller must then terminate the process.
///
/// # Errors
///
/// See [`Bootstrapper::run`].
pub fn run(command: &str, args: &[String], config: &BootstrapConfig) -> Result<Infallible> {
    tracing::info!(command, ?args, "bootstrapping container init");
    let context = BootstrapContext::from_process(command, args.to_vec());
    Bootstrapper::new(config).run(context)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn mount_error() -> IsoboxError {
        IsoboxError::Mount {
            target: "/proc".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
    }

    #[test]
    fn context_captures_environment() {
        let context = BootstrapContext::from_process("/bin/sh", Vec::new());
        assert!(context.environment.iter().any(|(k, _)| k == "PATH"));
    }

    #[test]
    fn refuses_outside_new_pid_namespace() {
        let config = BootstrapConfig::default();
        let mut bootstrapper = Bootstrapper::new(&config);
        let context = BootstrapContext::from_process("/bin/true", Vec::new());
        let err = bootstrapper.run(context).unwrap_err();
        assert!(matches!(err, IsoboxError::NotInNamespace { .. }));
        assert_eq!(bootstrapper.stage(), BootstrapStage::Created);
    }

    #[test]
    fn run_reports_observed_pid() {
        let err = run("/bin/true", &[], &BootstrapConfig::default()).unwrap_err();
        let IsoboxError::NotInNamespace { pid } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(pid, i32::try_from(std::process::id()).unwrap());
    }

    #[test]
    fn strict_policy_stops_in_last_completed_stage() {
        let config = BootstrapConfig::default();
        let mut bootstrapper = Bootstrapper::new(&config);
        bootstrapper.advance(BootstrapStage::PrivateMount, Ok(())).unwrap();
        assert_eq!(bootstrapper.stage(), BootstrapStage::PrivateMount);

        let err = bootstrapper
            .advance(BootstrapStage::ProcMounted, Err(mount_error()))
            .unwrap_err();
        assert!(matches!(err, IsoboxError::Mount { .. }));
        assert_eq!(bootstrapper.stage(), BootstrapStage::PrivateMount);
    }

    #[test]
    fn best_effort_policy_swallows_mount_errors() {
        let config = BootstrapConfig {
            mount_policy: MountPolicy::BestEffort,
            ..BootstrapConfig::default()
        };
        let mut bootstrapper = Bootstrapper::new(&config);
        bootstrapper
            .advance(BootstrapStage::PrivateMount, Err(mount_error()))
            .unwrap();
        assert_eq!(bootstrapper.stage(), BootstrapStage::PrivateMount);
    }

    #[test]
    fn stages_are_entered_in_order() {
        let config = BootstrapConfig::default();
        let mut bootstrapper = Bootstrapper::new(&config);
        bootstrapper.enter(BootstrapStage::PrivateMount);
        bootstrapper.enter(BootstrapStage::ProcMounted);
        bootstrapper.enter(BootstrapStage::Exec);
        assert_eq!(bootstrapper.stage(), BootstrapStage::Exec);
    }
}
