//! `isobox init` — Container init, run by `isobox run` inside the new
//! namespaces. Never invoked directly by users.

use std::path::PathBuf;

use clap::Args;
use clap::builder::NonEmptyStringValueParser;
use isobox_common::config::{BootstrapConfig, MountPolicy};
use isobox_common::constants::PROC_MOUNT_POINT;
use isobox_runtime::bootstrap;

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Launch ID, for log correlation.
    #[arg(long)]
    pub id: Option<String>,

    /// Whether a failed isolation mount aborts the container.
    #[arg(long, default_value_t)]
    pub mount_policy: MountPolicy,

    /// Where to mount the container's procfs.
    #[arg(long, default_value = PROC_MOUNT_POINT)]
    pub proc_mount_point: PathBuf,

    /// Hostname inside the container's UTS namespace.
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub hostname: Option<String>,

    /// Command to exec, followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the `init` command.
///
/// Does not return: either the process image is replaced by the target
/// command, or the process exits with the status of the failed stage.
///
/// # Errors
///
/// Returns an error only if no command was given.
pub fn execute(args: InitArgs) -> anyhow::Result<()> {
    let Some((command, rest)) = args.command.split_first() else {
        anyhow::bail!("no command given");
    };

    let span = tracing::info_span!("init", id = args.id.as_deref().unwrap_or("-"));
    let _guard = span.enter();
    tracing::info!(command, "container init started");

    let config = BootstrapConfig {
        proc_mount_point: args.proc_mount_point,
        mount_policy: args.mount_policy,
        hostname: args.hostname,
    };
    let Err(e) = bootstrap::run(command, rest, &config);
    tracing::error!(error = %e, "container init failed");
    std::process::exit(e.exit_code());
}
