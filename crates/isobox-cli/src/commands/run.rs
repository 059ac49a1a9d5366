//! `isobox run` — Start a command inside new namespaces and wait for it.

use clap::Args;
use clap::builder::NonEmptyStringValueParser;
use isobox_common::config::MountPolicy;
use isobox_common::constants::LAUNCHER_EXIT_STATUS;
use isobox_runtime::launcher::{self, LaunchDescriptor};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Attach the container's stdin, stdout and stderr to this terminal.
    #[arg(short, long)]
    pub interactive: bool,

    /// Same as --interactive; allows the familiar `-it`.
    #[arg(short, long)]
    pub tty: bool,

    /// Hostname inside the container's UTS namespace.
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub hostname: Option<String>,

    /// Whether a failed isolation mount aborts the container.
    #[arg(long, default_value_t, env = "ISOBOX_MOUNT_POLICY")]
    pub mount_policy: MountPolicy,

    /// Command to run, followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the `run` command.
///
/// Blocks until the container's init process terminates, then exits the
/// whole process with status 255 whatever the container's own status was.
///
/// # Errors
///
/// Returns an error if the isolated process cannot be created.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let Some((command, rest)) = args.command.split_first() else {
        anyhow::bail!("no command given");
    };

    let mut descriptor = LaunchDescriptor::new(command.clone(), rest.to_vec());
    descriptor.interactive = args.interactive || args.tty;
    descriptor.bootstrap.mount_policy = args.mount_policy;
    descriptor.bootstrap.hostname = args.hostname;

    let exit = launcher::start(&descriptor).map_err(|e| anyhow::anyhow!("{e}"))?;
    if !exit.success() {
        tracing::warn!(id = %descriptor.id, %exit, "container did not succeed");
    }

    // Container status is not propagated.
    std::process::exit(LAUNCHER_EXIT_STATUS);
}
