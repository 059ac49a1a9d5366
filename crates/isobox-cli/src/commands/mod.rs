//! CLI command definitions and dispatch.

pub mod init;
pub mod run;

use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

/// isobox: run a command in fresh Linux namespaces.
#[derive(Parser, Debug)]
#[command(name = "isobox", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t, env = "ISOBOX_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command inside new UTS, PID, mount, network, and IPC namespaces.
    Run(run::RunArgs),
    /// Internal: container init, started by `run` inside the new namespaces.
    #[command(hide = true)]
    Init(init::InitArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::execute(args),
        Command::Init(args) => init::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use isobox_common::config::MountPolicy;
    use isobox_common::constants::INIT_SENTINEL;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_takes_command_and_hyphenated_args() {
        let cli = Cli::try_parse_from(["isobox", "run", "-it", "/bin/sh", "-c", "ps -ef"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.interactive && args.tty);
        assert_eq!(args.command, ["/bin/sh", "-c", "ps -ef"]);
        assert_eq!(args.mount_policy, MountPolicy::Strict);
    }

    #[test]
    fn run_requires_a_command() {
        assert!(Cli::try_parse_from(["isobox", "run", "-i"]).is_err());
    }

    #[test]
    fn sentinel_routes_to_init() {
        let cli = Cli::try_parse_from([
            "/proc/self/exe",
            INIT_SENTINEL,
            "--id",
            "abc",
            "--mount-policy",
            "best-effort",
            "--",
            "/bin/sh",
            "--login",
        ])
        .unwrap();
        let Command::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(args.id.as_deref(), Some("abc"));
        assert_eq!(args.mount_policy, MountPolicy::BestEffort);
        assert_eq!(args.command, ["/bin/sh", "--login"]);
    }

    #[test]
    fn empty_hostname_is_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["isobox", "run", "--hostname", "", "/bin/true"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        assert!(Cli::try_parse_from(["isobox", "init", "--hostname", "", "--", "true"]).is_err());

        let cli = Cli::try_parse_from(["isobox", "run", "--hostname", "box", "/bin/true"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.hostname.as_deref(), Some("box"));
    }

    #[test]
    fn init_is_hidden_from_help() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("run"));
        assert!(!help.contains("init"));
    }

    #[test]
    fn json_log_format_is_accepted() {
        let cli = Cli::try_parse_from(["isobox", "--log-format", "json", "run", "true"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
