//! # isobox
//!
//! Runs a command as PID 1 of fresh UTS, PID, mount, network, and IPC
//! namespaces with its own `/proc`.

mod commands;
mod logging;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format);
    commands::execute(cli)
}
