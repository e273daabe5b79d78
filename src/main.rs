//! Command-line entry point for `holo-files`.

use anyhow::Result;
use clap::Parser;

use holo_files::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let command_name = match &args.command {
        cli::Command::Scan(_) => "scan",
        cli::Command::Apply(_) => "apply",
        cli::Command::Diff(_) => "diff",
        cli::Command::Version => {
            let version = option_env!("HOLO_FILES_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("holo-files {version}");
            return Ok(());
        }
    };
    logging::init_subscriber(args.verbose, command_name);
    let log = logging::Logger::new(command_name);

    match args.command {
        cli::Command::Scan(opts) => commands::scan::run(&args.global, &opts, &log),
        cli::Command::Apply(opts) => commands::apply::run(&args.global, &opts, &log),
        cli::Command::Diff(opts) => commands::diff::run(&args.global, &opts, &log),
        cli::Command::Version => Ok(()),
    }
}
