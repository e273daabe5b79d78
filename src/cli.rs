//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the configuration file provisioner.
#[derive(Parser, Debug)]
#[command(
    name = "holo-files",
    about = "Provision configuration files on top of package-managed defaults",
    version
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Directory that target paths are relative to
    #[arg(long, global = true, env = "HOLO_ROOT_DIR")]
    pub root: Option<PathBuf>,

    /// Repository directory [default: <root>/usr/share/holo/files]
    #[arg(long, global = true, env = "HOLO_RESOURCE_DIR")]
    pub resource_dir: Option<PathBuf>,

    /// State directory [default: <root>/var/lib/holo/files]
    #[arg(long, global = true, env = "HOLO_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Process files one at a time (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List managed files and what apply would do
    Scan(ScanOpts),
    /// Provision managed files
    Apply(ApplyOpts),
    /// Show changes made to managed files since the last apply
    Diff(DiffOpts),
    /// Print version information
    Version,
}

/// Options for the `scan` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ScanOpts {
    /// Print entity IDs only
    #[arg(long, conflicts_with = "json")]
    pub short: bool,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ApplyOpts {
    /// Overwrite files modified by the user and restore deleted ones
    #[arg(short, long)]
    pub force: bool,

    /// Restrict to these files (`file:/etc/foo`, `/etc/foo` or `etc/foo`)
    pub targets: Vec<String>,
}

/// Options for the `diff` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DiffOpts {
    /// Restrict to these files (`file:/etc/foo`, `/etc/foo` or `etc/foo`)
    pub targets: Vec<String>,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply_with_force_and_targets() {
        let cli = Cli::parse_from(["holo-files", "apply", "--force", "/etc/foo.conf", "file:/etc/bar"]);
        let Command::Apply(opts) = cli.command else {
            panic!("expected apply");
        };
        assert!(opts.force);
        assert_eq!(opts.targets, vec!["/etc/foo.conf", "file:/etc/bar"]);
    }

    #[test]
    fn parse_scan_short() {
        let cli = Cli::parse_from(["holo-files", "scan", "--short"]);
        assert!(matches!(cli.command, Command::Scan(ScanOpts { short: true, .. })));
    }

    #[test]
    fn scan_short_conflicts_with_json() {
        assert!(Cli::try_parse_from(["holo-files", "scan", "--short", "--json"]).is_err());
    }

    #[test]
    fn parse_diff_without_targets() {
        let cli = Cli::parse_from(["holo-files", "diff"]);
        let Command::Diff(opts) = cli.command else {
            panic!("expected diff");
        };
        assert!(opts.targets.is_empty());
    }

    #[test]
    fn parse_global_directories() {
        let cli = Cli::parse_from([
            "holo-files",
            "--root",
            "/chroot",
            "--state-dir",
            "/state",
            "scan",
        ]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/chroot")));
        assert_eq!(cli.global.state_dir, Some(PathBuf::from("/state")));
    }

    #[test]
    fn parallel_by_default() {
        let cli = Cli::parse_from(["holo-files", "apply"]);
        assert!(cli.global.parallel);
        let cli = Cli::parse_from(["holo-files", "--no-parallel", "apply"]);
        assert!(!cli.global.parallel);
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["holo-files", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["holo-files", "-v", "scan"]);
        assert!(cli.verbose);
    }
}
