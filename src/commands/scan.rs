//! `scan`: list managed files and what `apply` would do with them.
use anyhow::Result;

use crate::cli::{GlobalOpts, ScanOpts};
use crate::logging::Logger;
use crate::report::Report;

use super::CommandSetup;

/// Run the scan command.
///
/// # Errors
///
/// Returns an error if setup or scanning fails.
pub fn run(global: &GlobalOpts, opts: &ScanOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let targets = setup.targets(&[])?;

    if opts.short {
        for target in &targets {
            println!("{}", target.entity_id());
        }
        return Ok(());
    }

    let reports: Vec<Report> = targets.iter().map(|t| t.report(&setup.ctx)).collect();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        log.report(report);
    }
    Ok(())
}
