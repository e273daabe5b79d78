//! `apply`: provision every managed file, or the selected ones.
use anyhow::Result;

use crate::cli::{ApplyOpts, GlobalOpts};
use crate::logging::Logger;
use crate::report::Outcome;

use super::CommandSetup;

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if setup fails or any file could not be provisioned.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let targets = setup.targets(&opts.targets)?;

    log.stage("Provisioning files");
    let reports = setup.process(&targets, |t| t.apply(&setup.ctx, opts.force));
    for report in &reports {
        if report.outcome == Some(Outcome::Unchanged) {
            log.debug(&format!("{}: unchanged", report.entity_id));
            log.record(report);
        } else {
            log.report(report);
        }
    }

    log.print_summary();

    let failures = log.failure_count();
    if failures > 0 {
        anyhow::bail!("{failures} file(s) could not be provisioned");
    }
    Ok(())
}
