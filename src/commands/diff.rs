//! `diff`: show what changed in managed files since the last apply.
use std::io::Write as _;

use anyhow::Result;

use crate::cli::{DiffOpts, GlobalOpts};
use crate::logging::Logger;

use super::CommandSetup;

/// Run the diff command.
///
/// Diffs go to stdout in target order; files that cannot be diffed are
/// logged and make the command fail once all output has been written.
///
/// # Errors
///
/// Returns an error if setup fails, stdout cannot be written, or any file
/// could not be diffed.
pub fn run(global: &GlobalOpts, opts: &DiffOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let targets = setup.targets(&opts.targets)?;

    let results = setup.process(&targets, |t| t.render_diff(&setup.ctx));
    let mut stdout = std::io::stdout().lock();
    let mut failures = 0_usize;
    for (target, result) in targets.iter().zip(results) {
        match result {
            Ok(diff) => stdout.write_all(&diff)?,
            Err(e) => {
                log.error(&format!("{}: {e}", target.entity_id()));
                failures += 1;
            }
        }
    }
    stdout.flush()?;

    if failures > 0 {
        anyhow::bail!("{failures} file(s) could not be diffed");
    }
    Ok(())
}
