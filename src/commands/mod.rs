//! Top-level subcommand orchestration.
pub mod apply;
pub mod diff;
pub mod scan;

use anyhow::{Context as _, Result, bail};
use rayon::prelude::*;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::context::Context;
use crate::files::{TargetFile, scan_repo};
use crate::logging::Logger;
use crate::platform::Platform;

/// Shared state produced by the common command setup sequence.
///
/// Resolves the directory layout, detects the platform, and wires both into
/// a [`Context`] so that each command does not have to repeat the
/// boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected distribution.
    pub platform: Platform,
    /// Context handed to every managed file.
    pub ctx: Context,
    /// Whether files are processed on the rayon pool.
    pub parallel: bool,
}

impl CommandSetup {
    /// Resolve directories and detect the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured directory is invalid or the
    /// distribution cannot be detected.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let config = Config::resolve(
            global.root.as_deref(),
            global.resource_dir.as_deref(),
            global.state_dir.as_deref(),
        );
        config.validate()?;
        log.debug(&format!("root: {}", config.root_dir.display()));
        log.debug(&format!("repository: {}", config.resource_dir.display()));
        log.debug(&format!("state: {}", config.state_dir.display()));

        let platform = Platform::detect().context("detecting distribution")?;
        if !platform.is_recognized() {
            let ids: Vec<&str> = platform.ids.iter().map(String::as_str).collect();
            log.warn(&format!(
                "unrecognized distribution (ID={}), package manager integration disabled",
                ids.join(" ")
            ));
        }
        log.debug(&format!("package manager family: {}", platform.distribution));

        let ctx = Context::with_system_executor(config, platform.package_manager());
        Ok(Self {
            platform,
            ctx,
            parallel: global.parallel,
        })
    }

    /// Scan for managed files, restricted to `selectors` when any are given.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning fails or a selector matches no managed
    /// file.
    pub fn targets(&self, selectors: &[String]) -> Result<Vec<TargetFile>> {
        let all = scan_repo(&self.ctx.config).context("scanning repository")?;
        select(all, selectors)
    }

    /// Run `work` on every target, in parallel unless disabled. Results keep
    /// the order of `targets`.
    pub fn process<T: Send>(
        &self,
        targets: &[TargetFile],
        work: impl Fn(&TargetFile) -> T + Sync + Send,
    ) -> Vec<T> {
        if self.parallel {
            targets.par_iter().map(work).collect()
        } else {
            targets.iter().map(work).collect()
        }
    }
}

/// Keep the targets named by `selectors`; all of them when there are none.
fn select(all: Vec<TargetFile>, selectors: &[String]) -> Result<Vec<TargetFile>> {
    if selectors.is_empty() {
        return Ok(all);
    }
    for selector in selectors {
        if !all.iter().any(|t| t.matches_selector(selector)) {
            bail!("unrecognized target: {selector}");
        }
    }
    Ok(all
        .into_iter()
        .filter(|t| selectors.iter().any(|s| t.matches_selector(s)))
        .collect())
}
