//! Structured logger with per-file report rendering and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use crate::report::{Outcome, Report};

use super::subscriber::{ENTITY_TARGET, STAGE_TARGET};
use super::utils::log_file_path;

/// Structured logger with summary collection.
///
/// All messages are also written to a persistent log file at
/// `$XDG_CACHE_HOME/holo-files/<command>.log` (default
/// `~/.cache/holo-files/<command>.log`) with timestamps and ANSI codes
/// stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    outcomes: Mutex<Vec<(String, Outcome)>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Print a report block and record its outcome for the summary.
    pub fn report(&self, report: &Report) {
        let mut header = format!("{} {}", report.action, report.entity_id);
        if let Some(state) = &report.state {
            header.push_str(&format!(" ({state})"));
        }
        tracing::info!(target: ENTITY_TARGET, "{header}");
        for line in report.visible_lines() {
            self.info(&format!("{:>8} {}", line.attribute, line.value));
        }
        for warning in &report.warnings {
            self.warn(warning);
        }
        for error in &report.errors {
            self.error(error);
        }
        self.record(report);
    }

    /// Record the outcome of a report without printing it.
    pub fn record(&self, report: &Report) {
        let Some(outcome) = report.outcome else {
            return;
        };
        if let Ok(mut guard) = self.outcomes.lock() {
            guard.push((report.entity_id.clone(), outcome));
        }
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|(_, outcome)| *outcome == Outcome::Failed)
                .count()
        })
    }

    /// Print totals per outcome and the log file location.
    pub fn print_summary(&self) {
        let outcomes = match self.outcomes.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if outcomes.is_empty() {
            return;
        }

        let count = |wanted: Outcome| outcomes.iter().filter(|(_, o)| *o == wanted).count();
        self.stage("Summary");
        self.info(&format!(
            "{} files: {} applied, {} unchanged, {} restored, {} deleted, {} failed",
            outcomes.len(),
            count(Outcome::Applied),
            count(Outcome::Unchanged),
            count(Outcome::Restored),
            count(Outcome::Deleted),
            count(Outcome::Failed),
        ));
        for (entity, _) in outcomes.iter().filter(|(_, o)| *o == Outcome::Failed) {
            self.info(&format!("\x1b[31m✗ {entity}\x1b[0m"));
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}
