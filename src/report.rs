//! Per-target reports.
//!
//! Every managed file produces exactly one [`Report`] per command. Reports
//! are built independently for each target, so targets can be processed in
//! parallel and printed afterwards in scan order.
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Terminal state of one target after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The target was (re)written.
    Applied,
    /// Nothing needed to be done.
    Unchanged,
    /// An orphaned target was reset to its base.
    Restored,
    /// An orphaned target's bookkeeping was removed.
    Deleted,
    /// Processing stopped with an error.
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::Restored => "restored",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One `attribute: value` line of a report.
///
/// A line with an empty attribute is a placeholder and is not rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// Right-aligned label such as `store at` or `apply`.
    pub attribute: String,
    /// Usually a path.
    pub value: String,
}

impl ReportLine {
    /// Create a report line.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Whether this line is rendered.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.attribute.is_empty()
    }
}

/// Human-readable description of what happened to one target.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Entity ID, e.g. `file:/etc/foo.conf`.
    pub entity_id: String,
    /// Absolute target path.
    pub target: PathBuf,
    /// `Working on` or `Scrubbing`.
    pub action: String,
    /// Free-form state annotation (orphan assessment).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(serialize_with = "serialize_visible_lines")]
    /// Attribute lines; invisible placeholders are skipped when rendering.
    pub lines: Vec<ReportLine>,
    /// Non-fatal messages, e.g. script stderr.
    pub warnings: Vec<String>,
    /// Errors that stopped processing.
    pub errors: Vec<String>,
    /// `None` for reports that only describe planned work.
    pub outcome: Option<Outcome>,
}

#[allow(clippy::ptr_arg)]
fn serialize_visible_lines<S: serde::Serializer>(
    lines: &Vec<ReportLine>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(lines.iter().filter(|l| l.is_visible()))
}

impl Report {
    /// Create an empty report for a target.
    pub fn new(
        entity_id: impl Into<String>,
        target: impl Into<PathBuf>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            target: target.into(),
            action: action.into(),
            state: None,
            lines: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            outcome: None,
        }
    }

    /// Append an `attribute: value` line.
    pub fn add_line(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.lines.push(ReportLine::new(attribute, value));
    }

    /// Overwrite the line at `index`; out-of-range indices append instead.
    pub fn replace_line(
        &mut self,
        index: usize,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) {
        let line = ReportLine::new(attribute, value);
        match self.lines.get_mut(index) {
            Some(slot) => *slot = line,
            None => self.lines.push(line),
        }
    }

    /// Record a non-fatal warning.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Record a fatal error and mark the report as failed.
    pub fn fail(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.outcome = Some(Outcome::Failed);
    }

    /// Lines that are rendered.
    pub fn visible_lines(&self) -> impl Iterator<Item = &ReportLine> {
        self.lines.iter().filter(|l| l.is_visible())
    }

    /// Whether processing of this target failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.outcome == Some(Outcome::Failed)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.entity_id)?;
        if let Some(state) = &self.state {
            write!(f, " ({state})")?;
        }
        writeln!(f)?;
        let width = self
            .visible_lines()
            .map(|l| l.attribute.len())
            .max()
            .unwrap_or(0);
        for line in self.visible_lines() {
            writeln!(f, "{:>width$}: {}", line.attribute, line.value)?;
        }
        Ok(())
    }
}
