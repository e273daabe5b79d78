//! Cleanup of managed files whose repository layers are gone.
use std::path::Path;

use crate::context::Context;
use crate::error::FilesError;
use crate::report::{Outcome, Report};

use super::fileio::{FileKind, copy_file, remove_if_present};
use super::paths::TargetFile;

/// What happens to an orphaned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanStrategy {
    /// The target still exists: put the base back.
    Restore,
    /// The target is gone: forget about it.
    Delete,
    /// The target exists but is a directory or device; leave it alone.
    Refuse,
}

impl OrphanStrategy {
    fn assess(target: &Path) -> Result<Self, FilesError> {
        Ok(match FileKind::of(target)? {
            FileKind::Regular | FileKind::Symlink => Self::Restore,
            FileKind::Missing => Self::Delete,
            FileKind::Other => Self::Refuse,
        })
    }

    const fn attribute(self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Delete | Self::Refuse => "delete",
        }
    }

    const fn assessment(self) -> &'static str {
        match self {
            Self::Restore => "all repository files were deleted",
            Self::Delete => "target was deleted",
            Self::Refuse => "target is not a manageable file",
        }
    }
}

impl TargetFile {
    /// Report for an orphan, carrying the assessment in `state`.
    pub(super) fn orphan_report(&self, ctx: &Context) -> Report {
        let cfg = &ctx.config;
        let target_path = self.target_path(cfg);
        let mut report = Report::new(self.entity_id(), &target_path, "Scrubbing");
        match OrphanStrategy::assess(&target_path) {
            Ok(strategy) => {
                report.state = Some(strategy.assessment().to_string());
                report.add_line(
                    strategy.attribute(),
                    self.base_path(cfg).display().to_string(),
                );
            }
            Err(e) => report.fail(e.to_string()),
        }
        report
    }

    /// Restore or delete an orphaned file. Errors are recorded on the report.
    #[must_use]
    pub fn handle_orphan(&self, ctx: &Context) -> Report {
        let mut report = self.orphan_report(ctx);
        if report.failed() {
            return report;
        }
        match self.scrub(ctx, &mut report) {
            Ok(outcome) => report.outcome = Some(outcome),
            Err(e) => report.fail(e.to_string()),
        }
        report
    }

    fn scrub(&self, ctx: &Context, report: &mut Report) -> Result<Outcome, FilesError> {
        let cfg = &ctx.config;
        let target_path = self.target_path(cfg);
        let base_path = self.base_path(cfg);
        let provisioned_path = self.provisioned_path(cfg);

        match OrphanStrategy::assess(&target_path)? {
            OrphanStrategy::Restore => {
                copy_file(&base_path, &target_path)?;
                remove_if_present(&provisioned_path)?;
                std::fs::remove_file(&base_path).map_err(FilesError::io("remove", &base_path))?;
                Ok(Outcome::Restored)
            }
            OrphanStrategy::Delete => {
                remove_if_present(&provisioned_path)?;
                std::fs::remove_file(&base_path).map_err(FilesError::io("remove", &base_path))?;
                for leftover in ctx.package_manager.additional_cleanup_targets(&target_path) {
                    report.add_line("delete", leftover.display().to_string());
                    std::fs::remove_file(&leftover)
                        .map_err(FilesError::io("remove", &leftover))?;
                }
                Ok(Outcome::Deleted)
            }
            OrphanStrategy::Refuse => Err(FilesError::NotManageable { path: target_path }),
        }
    }
}
