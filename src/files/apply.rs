//! The provisioning algorithm for one managed file.
//!
//! 1. eligibility
//! 2. base capture
//! 3. package-manager upgrade collisions
//! 4. drift detection (skipped with force)
//! 5. layering
//! 6. no-op short-circuit
//! 7. snapshot persistence
//! 8. write-back
//! 9. cleanup of a consumed config backup
//!
//! Any failure aborts the remaining steps. The live target is only written
//! after the final buffer has been computed.
use std::path::PathBuf;

use crate::context::Context;
use crate::error::FilesError;
use crate::report::{Outcome, Report};

use super::buffer::FileBuffer;
use super::fileio::{FileKind, apply_file_metadata, copy_file, remove_if_present};
use super::paths::TargetFile;

/// Index of the `store at` / `update` line in an apply report.
const BASE_LINE: usize = 0;

impl TargetFile {
    /// Report describing what `apply` would do, as shown by `scan`.
    #[must_use]
    pub fn report(&self, ctx: &Context) -> Report {
        let cfg = &ctx.config;
        if self.is_orphaned() {
            return self.orphan_report(ctx);
        }
        let mut report = Report::new(self.entity_id(), self.target_path(cfg), "Working on");
        report.add_line("store at", self.base_path(cfg).display().to_string());
        for repo_file in self.repo_files() {
            report.add_line(
                repo_file.strategy().to_string(),
                repo_file.path().display().to_string(),
            );
        }
        report
    }

    /// Provision this file, or scrub it if it is orphaned.
    ///
    /// Errors never escape: they are recorded on the returned report.
    #[must_use]
    pub fn apply(&self, ctx: &Context, force: bool) -> Report {
        if self.is_orphaned() {
            return self.handle_orphan(ctx);
        }
        let mut report = self.report(ctx);
        match self.provision(ctx, force, &mut report) {
            Ok(outcome) => report.outcome = Some(outcome),
            Err(e) => {
                tracing::debug!("{}: {e}", self.entity_id());
                report.fail(e.to_string());
            }
        }
        report
    }

    fn provision(
        &self,
        ctx: &Context,
        force: bool,
        report: &mut Report,
    ) -> Result<Outcome, FilesError> {
        let cfg = &ctx.config;
        let pm = ctx.package_manager.as_ref();
        let target_path = self.target_path(cfg);
        let base_path = self.base_path(cfg);
        let provisioned_path = self.provisioned_path(cfg);

        // Step 1
        let target_kind = FileKind::of(&target_path)?;
        let base_kind = FileKind::of(&base_path)?;
        if !target_kind.is_manageable() {
            if target_kind.exists() || !base_kind.is_manageable() {
                return Err(FilesError::NotManageable { path: target_path });
            }
            if !force {
                return Err(FilesError::DeletedByUser);
            }
        }

        // Step 2
        match base_kind {
            FileKind::Missing => copy_file(&target_path, &base_path)?,
            FileKind::Other => return Err(FilesError::NotManageable { path: base_path }),
            FileKind::Regular | FileKind::Symlink => report.replace_line(BASE_LINE, "", ""),
        }

        // Step 3
        let mut collided = false;
        let mut compare_path = target_path.clone();
        let mut config_backup: Option<PathBuf> = None;
        if target_kind.is_manageable()
            && let Some(backup) = pm.find_config_backup(&target_path)
        {
            report.replace_line(
                BASE_LINE,
                "update",
                format!("{} -> {}", target_path.display(), base_path.display()),
            );
            copy_file(&target_path, &base_path)?;
            compare_path.clone_from(&backup);
            config_backup = Some(backup);
            collided = true;
        }
        if let Some(update) = pm.find_updated_target_base(&target_path) {
            report.replace_line(
                BASE_LINE,
                "update",
                format!("{} -> {}", update.display(), base_path.display()),
            );
            copy_file(&update, &base_path)?;
            if let Err(e) = remove_if_present(&update) {
                tracing::debug!("ignoring: {e}");
            }
            collided = true;
        }

        // Step 4
        let last_provisioned = if FileKind::of(&provisioned_path)?.is_manageable() {
            Some(FileBuffer::load(&provisioned_path, &target_path)?)
        } else {
            None
        };
        if !force && let Some(last) = &last_provisioned {
            let current = FileBuffer::load(&compare_path, &target_path)?;
            if current != *last {
                return Err(FilesError::ModifiedByUser);
            }
        }

        // Step 5
        let mut buffer = FileBuffer::load(&base_path, &target_path)?;
        for repo_file in self.repo_files() {
            buffer = repo_file.apply(buffer, ctx.executor.as_ref(), report)?;
        }

        // Step 6
        if !force && !collided && last_provisioned.as_ref() == Some(&buffer) {
            return Ok(Outcome::Unchanged);
        }

        // Step 7
        buffer.write(&provisioned_path)?;
        apply_file_metadata(&base_path, &provisioned_path)?;

        // Step 8
        buffer.write(&target_path)?;
        apply_file_metadata(&base_path, &target_path)?;

        // Step 9
        if let Some(backup) = config_backup {
            remove_if_present(&backup)?;
        }

        Ok(Outcome::Applied)
    }
}
