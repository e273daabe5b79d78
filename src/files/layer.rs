//! Repository layers and the two application strategies.
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::FilesError;
use crate::exec::Executor;
use crate::report::Report;

use super::buffer::FileBuffer;

/// File name suffix that selects the script strategy.
pub const SCRIPT_SUFFIX: &str = ".holoscript";

/// How a layer is applied to the incoming buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Replace the buffer with the layer file.
    Copy,
    /// Pipe the buffer through the layer file.
    Script,
}

impl Strategy {
    /// Strategy selected by the name of `path`.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        if path.as_os_str().as_encoded_bytes().ends_with(SCRIPT_SUFFIX.as_bytes()) {
            Self::Script
        } else {
            Self::Copy
        }
    }
}

/// Report attribute used for each strategy.
impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("apply"),
            Self::Script => f.write_str("passthru"),
        }
    }
}

/// One contribution to a managed file from a repository subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    layer: String,
    path: PathBuf,
}

impl RepoFile {
    /// Create a layer from the subdirectory name it lives in and its path.
    pub fn new(layer: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            layer: layer.into(),
            path: path.into(),
        }
    }

    /// Absolute path of the layer file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the repository subdirectory.
    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// How this layer is applied, derived from its file name.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        Strategy::for_path(&self.path)
    }

    /// Apply this layer to `buffer`.
    ///
    /// Script stderr is recorded on `report` as warnings, also when the
    /// script succeeds.
    ///
    /// # Errors
    ///
    /// Copy fails if the layer file is not manageable. Script fails if the
    /// buffer cannot be resolved to content, the script cannot be spawned, or
    /// it exits unsuccessfully.
    pub fn apply(
        &self,
        buffer: FileBuffer,
        executor: &dyn Executor,
        report: &mut Report,
    ) -> Result<FileBuffer, FilesError> {
        match self.strategy() {
            Strategy::Copy => FileBuffer::load(&self.path, buffer.base_path),
            Strategy::Script => self.run_script(buffer, executor, report),
        }
    }

    fn run_script(
        &self,
        buffer: FileBuffer,
        executor: &dyn Executor,
        report: &mut Report,
    ) -> Result<FileBuffer, FilesError> {
        let buffer = buffer.resolve_symlink()?;
        let input = buffer.bytes().unwrap_or_default();
        let result = executor
            .run_filter(&self.path, input)
            .map_err(FilesError::io("execute", &self.path))?;

        let stderr = result.stderr.trim_matches('\n');
        if !stderr.is_empty() {
            report.add_warning(format!(
                "execution of {} produced error output:",
                self.path.display()
            ));
            for line in stderr.lines() {
                report.add_warning(format!("    {line}"));
            }
        }

        if !result.success {
            return Err(FilesError::ScriptFailed {
                script: self.path.clone(),
                exit_code: result.code.unwrap_or(-1),
            });
        }
        Ok(FileBuffer::from_bytes(result.stdout, buffer.base_path))
    }
}

/// Layers sort by subdirectory name, then by path.
impl Ord for RepoFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.layer
            .cmp(&other.layer)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for RepoFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
