//! Directory layout shared by every operation.
//!
//! All paths are carried in an explicit [`Config`] value that is threaded
//! through the engine, so several roots can be provisioned side by side (the
//! test suite relies on this).
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Default location of the repository below the root directory.
pub const DEFAULT_RESOURCE_DIR: &str = "usr/share/holo/files";

/// Default location of the persistent state below the root directory.
pub const DEFAULT_STATE_DIR: &str = "var/lib/holo/files";

/// Resolved directory layout for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory that target paths are relative to (usually `/`).
    pub root_dir: PathBuf,
    /// Repository directory; each subdirectory is one layer.
    pub resource_dir: PathBuf,
    /// Persistent state; holds the `base/` and `provisioned/` trees.
    pub state_dir: PathBuf,
}

impl Config {
    /// Create a configuration from explicit directories.
    #[must_use]
    pub fn new(
        root_dir: impl Into<PathBuf>,
        resource_dir: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            resource_dir: resource_dir.into(),
            state_dir: state_dir.into(),
        }
    }

    /// Create a configuration with the default layout below `root_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use holo_files::config::Config;
    /// use std::path::Path;
    ///
    /// let cfg = Config::from_root("/");
    /// assert_eq!(cfg.resource_dir, Path::new("/usr/share/holo/files"));
    /// assert_eq!(cfg.base_dir(), Path::new("/var/lib/holo/files/base"));
    /// ```
    #[must_use]
    pub fn from_root(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self {
            resource_dir: root_dir.join(DEFAULT_RESOURCE_DIR),
            state_dir: root_dir.join(DEFAULT_STATE_DIR),
            root_dir,
        }
    }

    /// Build a configuration from optional overrides, falling back to the
    /// default layout for anything not given.
    #[must_use]
    pub fn resolve(
        root_dir: Option<&Path>,
        resource_dir: Option<&Path>,
        state_dir: Option<&Path>,
    ) -> Self {
        let mut cfg = Self::from_root(root_dir.unwrap_or_else(|| Path::new("/")));
        if let Some(dir) = resource_dir {
            cfg.resource_dir = dir.to_path_buf();
        }
        if let Some(dir) = state_dir {
            cfg.state_dir = dir.to_path_buf();
        }
        cfg
    }

    /// Directory holding the pristine copies captured before the first apply.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.state_dir.join("base")
    }

    /// Directory holding the output of the last successful apply.
    #[must_use]
    pub fn provisioned_dir(&self) -> PathBuf {
        self.state_dir.join("provisioned")
    }

    /// Check that the root directory exists and that the repository and
    /// state directories, if present, are directories.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending directory.
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.is_dir() {
            bail!("cannot open {}: not a directory", self.root_dir.display());
        }
        for dir in [&self.resource_dir, &self.state_dir] {
            if dir.symlink_metadata().is_ok() && !dir.is_dir() {
                bail!("cannot open {}: not a directory", dir.display());
            }
        }
        Ok(())
    }
}
