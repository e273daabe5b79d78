//! Managed-file identities and their physical locations.
use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::Config;

use super::fileio::is_manageable_file;
use super::layer::{RepoFile, SCRIPT_SUFFIX};

/// One managed file, identified by its path relative to the target root.
///
/// Equality and ordering only consider the relative path; the discovered
/// layers are attached data.
#[derive(Debug, Clone)]
pub struct TargetFile {
    rel_path: PathBuf,
    repo_files: Vec<RepoFile>,
}

impl PartialEq for TargetFile {
    fn eq(&self, other: &Self) -> bool {
        self.rel_path == other.rel_path
    }
}

impl Eq for TargetFile {}

impl PartialOrd for TargetFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TargetFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rel_path.cmp(&other.rel_path)
    }
}

impl TargetFile {
    /// Create an identity without layers. Leading `/` components are dropped
    /// so that `/etc/foo.conf` and `etc/foo.conf` name the same file.
    pub fn new(rel_path: impl AsRef<Path>) -> Self {
        let rel_path = rel_path
            .as_ref()
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::CurDir))
            .collect();
        Self {
            rel_path,
            repo_files: Vec::new(),
        }
    }

    /// Create an identity from a path below `dir`, e.g. a file found in the
    /// base directory. Returns `None` if `path` is not below `dir`.
    #[must_use]
    pub fn from_path_in(dir: &Path, path: &Path) -> Option<Self> {
        path.strip_prefix(dir).ok().map(Self::new)
    }

    /// Create an identity and discover its repository layers.
    pub fn discover(cfg: &Config, rel_path: impl AsRef<Path>) -> Self {
        let mut target = Self::new(rel_path);
        target.repo_files = target.find_repo_files(cfg);
        target
    }

    /// Attach layers found elsewhere. They are kept sorted.
    #[must_use]
    pub fn with_repo_files(mut self, mut repo_files: Vec<RepoFile>) -> Self {
        repo_files.sort();
        self.repo_files = repo_files;
        self
    }

    /// Path relative to the target root.
    #[must_use]
    pub fn rel_path(&self) -> &Path {
        &self.rel_path
    }

    /// Path of this file below `dir`.
    #[must_use]
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.rel_path)
    }

    /// The live file.
    #[must_use]
    pub fn target_path(&self, cfg: &Config) -> PathBuf {
        self.path_in(&cfg.root_dir)
    }

    /// The pristine copy taken before the first apply.
    #[must_use]
    pub fn base_path(&self, cfg: &Config) -> PathBuf {
        self.path_in(&cfg.base_dir())
    }

    /// The output of the last successful apply.
    #[must_use]
    pub fn provisioned_path(&self, cfg: &Config) -> PathBuf {
        self.path_in(&cfg.provisioned_dir())
    }

    /// Sorted repository layers.
    #[must_use]
    pub fn repo_files(&self) -> &[RepoFile] {
        &self.repo_files
    }

    /// Whether state remains but no layer does.
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.repo_files.is_empty()
    }

    /// Identifier used on the command line and in reports.
    #[must_use]
    pub fn entity_id(&self) -> String {
        format!("file:/{}", self.rel_path.display())
    }

    /// Whether `selector` names this file. Accepts an entity ID
    /// (`file:/etc/foo`), an absolute path (`/etc/foo`) or a relative path
    /// (`etc/foo`).
    #[must_use]
    pub fn matches_selector(&self, selector: &str) -> bool {
        let path = selector.strip_prefix("file:").unwrap_or(selector);
        Self::new(path).rel_path == self.rel_path
    }

    /// For each repository subdirectory in name order, the plain layer file,
    /// or failing that the script layer file.
    fn find_repo_files(&self, cfg: &Config) -> Vec<RepoFile> {
        let mut script_name = self.rel_path.as_os_str().to_owned();
        script_name.push(SCRIPT_SUFFIX);

        let mut found: Vec<RepoFile> = repo_subdirectories(cfg)
            .into_iter()
            .filter_map(|(layer, dir)| {
                [dir.join(&self.rel_path), dir.join(&script_name)]
                    .into_iter()
                    .find(|candidate| is_manageable_file(candidate))
                    .map(|path| RepoFile::new(layer, path))
            })
            .collect();
        found.sort();
        found
    }
}

/// Layer directories below the repository, sorted by name. An unreadable or
/// missing repository yields nothing.
#[must_use]
pub fn repo_subdirectories(cfg: &Config) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(&cfg.resource_dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .collect();
    dirs.sort();
    dirs
}
