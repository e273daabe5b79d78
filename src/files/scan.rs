//! Discovery of managed files from the repository and the base directory.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::error::FilesError;

use super::fileio::FileKind;
use super::layer::SCRIPT_SUFFIX;
use super::paths::TargetFile;

/// Find every managed file: those with repository layers, plus orphans that
/// only have a base copy left. The result is sorted by relative path.
///
/// # Errors
///
/// Returns an error if the repository or state path exists but is not a
/// directory.
pub fn scan_repo(cfg: &Config) -> Result<Vec<TargetFile>, FilesError> {
    let repo_dir = &cfg.resource_dir;
    let base_dir = cfg.base_dir();
    for dir in [repo_dir, &base_dir] {
        if !matches!(FileKind::of(dir)?, FileKind::Missing) && !dir.is_dir() {
            return Err(FilesError::NotADirectory { path: dir.clone() });
        }
    }

    let with_layers: BTreeSet<PathBuf> = manageable_files(repo_dir, 2)
        .filter_map(|path| identity_of_repo_file(repo_dir, &path))
        .collect();

    let orphans: BTreeSet<PathBuf> = manageable_files(&base_dir, 1)
        .filter_map(|path| path.strip_prefix(&base_dir).ok().map(Path::to_path_buf))
        .filter(|rel| !with_layers.contains(rel))
        .collect();

    let mut targets: Vec<TargetFile> = with_layers
        .iter()
        .map(|rel| TargetFile::discover(cfg, rel))
        .chain(orphans.iter().map(TargetFile::new))
        .collect();
    targets.sort();
    tracing::debug!(
        "scanned {} managed files ({} orphaned)",
        targets.len(),
        orphans.len()
    );
    Ok(targets)
}

/// Regular files and symlinks below `dir` at `min_depth` or deeper.
/// Unreadable entries are skipped.
fn manageable_files(dir: &Path, min_depth: usize) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .min_depth(min_depth)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() || e.file_type().is_symlink())
        .map(walkdir::DirEntry::into_path)
}

/// `repo/10-foo/etc/bar.conf.holoscript` -> `etc/bar.conf`
fn identity_of_repo_file(repo_dir: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(repo_dir).ok()?;
    let mut components = rel.components();
    components.next()?;
    let rel = components.as_path().to_str()?;
    let rel = rel.strip_suffix(SCRIPT_SUFFIX).unwrap_or(rel);
    (!rel.is_empty()).then(|| PathBuf::from(rel))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::new(
            dir.path().join("root"),
            dir.path().join("repo"),
            dir.path().join("state"),
        );
        (dir, cfg)
    }

    fn write(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn identity_strips_layer_and_suffix() {
        let repo = Path::new("/repo");
        assert_eq!(
            identity_of_repo_file(repo, Path::new("/repo/10-a/etc/foo.conf.holoscript")),
            Some(PathBuf::from("etc/foo.conf"))
        );
        assert_eq!(
            identity_of_repo_file(repo, Path::new("/repo/10-a/etc/foo.conf")),
            Some(PathBuf::from("etc/foo.conf"))
        );
    }

    #[test]
    fn empty_when_nothing_exists() {
        let (_dir, cfg) = setup();
        assert!(scan_repo(&cfg).unwrap().is_empty());
    }

    #[test]
    fn repository_file_is_an_error() {
        let (dir, cfg) = setup();
        fs::write(dir.path().join("repo"), "").unwrap();
        assert!(matches!(
            scan_repo(&cfg),
            Err(FilesError::NotADirectory { .. })
        ));
    }

    #[test]
    fn finds_deduplicated_sorted_identities_and_orphans() {
        let (dir, cfg) = setup();
        let repo = dir.path().join("repo");
        write(&repo.join("README"));
        write(&repo.join("20-b/etc/foo.conf"));
        write(&repo.join("10-a/etc/foo.conf.holoscript"));
        write(&repo.join("10-a/etc/bar.conf"));
        write(&dir.path().join("state/base/etc/foo.conf"));
        write(&dir.path().join("state/base/etc/old.conf"));

        let targets = scan_repo(&cfg).unwrap();
        let ids: Vec<String> = targets.iter().map(TargetFile::entity_id).collect();
        assert_eq!(
            ids,
            vec!["file:/etc/bar.conf", "file:/etc/foo.conf", "file:/etc/old.conf"]
        );
        assert_eq!(targets[1].repo_files().len(), 2);
        assert!(targets[2].is_orphaned());
    }

    #[test]
    fn repo_symlinks_count_as_layers() {
        let (dir, cfg) = setup();
        let layer = dir.path().join("repo/10-a/etc/foo.conf");
        fs::create_dir_all(layer.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink("/nonexistent", &layer).unwrap();
        let targets = scan_repo(&cfg).unwrap();
        assert_eq!(targets.len(), 1);
        assert!(!targets[0].is_orphaned());
    }
}
