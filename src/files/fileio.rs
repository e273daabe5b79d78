//! File-kind detection and metadata-preserving file operations.
use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::fs::MetadataExt as _;
use std::path::Path;

use crate::error::FilesError;

use super::buffer::FileBuffer;

/// The only classification of a filesystem entry the engine cares about.
///
/// Obtained from a single `lstat`; symlinks are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Plain file.
    Regular,
    /// Symbolic link, whatever it points to.
    Symlink,
    /// Nothing at the path.
    Missing,
    /// Directory, device, socket, FIFO.
    Other,
}

impl FileKind {
    /// Classify the entry at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `lstat` fails for any reason other than the path
    /// not existing.
    pub fn of(path: &Path) -> Result<Self, FilesError> {
        match fs::symlink_metadata(path) {
            Ok(meta) => Ok(Self::from_file_type(meta.file_type())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::Missing),
            Err(e) => Err(FilesError::io("stat", path)(e)),
        }
    }

    fn from_file_type(ft: fs::FileType) -> Self {
        if ft.is_symlink() {
            Self::Symlink
        } else if ft.is_file() {
            Self::Regular
        } else {
            Self::Other
        }
    }

    /// Regular files and symlinks are the only types the engine touches.
    #[must_use]
    pub const fn is_manageable(self) -> bool {
        matches!(self, Self::Regular | Self::Symlink)
    }

    /// Whether anything exists at the path.
    #[must_use]
    pub const fn exists(self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Whether `path` is a regular file or a symlink. Unreadable paths count as
/// not manageable.
#[must_use]
pub fn is_manageable_file(path: &Path) -> bool {
    FileKind::of(path).is_ok_and(FileKind::is_manageable)
}

/// Ensure the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), FilesError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(FilesError::io("create directory", parent))?;
    }
    Ok(())
}

/// Remove the file or symlink at `path`; a missing path is not an error.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_if_present(path: &Path) -> Result<(), FilesError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(FilesError::io("remove", path)(e)),
        _ => Ok(()),
    }
}

/// Copy a manageable file from `from` to `to`, then transfer metadata.
///
/// Symlinks are copied as symlinks. Parent directories of `to` are created.
///
/// # Errors
///
/// Returns an error if `from` is not manageable, `to` exists and is not
/// manageable, or any filesystem operation fails.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), FilesError> {
    let buffer = FileBuffer::load(from, to)?;
    buffer.write(to)?;
    apply_file_metadata(from, to)
}

/// Copy ownership, permissions and mtime from `from` onto `to`.
///
/// Between two regular files all three are transferred. When either side is
/// a symlink only ownership is transferred, using `lchown`.
///
/// # Errors
///
/// Returns an error if either path cannot be inspected or any of the
/// metadata calls fails.
pub fn apply_file_metadata(from: &Path, to: &Path) -> Result<(), FilesError> {
    let from_meta = fs::symlink_metadata(from).map_err(FilesError::io("stat", from))?;
    let to_kind = FileKind::of(to)?;
    let from_kind = FileKind::from_file_type(from_meta.file_type());

    if from_kind == FileKind::Regular && to_kind == FileKind::Regular {
        let mtime = from_meta.modified().map_err(FilesError::io("stat", from))?;
        OpenOptions::new()
            .write(true)
            .open(to)
            .and_then(|f| f.set_modified(mtime))
            .map_err(FilesError::io("chtimes", to))?;
        fs::set_permissions(to, from_meta.permissions()).map_err(FilesError::io("chmod", to))?;
        std::os::unix::fs::chown(to, Some(from_meta.uid()), Some(from_meta.gid()))
            .map_err(FilesError::io("chown", to))?;
    } else {
        std::os::unix::fs::lchown(to, Some(from_meta.uid()), Some(from_meta.gid()))
            .map_err(FilesError::io("chown", to))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt as _;
    use std::time::{Duration, SystemTime};

    #[test]
    fn kind_of_regular_symlink_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("does-not-exist", &link).unwrap();

        assert_eq!(FileKind::of(&file).unwrap(), FileKind::Regular);
        assert_eq!(FileKind::of(&link).unwrap(), FileKind::Symlink);
        assert_eq!(
            FileKind::of(&dir.path().join("nope")).unwrap(),
            FileKind::Missing
        );
        assert_eq!(FileKind::of(dir.path()).unwrap(), FileKind::Other);
    }

    #[test]
    fn manageable_only_for_regular_and_symlink() {
        assert!(FileKind::Regular.is_manageable());
        assert!(FileKind::Symlink.is_manageable());
        assert!(!FileKind::Missing.is_manageable());
        assert!(!FileKind::Other.is_manageable());
        assert!(!FileKind::Missing.exists());
        assert!(FileKind::Other.exists());
    }

    #[test]
    fn dangling_symlink_is_manageable() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("/nonexistent/target", &link).unwrap();
        assert!(is_manageable_file(&link));
    }

    #[test]
    fn remove_if_present_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_present(&dir.path().join("nope")).unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        remove_if_present(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn copy_file_preserves_content_mode_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from");
        fs::write(&from, "content\n").unwrap();
        fs::set_permissions(&from, fs::Permissions::from_mode(0o640)).unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        fs::File::options()
            .write(true)
            .open(&from)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        let to = dir.path().join("nested/dir/to");
        copy_file(&from, &to).unwrap();

        assert_eq!(fs::read(&to).unwrap(), b"content\n");
        let meta = fs::metadata(&to).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o640);
        assert_eq!(meta.modified().unwrap(), mtime);
    }

    #[test]
    fn copy_file_copies_symlink_as_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from");
        std::os::unix::fs::symlink("target.conf", &from).unwrap();
        let to = dir.path().join("to");
        copy_file(&from, &to).unwrap();
        assert_eq!(fs::read_link(&to).unwrap(), Path::new("target.conf"));
    }

    #[test]
    fn copy_file_refuses_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_file(dir.path(), &dir.path().join("to")).unwrap_err();
        assert!(matches!(err, FilesError::NotManageable { .. }));
    }
}
