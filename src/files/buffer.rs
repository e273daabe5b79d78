//! In-memory staged file content.
use std::fs;
use std::io::Write as _;
use std::os::unix::fs::OpenOptionsExt as _;
use std::path::{Path, PathBuf};

use crate::error::FilesError;

use super::fileio::{FileKind, ensure_parent_dir, remove_if_present};

/// Payload of a [`FileBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// Content of a regular file.
    Bytes(Vec<u8>),
    /// Target of a symlink, exactly as stored in the link.
    Symlink(PathBuf),
}

/// The contents of a file, staged between layer applications.
///
/// `base_path` is only used to resolve relative symlink targets; it does not
/// take part in equality.
#[derive(Debug, Clone)]
pub struct FileBuffer {
    /// Staged payload.
    pub contents: Contents,
    /// Path the buffer will be written to; anchors relative symlinks.
    pub base_path: PathBuf,
}

impl PartialEq for FileBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.contents == other.contents
    }
}

impl Eq for FileBuffer {}

impl FileBuffer {
    /// Read the manageable file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::NotManageable`] unless `path` is a regular file
    /// or symlink, or an I/O error if reading fails.
    pub fn load(path: &Path, base_path: impl Into<PathBuf>) -> Result<Self, FilesError> {
        let contents = match FileKind::of(path)? {
            FileKind::Regular => Contents::Bytes(fs::read(path).map_err(FilesError::io("read", path))?),
            FileKind::Symlink => {
                Contents::Symlink(fs::read_link(path).map_err(FilesError::io("readlink", path))?)
            }
            FileKind::Missing | FileKind::Other => {
                return Err(FilesError::NotManageable {
                    path: path.to_path_buf(),
                });
            }
        };
        Ok(Self {
            contents,
            base_path: base_path.into(),
        })
    }

    /// Create a buffer holding regular file content.
    pub fn from_bytes(content: impl Into<Vec<u8>>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            contents: Contents::Bytes(content.into()),
            base_path: base_path.into(),
        }
    }

    /// Create a buffer holding a symlink.
    pub fn from_symlink(target: impl Into<PathBuf>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            contents: Contents::Symlink(target.into()),
            base_path: base_path.into(),
        }
    }

    /// Whether this buffer holds a symlink.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self.contents, Contents::Symlink(_))
    }

    /// Return a buffer with content: self if it already has content, otherwise
    /// the content of the link target. Relative targets are resolved against
    /// the directory of `base_path`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::SymlinkResolution`] if the link target cannot be
    /// read.
    pub fn resolve_symlink(self) -> Result<Self, FilesError> {
        let Contents::Symlink(link_target) = &self.contents else {
            return Ok(self);
        };
        let resolved = if link_target.is_absolute() {
            link_target.clone()
        } else {
            self.base_path
                .parent()
                .unwrap_or_else(|| Path::new("/"))
                .join(link_target)
        };
        let bytes = fs::read(&resolved).map_err(|source| FilesError::SymlinkResolution {
            link: self.base_path.clone(),
            target: resolved.clone(),
            source,
        })?;
        Ok(Self::from_bytes(bytes, self.base_path))
    }

    /// Content bytes, or `None` for a symlink.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.contents {
            Contents::Bytes(b) => Some(b),
            Contents::Symlink(_) => None,
        }
    }

    /// Write the buffer to `path`, replacing whatever regular file or symlink
    /// was there. New regular files get mode 0600; callers transfer the real
    /// metadata afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing entry at `path` is not manageable, or
    /// if any filesystem operation fails.
    pub fn write(&self, path: &Path) -> Result<(), FilesError> {
        match FileKind::of(path)? {
            FileKind::Other => {
                return Err(FilesError::NotManageable {
                    path: path.to_path_buf(),
                });
            }
            FileKind::Regular | FileKind::Symlink => remove_if_present(path)?,
            FileKind::Missing => ensure_parent_dir(path)?,
        }

        match &self.contents {
            Contents::Bytes(bytes) => fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o600)
                .open(path)
                .and_then(|mut f| f.write_all(bytes))
                .map_err(FilesError::io("write", path)),
            Contents::Symlink(target) => {
                std::os::unix::fs::symlink(target, path).map_err(FilesError::io("symlink", path))
            }
        }
    }
}
