//! Domain-specific error types for the provisioning engine.
//!
//! Library modules return typed errors ([`FilesError`], [`PlatformError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! FilesError
//! ├── NotManageable / NotADirectory   eligibility and type checks
//! ├── DeletedByUser / ModifiedByUser  refused without --force
//! ├── Io                              filesystem operations
//! ├── ScriptFailed                    non-zero exit of a .holoscript layer
//! └── SymlinkResolution               unreadable link target
//! PlatformError                       distribution detection
//! ```

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that abort the processing of a single managed file.
///
/// None of these is fatal for a whole run: the command layer catches every
/// error at the identity boundary and turns it into a report line.
#[derive(Error, Debug)]
pub enum FilesError {
    /// The path exists but is neither a regular file nor a symlink, or it is
    /// required to exist and does not.
    #[error("skipping target: {} is not a manageable file", .path.display())]
    NotManageable {
        /// Offending path.
        path: PathBuf,
    },

    /// A directory was expected but something else was found.
    #[error("cannot open {}: not a directory", .path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// The live target is gone but a base copy exists; recreating it needs force.
    #[error("skipping target: file has been deleted by user (use --force to restore)")]
    DeletedByUser,

    /// The live target differs from the last provisioned snapshot.
    #[error("skipping target: file has been modified by user (use --force to overwrite)")]
    ModifiedByUser,

    /// A filesystem operation failed.
    #[error("cannot {action} {}: {source}", .path.display())]
    Io {
        /// Short verb describing the failed operation (e.g. `"read"`).
        action: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A script layer exited unsuccessfully.
    #[error("execution of {} failed (exit {exit_code})", .script.display())]
    ScriptFailed {
        /// Path of the script layer.
        script: PathBuf,
        /// Exit code, or `-1` when the process was killed by a signal.
        exit_code: i32,
    },

    /// A symlink buffer had to be resolved to contents but its target is unreadable.
    #[error("cannot resolve symlink {} -> {}: {source}", .link.display(), .target.display())]
    SymlinkResolution {
        /// Path the symlink buffer was bound to.
        link: PathBuf,
        /// Resolved link target.
        target: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl FilesError {
    /// Build a `map_err` adapter that wraps an [`io::Error`] with the
    /// operation and path it belongs to.
    ///
    /// ```ignore
    /// std::fs::read(path).map_err(FilesError::io("read", path))?;
    /// ```
    pub fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// Errors that arise from platform detection.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Neither `/etc/os-release` nor `/usr/lib/os-release` could be read.
    #[error("cannot read os-release: {0}")]
    OsReleaseUnreadable(#[source] io::Error),
}
