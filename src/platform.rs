//! Integration points with the system package manager.
//!
//! When a package manager upgrades a file that has been modified by us, it
//! leaves a side file next to the target instead of overwriting it. Each
//! package manager family has its own naming convention; the
//! [`PackageManager`] trait hides these differences from the engine.
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::PlatformError;
use crate::files::fileio::is_manageable_file;

/// Package-manager integration consumed by the provisioning engine.
#[cfg_attr(test, mockall::automock)]
pub trait PackageManager: Send + Sync {
    /// A fresh stock file placed next to the target without touching the
    /// target itself (e.g. `.pacnew`). It becomes the new base.
    fn find_updated_target_base(&self, target: &Path) -> Option<PathBuf>;

    /// The previously installed file, moved aside while a fresh stock file
    /// was installed at the target (e.g. `.dpkg-old`). The moved file is
    /// what drift detection must look at.
    fn find_config_backup(&self, target: &Path) -> Option<PathBuf>;

    /// Leftovers of a removed package that should go away together with an
    /// orphaned managed file (e.g. `.pacsave`).
    fn additional_cleanup_targets(&self, target: &Path) -> Vec<PathBuf>;
}

/// Return `target` + `suffix` if that is a manageable file.
fn sibling_with_suffix(target: &Path, suffix: &str) -> Option<PathBuf> {
    let mut name = target.as_os_str().to_owned();
    name.push(suffix);
    let candidate = PathBuf::from(name);
    is_manageable_file(&candidate).then_some(candidate)
}

/// pacman (Arch Linux and derivatives).
#[derive(Debug, Default, Clone, Copy)]
pub struct Pacman;

impl PackageManager for Pacman {
    fn find_updated_target_base(&self, target: &Path) -> Option<PathBuf> {
        sibling_with_suffix(target, ".pacnew")
    }

    fn find_config_backup(&self, _target: &Path) -> Option<PathBuf> {
        None
    }

    fn additional_cleanup_targets(&self, target: &Path) -> Vec<PathBuf> {
        sibling_with_suffix(target, ".pacsave").into_iter().collect()
    }
}

/// dpkg (Debian and derivatives).
#[derive(Debug, Default, Clone, Copy)]
pub struct Dpkg;

impl PackageManager for Dpkg {
    fn find_updated_target_base(&self, target: &Path) -> Option<PathBuf> {
        sibling_with_suffix(target, ".dpkg-dist")
    }

    fn find_config_backup(&self, target: &Path) -> Option<PathBuf> {
        sibling_with_suffix(target, ".dpkg-old")
    }

    fn additional_cleanup_targets(&self, _target: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// RPM (Fedora, openSUSE).
#[derive(Debug, Default, Clone, Copy)]
pub struct Rpm;

impl PackageManager for Rpm {
    fn find_updated_target_base(&self, target: &Path) -> Option<PathBuf> {
        sibling_with_suffix(target, ".rpmnew")
    }

    fn find_config_backup(&self, _target: &Path) -> Option<PathBuf> {
        None
    }

    // .rpmsave is the reverse of .rpmnew, not a removal leftover.
    fn additional_cleanup_targets(&self, _target: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Fallback for unknown distributions: no package-manager integration.
#[derive(Debug, Default, Clone, Copy)]
pub struct Generic;

impl PackageManager for Generic {
    fn find_updated_target_base(&self, _target: &Path) -> Option<PathBuf> {
        None
    }

    fn find_config_backup(&self, _target: &Path) -> Option<PathBuf> {
        None
    }

    fn additional_cleanup_targets(&self, _target: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Package-manager family of the running system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// pacman based.
    Arch,
    /// dpkg based.
    Debian,
    /// RPM based (Fedora, openSUSE).
    Rpm,
    /// Anything else; no package-manager integration.
    Generic,
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arch => write!(f, "arch"),
            Self::Debian => write!(f, "debian"),
            Self::Rpm => write!(f, "rpm"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Package-manager family derived from `ids`.
    pub distribution: Distribution,
    /// `ID` and `ID_LIKE` values from os-release.
    pub ids: BTreeSet<String>,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// `HOLO_CURRENT_DISTRIBUTION` overrides os-release detection; setting
    /// it to `unittest` selects [`Generic`] without a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if no os-release file can be read.
    pub fn detect() -> Result<Self, PlatformError> {
        if let Ok(value) = std::env::var("HOLO_CURRENT_DISTRIBUTION")
            && !value.is_empty()
        {
            return Ok(Self::from_ids([value]));
        }

        let content = std::fs::read_to_string("/etc/os-release")
            .or_else(|_| std::fs::read_to_string("/usr/lib/os-release"))
            .map_err(PlatformError::OsReleaseUnreadable)?;
        Ok(Self::from_os_release(&content))
    }

    /// Build a platform from os-release file content.
    #[must_use]
    pub fn from_os_release(content: &str) -> Self {
        let vars = parse_os_release(content);
        let mut ids = Vec::new();
        if let Some(id) = vars.iter().find(|(k, _)| k == "ID") {
            ids.push(id.1.clone());
        }
        if let Some(like) = vars.iter().find(|(k, _)| k == "ID_LIKE") {
            ids.extend(like.1.split_whitespace().map(String::from));
        }
        Self::from_ids(ids)
    }

    /// Build a platform from a list of distribution IDs.
    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        let ids: BTreeSet<String> = ids.into_iter().collect();
        let has = |id: &str| ids.contains(id);
        let distribution = if has("arch") {
            Distribution::Arch
        } else if has("debian") {
            Distribution::Debian
        } else if has("fedora") || has("suse") {
            Distribution::Rpm
        } else {
            Distribution::Generic
        };
        Self { distribution, ids }
    }

    /// Whether the distribution was recognized (the `unittest` override counts).
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        self.distribution != Distribution::Generic || self.ids.contains("unittest")
    }

    /// The package-manager integration for this platform.
    #[must_use]
    pub fn package_manager(&self) -> Arc<dyn PackageManager> {
        match self.distribution {
            Distribution::Arch => Arc::new(Pacman),
            Distribution::Debian => Arc::new(Dpkg),
            Distribution::Rpm => Arc::new(Rpm),
            Distribution::Generic => Arc::new(Generic),
        }
    }
}

/// Parse the shell-like `KEY=value` syntax of os-release(5).
///
/// Values may be wrapped in single or double quotes, and backslash escapes
/// any following character.
fn parse_os_release(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), unquote(value)))
        .collect()
}

fn unquote(value: &str) -> String {
    let inner = ['"', '\'']
        .iter()
        .find_map(|q| {
            value
                .strip_prefix(*q)
                .and_then(|v| v.strip_suffix(*q))
        })
        .unwrap_or(value);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
