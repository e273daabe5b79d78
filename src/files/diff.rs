//! Git-style diffs between the provisioned snapshot and the live target.
//!
//! The snapshot path never appears in the output: both sides are labelled
//! with the target path, so the patch applies to the live file. Content is
//! diffed as raw bytes; files need not be UTF-8.
use std::fs;
use std::io::Write as _;
use std::ops::Range;
use std::os::unix::ffi::OsStrExt as _;
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};

use similar::{ChangeTag, TextDiff};

use crate::context::Context;
use crate::error::FilesError;

use super::fileio::FileKind;
use super::paths::TargetFile;

const SYMLINK_MODE: &str = "120000";
const NO_NEWLINE: &[u8] = b"\\ No newline at end of file\n";
const CONTEXT_LINES: usize = 3;

/// One side of a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSide {
    /// Nothing at the path.
    Missing,
    /// A regular file.
    Regular {
        /// File content.
        content: Vec<u8>,
        /// Permission bits (`0o777` mask).
        mode: u32,
    },
    /// A symlink and its stored target.
    Symlink(PathBuf),
}

impl DiffSide {
    /// Read the entry at `path` without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is neither missing nor manageable, or
    /// cannot be read.
    pub fn load(path: &Path) -> Result<Self, FilesError> {
        match FileKind::of(path)? {
            FileKind::Missing => Ok(Self::Missing),
            FileKind::Regular => {
                let content = fs::read(path).map_err(FilesError::io("read", path))?;
                let mode = fs::symlink_metadata(path)
                    .map_err(FilesError::io("stat", path))?
                    .permissions()
                    .mode()
                    & 0o777;
                Ok(Self::Regular { content, mode })
            }
            FileKind::Symlink => Ok(Self::Symlink(
                fs::read_link(path).map_err(FilesError::io("readlink", path))?,
            )),
            FileKind::Other => Err(FilesError::NotManageable {
                path: path.to_path_buf(),
            }),
        }
    }

    fn mode_string(&self) -> String {
        match self {
            Self::Regular { mode, .. } => format!("100{mode:03o}"),
            Self::Symlink(_) | Self::Missing => SYMLINK_MODE.to_string(),
        }
    }
}

impl TargetFile {
    /// Diff from the provisioned snapshot to the live target.
    ///
    /// # Errors
    ///
    /// Returns an error if either side exists but is not manageable or
    /// cannot be read.
    pub fn render_diff(&self, ctx: &Context) -> Result<Vec<u8>, FilesError> {
        let from = DiffSide::load(&self.provisioned_path(&ctx.config))?;
        let to = DiffSide::load(&self.target_path(&ctx.config))?;
        Ok(render(&from, &to, &self.target_path(&ctx.config)))
    }
}

/// Render a patch turning `from` into `to`, labelled with `path`.
#[must_use]
pub fn render(from: &DiffSide, to: &DiffSide, path: &Path) -> Vec<u8> {
    let labels = Labels::new(path);
    let mut out = Vec::new();
    match (from, to) {
        (DiffSide::Missing, DiffSide::Missing) => {}
        (DiffSide::Missing, _) => creation(to, &labels, &mut out),
        (_, DiffSide::Missing) => deletion(from, &labels, &mut out),
        (
            DiffSide::Regular {
                content: old,
                mode: old_mode,
            },
            DiffSide::Regular {
                content: new,
                mode: new_mode,
            },
        ) => {
            let mut body = Vec::new();
            line_diff(old, new, &labels.a, &labels.b, &mut body);
            if old_mode == new_mode && body.is_empty() {
                return out;
            }
            labels.git_header(&mut out);
            if old_mode != new_mode {
                let _ = writeln!(out, "old mode {}", from.mode_string());
                let _ = writeln!(out, "new mode {}", to.mode_string());
            }
            out.append(&mut body);
        }
        (DiffSide::Symlink(old), DiffSide::Symlink(new)) => {
            if old == new {
                return out;
            }
            labels.git_header(&mut out);
            file_header(&labels.a, &labels.b, &mut out);
            out.extend_from_slice(b"@@ -1 +1 @@\n");
            link_line(b'-', old, &mut out);
            link_line(b'+', new, &mut out);
        }
        // Type change: git presents this as a deletion followed by a creation.
        _ => {
            deletion(from, &labels, &mut out);
            creation(to, &labels, &mut out);
        }
    }
    out
}

#[derive(Debug)]
struct Labels {
    a: Vec<u8>,
    b: Vec<u8>,
}

impl Labels {
    fn new(path: &Path) -> Self {
        let mut trimmed = path.as_os_str().as_bytes();
        while let Some(rest) = trimmed.strip_prefix(b"/") {
            trimmed = rest;
        }
        Self {
            a: [b"a/".as_slice(), trimmed].concat(),
            b: [b"b/".as_slice(), trimmed].concat(),
        }
    }

    fn git_header(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"diff --git ");
        out.extend_from_slice(&self.a);
        out.push(b' ');
        out.extend_from_slice(&self.b);
        out.push(b'\n');
    }
}

fn file_header(old_label: &[u8], new_label: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(b"--- ");
    out.extend_from_slice(old_label);
    out.extend_from_slice(b"\n+++ ");
    out.extend_from_slice(new_label);
    out.push(b'\n');
}

/// A symlink target as a single line without trailing newline.
fn link_line(tag: u8, target: &Path, out: &mut Vec<u8>) {
    out.push(tag);
    out.extend_from_slice(target.as_os_str().as_bytes());
    out.push(b'\n');
    out.extend_from_slice(NO_NEWLINE);
}

fn creation(side: &DiffSide, labels: &Labels, out: &mut Vec<u8>) {
    labels.git_header(out);
    let _ = writeln!(out, "new file mode {}", side.mode_string());
    match side {
        DiffSide::Regular { content, .. } => line_diff(&[], content, b"/dev/null", &labels.b, out),
        DiffSide::Symlink(target) => {
            file_header(b"/dev/null", &labels.b, out);
            out.extend_from_slice(b"@@ -0,0 +1 @@\n");
            link_line(b'+', target, out);
        }
        DiffSide::Missing => {}
    }
}

fn deletion(side: &DiffSide, labels: &Labels, out: &mut Vec<u8>) {
    labels.git_header(out);
    let _ = writeln!(out, "deleted file mode {}", side.mode_string());
    match side {
        DiffSide::Regular { content, .. } => line_diff(content, &[], &labels.a, b"/dev/null", out),
        DiffSide::Symlink(target) => {
            file_header(&labels.a, b"/dev/null", out);
            out.extend_from_slice(b"@@ -1 +0,0 @@\n");
            link_line(b'-', target, out);
        }
        DiffSide::Missing => {}
    }
}

/// Unified line diff with three lines of context; nothing when equal.
///
/// Lines end at `\n` only, as in `diff -u`; a final line without newline
/// gets the `\ No newline at end of file` marker.
fn line_diff(old: &[u8], new: &[u8], old_label: &[u8], new_label: &[u8], out: &mut Vec<u8>) {
    let old_lines: Vec<&[u8]> = old.split_inclusive(|&b| b == b'\n').collect();
    let new_lines: Vec<&[u8]> = new.split_inclusive(|&b| b == b'\n').collect();
    let diff = TextDiff::configure().diff_slices(old_lines.as_slice(), new_lines.as_slice());

    for (idx, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        if idx == 0 {
            file_header(old_label, new_label, out);
        }
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            hunk_range(&old_range),
            hunk_range(&new_range)
        );
        for op in group {
            for change in diff.iter_changes(op) {
                out.push(match change.tag() {
                    ChangeTag::Equal => b' ',
                    ChangeTag::Delete => b'-',
                    ChangeTag::Insert => b'+',
                });
                let line = change.value();
                out.extend_from_slice(line);
                if !line.ends_with(b"\n") {
                    out.push(b'\n');
                    out.extend_from_slice(NO_NEWLINE);
                }
            }
        }
    }
}

/// `start,len` in unified-diff notation; an empty range names the line
/// before it.
fn hunk_range(range: &Range<usize>) -> String {
    match range.len() {
        0 => format!("{},0", range.start),
        1 => format!("{}", range.start + 1),
        len => format!("{},{len}", range.start + 1),
    }
}
