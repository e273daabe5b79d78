#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `diff` command.

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt as _;
use std::path::Path;
use std::process::Command;

use holo_files::files::diff::{DiffSide, render};
use holo_files::files::scan_repo;

use common::{TestContextBuilder, stdout_of};

fn provisioned() -> common::IntegrationTestContext {
    let t = TestContextBuilder::new()
        .with_target("etc/app.conf", "stock\n")
        .with_repo_file("10-base", "etc/app.conf", "one\ntwo\nthree\n")
        .build();
    let ctx = t.ctx();
    for target in scan_repo(&t.config).unwrap() {
        assert!(!target.apply(&ctx, false).failed());
    }
    t
}

#[test]
fn no_diff_right_after_apply() {
    let t = provisioned();
    let ctx = t.ctx();
    let targets = scan_repo(&t.config).unwrap();
    assert!(targets[0].render_diff(&ctx).unwrap().is_empty());
}

#[test]
fn diff_shows_user_edits() {
    let t = provisioned();
    t.write("root/etc/app.conf", "one\n2\nthree\n");
    let ctx = t.ctx();
    let targets = scan_repo(&t.config).unwrap();
    let diff = String::from_utf8(targets[0].render_diff(&ctx).unwrap()).unwrap();

    let target = t.config.root_dir.join("etc/app.conf");
    let label = target.to_string_lossy().trim_start_matches('/').to_string();
    assert!(diff.starts_with(&format!("diff --git a/{label} b/{label}\n")));
    assert!(diff.contains("-two\n"));
    assert!(diff.contains("+2\n"));
    assert!(!diff.contains("state/provisioned"));
}

#[test]
fn diff_shows_deleted_target() {
    let t = provisioned();
    t.remove("root/etc/app.conf");
    let ctx = t.ctx();
    let targets = scan_repo(&t.config).unwrap();
    let diff = String::from_utf8(targets[0].render_diff(&ctx).unwrap()).unwrap();
    assert!(diff.contains("deleted file mode 100"));
    assert!(diff.contains("-three\n"));
}

#[test]
fn cli_diff_writes_patch_to_stdout() {
    let t = provisioned();
    t.write("root/etc/app.conf", "one\ntwo\nthree\nfour\n");
    let output = t.run_cli(&["diff", "etc/app.conf"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("diff --git a/"));
    assert!(stdout.contains("+four\n"));
}

// ---------------------------------------------------------------------------
// Patch round trip
// ---------------------------------------------------------------------------

enum Entry<'a> {
    Missing,
    File(&'a [u8]),
    Link(&'a str),
}

fn place(path: &Path, entry: &Entry<'_>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    match entry {
        Entry::Missing => {}
        Entry::File(content) => {
            fs::write(path, content).unwrap();
            fs::set_permissions(path, fs::Permissions::from_mode(0o644)).unwrap();
        }
        Entry::Link(target) => std::os::unix::fs::symlink(target, path).unwrap(),
    }
}

/// Type and content only; the mode of files created by `git apply`
/// depends on the umask.
fn shape(side: DiffSide) -> DiffSide {
    match side {
        DiffSide::Regular { content, .. } => DiffSide::Regular { content, mode: 0 },
        other => other,
    }
}

/// Apply the patch from `from` to `to` on top of `from` with `git apply`
/// and check that the result has the type and content of `to`.
fn assert_patch_reproduces(from: &Entry<'_>, to: &Entry<'_>) {
    let dir = tempfile::tempdir().unwrap();
    let rel = Path::new("etc/foo.conf");
    let snapshot = dir.path().join("snapshot");
    let live = dir.path().join("live");
    place(&snapshot.join(rel), from);
    place(&live.join(rel), to);

    let expected = DiffSide::load(&live.join(rel)).unwrap();
    let patch = render(&DiffSide::load(&snapshot.join(rel)).unwrap(), &expected, rel);
    assert!(!patch.is_empty());
    let patch_file = dir.path().join("change.patch");
    fs::write(&patch_file, &patch).unwrap();

    let output = Command::new("git")
        .arg("apply")
        .arg(&patch_file)
        .current_dir(&snapshot)
        .env("GIT_CEILING_DIRECTORIES", dir.path())
        .output()
        .expect("run git apply");
    assert!(
        output.status.success(),
        "git apply failed: {}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&patch)
    );
    assert_eq!(
        shape(DiffSide::load(&snapshot.join(rel)).unwrap()),
        shape(expected)
    );
}

#[test]
fn patch_recreates_missing_file() {
    assert_patch_reproduces(&Entry::Missing, &Entry::File(b"one\ntwo\n"));
}

#[test]
fn patch_turns_file_into_symlink() {
    assert_patch_reproduces(&Entry::File(b"one\n"), &Entry::Link("/etc/bar.conf"));
}

#[test]
fn patch_turns_symlink_into_file() {
    assert_patch_reproduces(&Entry::Link("bar.conf"), &Entry::File(b"one\ntwo"));
}

#[test]
fn patch_retargets_symlink() {
    assert_patch_reproduces(&Entry::Link("old.conf"), &Entry::Link("../new.conf"));
}

#[test]
fn patch_preserves_non_utf8_bytes() {
    assert_patch_reproduces(
        &Entry::File(b"key=\xe9t\xe9\n"),
        &Entry::File(b"key=\xe9t\xe9\nnew\n"),
    );
}

#[test]
fn patch_deletes_file() {
    assert_patch_reproduces(&Entry::File(b"gone\n"), &Entry::Missing);
}
