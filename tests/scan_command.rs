#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `scan` command.
//!
//! These tests check target discovery across layers and orphans, and the
//! three output formats of the binary.

mod common;

use holo_files::files::{Strategy, scan_repo};

use common::{TestContextBuilder, stdout_of};

fn fixture() -> common::IntegrationTestContext {
    let t = TestContextBuilder::new()
        .with_target("etc/b.conf", "stock b\n")
        .with_target("etc/a.conf", "stock a\n")
        .with_repo_file("20-site", "etc/a.conf", "site\n")
        .with_script("10-base", "etc/a.conf", "cat")
        .with_repo_file("10-base", "etc/b.conf", "b\n")
        .build();
    t.write("root/etc/gone.conf", "edited\n");
    t.write("state/base/etc/gone.conf", "stock gone\n");
    t
}

#[test]
fn scan_lists_managed_and_orphaned_files_in_order() {
    let t = fixture();
    let targets = scan_repo(&t.config).unwrap();
    let ids: Vec<String> = targets.iter().map(|t| t.entity_id()).collect();
    assert_eq!(ids, vec!["file:/etc/a.conf", "file:/etc/b.conf", "file:/etc/gone.conf"]);

    let layers: Vec<(&str, Strategy)> = targets[0]
        .repo_files()
        .iter()
        .map(|r| (r.layer(), r.strategy()))
        .collect();
    assert_eq!(
        layers,
        vec![("10-base", Strategy::Script), ("20-site", Strategy::Copy)]
    );
    assert!(targets[2].is_orphaned());
}

#[test]
fn scan_of_empty_layout_finds_nothing() {
    let t = TestContextBuilder::new().build();
    assert!(scan_repo(&t.config).unwrap().is_empty());
}

#[test]
fn scan_report_describes_planned_work() {
    let t = fixture();
    let ctx = t.ctx();
    let targets = scan_repo(&t.config).unwrap();

    let report = targets[0].report(&ctx);
    let attributes: Vec<&str> = report.lines.iter().map(|l| l.attribute.as_str()).collect();
    assert_eq!(attributes, vec!["store at", "passthru", "apply"]);
    assert_eq!(report.outcome, None);

    let orphan = targets[2].report(&ctx);
    assert_eq!(orphan.action, "Scrubbing");
    assert_eq!(orphan.lines[0].attribute, "restore");
}

#[test]
fn cli_scan_short_prints_entity_ids() {
    let t = fixture();
    let output = t.run_cli(&["scan", "--short"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output),
        "file:/etc/a.conf\nfile:/etc/b.conf\nfile:/etc/gone.conf\n"
    );
}

#[test]
fn cli_scan_json_is_machine_readable() {
    let t = fixture();
    let output = t.run_cli(&["scan", "--json"]);
    assert!(output.status.success(), "{output:?}");
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    let reports = value.as_array().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0]["entity_id"], "file:/etc/a.conf");
    assert_eq!(reports[0]["action"], "Working on");
    assert_eq!(reports[2]["state"], "all repository files were deleted");
    assert!(reports[0].get("state").is_none());
}

#[test]
fn cli_scan_does_not_touch_files() {
    let t = fixture();
    let output = t.run_cli(&["scan"]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout_of(&output).contains("Scrubbing file:/etc/gone.conf"));
    assert_eq!(t.read("root/etc/a.conf"), "stock a\n");
    assert!(!t.exists("state/base/etc/a.conf"));
}
