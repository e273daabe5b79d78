// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed root, repository and state directory
// plus a fluent builder so each integration test can set up an isolated
// environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt as _;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use holo_files::config::Config;
use holo_files::context::Context;
use holo_files::exec::SystemExecutor;
use holo_files::platform::{Generic, PackageManager};

/// An isolated root, repository and state directory backed by a
/// [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory holding `root/`, `repo/`, `state/` and `cache/`.
    pub dir: tempfile::TempDir,
    pub config: Config,
}

impl IntegrationTestContext {
    /// Create a new context with an empty root directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::new(
            dir.path().join("root"),
            dir.path().join("repo"),
            dir.path().join("state"),
        );
        fs::create_dir_all(&config.root_dir).expect("create root dir");
        Self { dir, config }
    }

    /// Absolute path of `rel` inside the temporary directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent");
        fs::write(&path, content).expect("write file");
        path
    }

    /// Read `rel` as UTF-8.
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    /// Whether anything exists at `rel` (symlinks are not followed).
    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).symlink_metadata().is_ok()
    }

    /// Remove the file at `rel`.
    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("remove file");
    }

    /// Context using the package-manager integration `pm`.
    pub fn ctx_with(&self, pm: Arc<dyn PackageManager>) -> Context {
        Context::new(self.config.clone(), pm, Arc::new(SystemExecutor))
    }

    /// Context without package-manager integration.
    pub fn ctx(&self) -> Context {
        self.ctx_with(Arc::new(Generic))
    }

    /// Run the `holo-files` binary against this context's directories.
    pub fn run_cli(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_holo-files"))
            .args(args)
            .env("HOLO_ROOT_DIR", &self.config.root_dir)
            .env("HOLO_RESOURCE_DIR", &self.config.resource_dir)
            .env("HOLO_STATE_DIR", &self.config.state_dir)
            .env("HOLO_CURRENT_DISTRIBUTION", "unittest")
            .env("XDG_CACHE_HOME", self.path("cache"))
            .output()
            .expect("run holo-files")
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context with an empty root.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Create a live file `root/<rel>`, as a package would have installed it.
    pub fn with_target(self, rel: &str, content: &str) -> Self {
        self.ctx.write(&format!("root/{rel}"), content);
        self
    }

    /// Add a plain repository entry `repo/<layer>/<rel>`.
    pub fn with_repo_file(self, layer: &str, rel: &str, content: &str) -> Self {
        self.ctx.write(&format!("repo/{layer}/{rel}"), content);
        self
    }

    /// Add an executable repository script `repo/<layer>/<rel>.holoscript`.
    pub fn with_script(self, layer: &str, rel: &str, body: &str) -> Self {
        let path = self.ctx.write(
            &format!("repo/{layer}/{rel}.holoscript"),
            &format!("#!/bin/sh\n{body}\n"),
        );
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

/// Standard output of a finished process as UTF-8.
pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
