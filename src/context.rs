//! Per-run context shared by every managed file.
use std::sync::Arc;

use crate::config::Config;
use crate::exec::{Executor, SystemExecutor};
use crate::platform::PackageManager;

/// Shared, read-only context for processing managed files.
///
/// Cloning is cheap; every field is reference-counted so a context can be
/// handed to parallel workers.
#[derive(Clone)]
pub struct Context {
    /// Directory layout for this run.
    pub config: Arc<Config>,
    /// Package-manager integration used for upgrade collisions and orphan
    /// cleanup.
    pub package_manager: Arc<dyn PackageManager>,
    /// Command executor for script layers (injectable for testing).
    pub executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("package_manager", &"<dyn PackageManager>")
            .field("executor", &"<dyn Executor>")
            .finish()
    }
}

impl Context {
    /// Creates a new context.
    #[must_use]
    pub fn new(
        config: Config,
        package_manager: Arc<dyn PackageManager>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            package_manager,
            executor,
        }
    }

    /// Creates a context that runs scripts as real processes.
    #[must_use]
    pub fn with_system_executor(config: Config, package_manager: Arc<dyn PackageManager>) -> Self {
        Self::new(config, package_manager, Arc::new(SystemExecutor))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Generic;

    #[test]
    fn debug_hides_trait_objects() {
        let ctx = Context::with_system_executor(Config::from_root("/"), Arc::new(Generic));
        let dbg = format!("{ctx:?}");
        assert!(dbg.contains("<dyn PackageManager>"));
        assert!(dbg.contains("/usr/share/holo/files"));
    }
}
