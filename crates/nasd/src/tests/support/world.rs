//! BDD test world: loader, reporter, stub backend, and bootstrap outcome.

use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};

use super::backend::StubBackend;
use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across bootstrap steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    pub backend: StubBackend,
    daemon: Option<Daemon>,
    bootstrap_error: Option<BootstrapError>,
}

impl TestWorld {
    /// Builds a world with a reachable backend and a valid configuration.
    #[must_use]
    pub fn new() -> Self {
        let backend = StubBackend::start();
        Self {
            loader: Box::new(TestConfigLoader::new(backend.endpoint())),
            reporter: Arc::new(RecordingHealthReporter::default()),
            backend,
            daemon: None,
            bootstrap_error: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Installs a loader that succeeds against the stub backend.
    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(TestConfigLoader::new(self.backend.endpoint()));
        self.reset_results();
    }

    /// Installs a loader whose backend cannot be reached.
    pub fn use_unreachable_backend(&mut self) {
        self.loader = Box::new(TestConfigLoader::with_unreachable_backend());
        self.reset_results();
    }

    /// Installs a loader whose configuration fails validation.
    pub fn use_zero_pool_size(&mut self) {
        self.loader = Box::new(TestConfigLoader::new(self.backend.endpoint()).with_pool_size(0));
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        let reporter = Arc::clone(&self.reporter);
        match bootstrap_with(&*self.loader, reporter) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Returns the bootstrap error, if any.
    #[must_use]
    pub const fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the bootstrapped daemon, if any.
    #[must_use]
    pub const fn daemon(&self) -> Option<&Daemon> {
        self.daemon.as_ref()
    }

    fn reset_results(&mut self) {
        self.daemon = None;
        self.bootstrap_error = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
