//! Failures that stop the daemon process.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Reason the daemon exited before a clean shutdown.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration, telemetry, storage or backend setup failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    /// The client endpoint could not be bound or its accept loop panicked.
    #[error("client listener failed: {0}")]
    Listener(#[from] ListenerError),
    /// Signal handlers could not be installed.
    #[error("cannot wait for shutdown: {0}")]
    Shutdown(#[from] ShutdownError),
}
