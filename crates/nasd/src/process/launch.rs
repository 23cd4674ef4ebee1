//! Runs the daemon from configuration to shutdown.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap fails, the listener cannot be
/// bound, or signal handlers cannot be installed.
pub fn run_daemon() -> Result<(), LaunchError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, reporter, &SystemShutdownSignal::new())
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, reporter)?;
    let endpoint = daemon.config().listen_socket().clone();
    let listener = SocketListener::bind(&endpoint)?;
    let handler = Arc::new(daemon.connection_handler());
    let listener_handle = listener.start(handler)?;
    daemon.reporter().listener_started(&endpoint);

    shutdown.wait()?;
    info!(target: PROCESS_TARGET, "stopping listener");
    listener_handle.shutdown();
    listener_handle.join()?;
    daemon.reporter().listener_stopped(&endpoint);
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
