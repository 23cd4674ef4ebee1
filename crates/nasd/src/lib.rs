//! NAS file server daemon.
//!
//! `nasd` serves per-user file storage over a length-prefixed binary protocol
//! (see [`nas_protocol`]). Each client connection runs a command loop on its
//! own thread: requests are decoded, routed to a command handler, and
//! answered with exactly one response before the next request is read.
//! Uploads and downloads stream file content as data frames between the
//! command's response and the next request.
//!
//! Credentials and storage quotas live in a separate backend service reached
//! through a pool of framed connections ([`BackendPool`]). Files live under
//! `<storage_root>/<username>`, opened as a capability directory so client
//! paths can never reach outside it. A process-wide [`QuotaLedger`] reserves
//! the declared size of every in-flight upload so concurrent uploads cannot
//! jointly exceed a user's allocation.
//!
//! The bootstrap sequence loads configuration through [`nas_config`],
//! initialises structured telemetry, prepares the storage root and socket
//! directory, and verifies the backend is reachable before the listener
//! starts. Health reporting hooks emit structured events at each stage.

mod backend;
mod bootstrap;
mod dispatch;
mod health;
mod process;
mod session;
mod storage;
pub mod telemetry;
mod transport;

pub use backend::{BackendClient, BackendError, BackendPool, Directory};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{
    CommandError, CommandRouter, ConnectionError, DispatchConnectionHandler, Services,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use session::{Authority, Session};
pub use storage::{
    DiskStorage, QuotaExceeded, QuotaLedger, Reservation, SafePath, StorageError, TransferError,
    is_path_safe,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{
    ConnectionHandler, ConnectionStream, ListenerError, ListenerHandle, SocketListener,
};

#[cfg(test)]
mod tests;
