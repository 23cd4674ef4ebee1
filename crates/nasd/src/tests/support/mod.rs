//! Shared fixtures for the daemon's unit and behavioural suites.

mod backend;
mod config_loader;
mod directory;
mod duplex;
mod reporter;
mod world;

pub use backend::StubBackend;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use directory::{MockAccounts, accounts};
pub use duplex::{Duplex, decode_response, request_frame};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
