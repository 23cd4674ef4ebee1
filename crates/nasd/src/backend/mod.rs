//! Client for the credential and quota backend.
//!
//! The backend speaks the same framed request/response protocol as the file
//! server. [`BackendClient`] owns one connection and performs strictly
//! sequential calls on it; [`BackendPool`] hands each call exclusive use of a
//! pooled client and implements the [`Directory`] capability the dispatcher
//! consumes.

mod client;
mod errors;
mod pool;

pub use self::client::BackendClient;
pub use self::errors::BackendError;
pub use self::pool::{BackendPool, Directory};

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend");
