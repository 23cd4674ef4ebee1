//! Socket listener for the daemon's client endpoint.
//!
//! The transport binds the configured TCP or Unix endpoint, accepts
//! connections on a background thread, and hands each accepted stream to a
//! [`ConnectionHandler`] on its own thread.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub use self::handler::{ConnectionHandler, ConnectionStream};
pub use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
