use std::io;

use thiserror::Error;

use nas_protocol::{BackendCommand, FrameError, MessageError};

/// Errors surfaced by backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("failed to connect to backend at {endpoint}: {source}")]
    Connect {
        /// Configured backend endpoint.
        endpoint: String,
        /// Connect error.
        #[source]
        source: io::Error,
    },
    /// Reading or writing a frame failed.
    #[error("backend connection failed: {0}")]
    Frame(#[from] FrameError),
    /// The backend closed the connection instead of answering.
    #[error("backend closed the connection during {command}")]
    Closed {
        /// Call in flight.
        command: BackendCommand,
    },
    /// A request or response could not be encoded or decoded.
    #[error("malformed backend exchange: {0}")]
    Message(#[from] MessageError),
    /// The backend answered a call with a failure status.
    #[error("backend rejected {command}: {message}")]
    Rejected {
        /// Rejected call.
        command: BackendCommand,
        /// Diagnostic returned by the backend.
        message: String,
    },
    /// A quota body was not a decimal byte count.
    #[error("backend returned a non-numeric quota: {body:?}")]
    InvalidQuota {
        /// Body as received.
        body: String,
    },
}

impl BackendError {
    /// Returns true when the connection that produced this error can no longer
    /// be trusted for further calls.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Frame(_) | Self::Closed { .. } | Self::Message(_)
        )
    }
}
