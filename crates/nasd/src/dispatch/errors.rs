//! Error types for command dispatch.
//!
//! [`CommandError`] covers every way a single command can fail. Each variant
//! maps to the short diagnostic sent back in the failure response; internal
//! detail stays in the logs. [`ConnectionError`] is the one variant family
//! that ends the connection instead of producing a response.

use thiserror::Error;

use nas_protocol::{CommandId, FrameError, ListingError, MessageError, UnknownCommand};

use crate::backend::BackendError;
use crate::storage::{QuotaExceeded, StorageError, TransferError};

/// Failure of a single command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The request carried the wrong number of arguments.
    #[error("{command} expects {expected} arguments, received {received}")]
    InvalidArguments {
        /// Command being dispatched.
        command: CommandId,
        /// Required argument count.
        expected: usize,
        /// Supplied argument count.
        received: usize,
    },
    /// The command requires a prior login on this connection.
    #[error("{command} requires an authenticated session")]
    Unauthenticated {
        /// Command being dispatched.
        command: CommandId,
    },
    /// The backend rejected the supplied credentials.
    #[error("credentials rejected for {username:?}")]
    InvalidCredentials {
        /// Username from the request.
        username: String,
    },
    /// A path argument would leave the user's root or names the root where a
    /// file or directory is required.
    #[error("path {path:?} is not allowed")]
    BadPath {
        /// Path as supplied by the client.
        path: String,
    },
    /// The declared upload size does not fit in the remaining quota.
    #[error(transparent)]
    QuotaExceeded(#[from] QuotaExceeded),
    /// The declared upload size is not a decimal byte count.
    #[error("upload size {value:?} is not a decimal byte count")]
    InvalidSize {
        /// Size as supplied by the client.
        value: String,
    },
    /// The request named a command outside the command table.
    #[error(transparent)]
    UnknownCommand(#[from] UnknownCommand),
    /// The request frame could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] MessageError),
    /// The credential backend failed.
    #[error("backend call failed: {0}")]
    Backend(#[from] BackendError),
    /// A local file operation failed.
    #[error("storage operation failed: {0}")]
    Storage(#[from] StorageError),
    /// A directory listing could not be serialised.
    #[error("failed to serialise listing: {0}")]
    Listing(#[from] ListingError),
    /// The connection itself failed; no response can be sent.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl CommandError {
    /// Diagnostic text sent in the failure response.
    #[must_use]
    pub const fn diagnostic(&self) -> &'static str {
        match self {
            Self::InvalidArguments { .. } => "invalid number of arguments",
            Self::Unauthenticated { .. } => "user is not authenticated",
            Self::InvalidCredentials { .. } => "invalid username or password",
            Self::BadPath { .. } => "bad path",
            Self::QuotaExceeded(_) => "no memory for the upload",
            Self::InvalidSize { .. } => "invalid size",
            Self::UnknownCommand(_) => "unknown command",
            Self::MalformedRequest(_) => "malformed request",
            Self::Backend(_) | Self::Storage(_) | Self::Listing(_) | Self::Connection(_) => {
                "internal error"
            }
        }
    }

    /// Returns true for failures on the server side rather than in the
    /// client's request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Storage(_) | Self::Listing(_) | Self::Connection(_)
        )
    }
}

/// Failure of the client connection; ends the dispatch loop.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Reading or writing a frame failed.
    #[error("connection stream failed: {0}")]
    Frame(#[from] FrameError),
    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[source] MessageError),
    /// A file transfer lost sync with the peer.
    #[error("transfer aborted: {0}")]
    Transfer(#[source] TransferError),
}

impl From<TransferError> for CommandError {
    fn from(error: TransferError) -> Self {
        match error {
            TransferError::Storage(source) => Self::Storage(source),
            broken => Self::Connection(ConnectionError::Transfer(broken)),
        }
    }
}

impl ConnectionError {
    /// Returns true when the failure was a read or write timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Frame(error) | Self::Transfer(TransferError::Stream(error)) => error.is_timeout(),
            Self::Encode(_) | Self::Transfer(_) => false,
        }
    }
}
