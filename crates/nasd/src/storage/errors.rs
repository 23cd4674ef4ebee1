use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use nas_protocol::{FrameError, MessageError};

/// Errors raised by local file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The username cannot name a directory under the storage root.
    #[error("username {username:?} cannot be used as a storage directory")]
    InvalidUsername {
        /// Rejected username.
        username: String,
    },
    /// Creating or opening a user's root directory failed.
    #[error("failed to open storage root {path}: {source}")]
    OpenRoot {
        /// Root directory.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: io::Error,
    },
    /// A file operation failed.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        /// Operation being attempted.
        operation: &'static str,
        /// Path relative to the user's root.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: io::Error,
    },
    /// The target of a download is not a regular file.
    #[error("{path} is not a regular file")]
    NotAFile {
        /// Path relative to the user's root.
        path: Utf8PathBuf,
    },
}

impl StorageError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<Utf8PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while streaming file content over a connection.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The local side failed before any transfer framing was committed, or
    /// while writing received bytes that were still drained from the stream.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Reading or writing a data frame failed.
    #[error("transfer stream failed: {0}")]
    Stream(#[from] FrameError),
    /// The opening response could not be encoded.
    #[error("failed to encode transfer response: {0}")]
    Message(#[from] MessageError),
    /// The peer closed the connection before the declared size arrived.
    #[error("peer closed the connection with {remaining} bytes outstanding")]
    Closed {
        /// Bytes still expected.
        remaining: u64,
    },
    /// A data frame carried more bytes than were still expected.
    #[error("data frame of {len} bytes exceeds the {remaining} bytes outstanding")]
    Overrun {
        /// Frame length.
        len: u64,
        /// Bytes still expected.
        remaining: u64,
    },
    /// The source file failed or shrank after its size was announced.
    #[error("download of {path} stopped after {sent} of {size} bytes: {source}")]
    SourceFailed {
        /// Path relative to the user's root.
        path: Utf8PathBuf,
        /// Bytes already sent.
        sent: u64,
        /// Announced size.
        size: u64,
        /// Read error.
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Returns true when the connection's framing can no longer be trusted and
    /// the connection must be closed.
    #[must_use]
    pub const fn breaks_connection(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
