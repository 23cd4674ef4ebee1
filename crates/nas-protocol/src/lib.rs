//! Wire protocol shared by the NAS daemon, its clients, and the credential
//! backend.
//!
//! Every exchange is a sequence of length-prefixed frames on a byte stream.
//! A frame carries either an encoded [`Request`] (command identifier plus
//! ordered string arguments) or an encoded [`Response`] (status byte plus an
//! opaque body). Requests and responses strictly alternate on a connection,
//! starting with a request.
//!
//! The crate is split into three layers:
//!
//! - [`frame`]: reading and writing single frames on any `Read`/`Write`
//!   stream, with an optional size limit.
//! - [`message`]: the typed request/response model and its byte encoding.
//! - [`command`] and [`listing`]: the stable command identifiers for the file
//!   server and the backend, and the serialized directory listing format.
//!
//! # Example
//!
//! ```
//! use nas_protocol::{CommandId, Request};
//!
//! let request = Request::new(CommandId::Login, ["alice", "secret"]);
//! let bytes = request.encode().expect("encode request");
//! let decoded = Request::decode(&bytes).expect("decode request");
//! assert_eq!(decoded, request);
//! assert_eq!(decoded.command(), Ok(CommandId::Login));
//! ```

pub mod command;
pub mod frame;
pub mod listing;
pub mod message;

pub use command::{BackendCommand, CommandId, UnknownCommand};
pub use frame::{FrameCodec, FrameError, Framed};
pub use listing::{DirectoryEntry, DirectoryListing, EntryKind, ListingError};
pub use message::{MessageError, Request, Response, Status};

/// Largest payload carried by a single data frame during uploads and
/// downloads.
pub const TRANSFER_CHUNK_BYTES: usize = 64 * 1024;

/// Body of the success response that opens an upload transfer.
pub const UPLOAD_READY: &str = "ready";
