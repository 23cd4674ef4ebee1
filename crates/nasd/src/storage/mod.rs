//! Per-user file storage.
//!
//! Every user owns one directory under the configured storage root. All
//! operations go through a capability handle on that directory ([`cap_std`]),
//! so nothing can reach outside it even through symlinks. Client-supplied
//! paths are first normalised by [`SafePath::parse`], which rejects anything
//! that would climb above the user's root.

mod disk;
mod errors;
mod paths;
mod quota;

pub use self::disk::DiskStorage;
pub use self::errors::{StorageError, TransferError};
pub use self::paths::{SafePath, is_path_safe};
pub use self::quota::{QuotaExceeded, QuotaLedger, Reservation};

const STORAGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::storage");
