//! Serialized directory listings returned by the `List` command.
//!
//! The body of a successful `List` response is a JSON array of entries, each
//! carrying a name, a byte size, and a kind. Entries are sorted by name so the
//! encoding is stable for a given directory state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory; its size is always reported as zero.
    Directory,
}

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Entry name relative to the listed directory.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Entry kind.
    pub kind: EntryKind,
}

impl DirectoryEntry {
    /// Creates a file entry.
    #[must_use]
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            kind: EntryKind::File,
        }
    }

    /// Creates a directory entry.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            kind: EntryKind::Directory,
        }
    }
}

/// Errors raised while encoding or decoding a listing.
#[derive(Debug, Error)]
#[error("invalid directory listing: {0}")]
pub struct ListingError(#[from] serde_json::Error);

/// Sorted collection of directory entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryListing {
    entries: Vec<DirectoryEntry>,
}

impl DirectoryListing {
    /// Builds a listing, sorting entries by name.
    #[must_use]
    pub fn new(mut entries: Vec<DirectoryEntry>) -> Self {
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Self { entries }
    }

    /// Returns the entries in name order.
    #[must_use]
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Looks up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Encodes the listing as a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ListingError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a listing from a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] if the body is not a valid listing.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ListingError> {
        let listing: Self = serde_json::from_slice(bytes)?;
        Ok(Self::new(listing.entries))
    }
}
