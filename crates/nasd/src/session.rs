//! Per-connection authentication state.

use camino::{Utf8Path, Utf8PathBuf};

use crate::storage::{DiskStorage, StorageError};

/// The identity a command acts as: a username and the storage root its files
/// live under.
///
/// Session commands obtain it from a prior login; transfer commands build it
/// from the credentials they carry. Handlers consume it the same way either
/// way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    username: String,
    storage_base: Utf8PathBuf,
}

impl Authority {
    /// Creates an authority for `username` under `storage_base`.
    #[must_use]
    pub fn new(username: impl Into<String>, storage_base: impl Into<Utf8PathBuf>) -> Self {
        Self {
            username: username.into(),
            storage_base: storage_base.into(),
        }
    }

    /// Authenticated username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The user's root directory.
    #[must_use]
    pub fn root_directory(&self) -> Utf8PathBuf {
        self.storage_base.join(&self.username)
    }

    /// Opens the user's storage, creating the root directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the root cannot be opened.
    pub fn open_storage(&self) -> Result<DiskStorage, StorageError> {
        DiskStorage::open_root(&self.storage_base, &self.username)
    }
}

/// Connection state; starts unauthenticated and only a successful login
/// changes it.
#[derive(Debug, Default)]
pub struct Session {
    authority: Option<Authority>,
}

impl Session {
    /// Creates an unauthenticated session.
    #[must_use]
    pub const fn new() -> Self {
        Self { authority: None }
    }

    /// Whether a login has succeeded on this connection.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authority.is_some()
    }

    /// Logged-in username, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.authority.as_ref().map(Authority::username)
    }

    /// Root directory of the logged-in user, if any.
    #[must_use]
    pub fn root_directory(&self) -> Option<Utf8PathBuf> {
        self.authority.as_ref().map(Authority::root_directory)
    }

    /// Authority of the logged-in user, if any.
    #[must_use]
    pub const fn authority(&self) -> Option<&Authority> {
        self.authority.as_ref()
    }

    /// Records a successful login, replacing any earlier one.
    pub fn authenticate(&mut self, username: &str, storage_base: &Utf8Path) {
        self.authority = Some(Authority::new(username, storage_base));
    }
}
