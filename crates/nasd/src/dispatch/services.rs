use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::backend::Directory;
use crate::storage::QuotaLedger;

/// Process-wide collaborators shared by every connection.
pub struct Services {
    directory: Arc<dyn Directory>,
    ledger: QuotaLedger,
    storage_base: Utf8PathBuf,
}

impl Services {
    /// Wires the credential directory and the base path holding every user's
    /// root directory.
    #[must_use]
    pub fn new(directory: Arc<dyn Directory>, storage_base: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory,
            ledger: QuotaLedger::new(),
            storage_base: storage_base.into(),
        }
    }

    /// Credential and quota lookups.
    #[must_use]
    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    /// Reservations held by in-flight uploads.
    #[must_use]
    pub const fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    /// Directory containing one root per user.
    #[must_use]
    pub fn storage_base(&self) -> &Utf8Path {
        &self.storage_base
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Services")
            .field("ledger", &self.ledger)
            .field("storage_base", &self.storage_base)
            .finish_non_exhaustive()
    }
}
