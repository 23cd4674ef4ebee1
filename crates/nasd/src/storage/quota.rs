//! Per-user reservations for in-flight uploads.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// A declared upload does not fit in the user's remaining allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("upload of {declared} bytes exceeds the {remaining} bytes remaining")]
pub struct QuotaExceeded {
    /// Bytes the client declared.
    pub declared: u64,
    /// Bytes still available after existing reservations.
    pub remaining: u64,
}

/// Process-wide record of bytes promised to uploads that have not finished.
///
/// The check and the reservation happen under one lock, so two concurrent
/// uploads for the same user cannot both claim the same free space.
#[derive(Debug, Default)]
pub struct QuotaLedger {
    reserved: Mutex<HashMap<String, u64>>,
}

impl QuotaLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently reserved for `username`.
    #[must_use]
    pub fn reserved(&self, username: &str) -> u64 {
        self.lock().get(username).copied().unwrap_or(0)
    }

    /// Remaining allocation once stored bytes and reservations are deducted.
    /// Never negative.
    #[must_use]
    pub fn remaining(&self, username: &str, allocated: u64, used: u64) -> u64 {
        allocated
            .saturating_sub(used)
            .saturating_sub(self.reserved(username))
    }

    /// Reserves `declared` bytes for `username` if they fit.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaExceeded`] when `declared` is larger than the remaining
    /// allocation.
    pub fn reserve(
        &self,
        username: &str,
        declared: u64,
        allocated: u64,
        used: u64,
    ) -> Result<Reservation<'_>, QuotaExceeded> {
        let mut reserved = self.lock();
        let held = reserved.get(username).copied().unwrap_or(0);
        let remaining = allocated.saturating_sub(used).saturating_sub(held);
        if declared > remaining {
            return Err(QuotaExceeded {
                declared,
                remaining,
            });
        }
        reserved.insert(username.to_owned(), held.saturating_add(declared));
        Ok(Reservation {
            ledger: self,
            username: username.to_owned(),
            bytes: declared,
        })
    }

    fn release(&self, username: &str, bytes: u64) {
        let mut reserved = self.lock();
        if let Some(held) = reserved.get_mut(username) {
            *held = held.saturating_sub(bytes);
            if *held == 0 {
                reserved.remove(username);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
        self.reserved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bytes held for one upload; released when dropped.
#[derive(Debug)]
#[must_use = "dropping a reservation releases it immediately"]
pub struct Reservation<'a> {
    ledger: &'a QuotaLedger,
    username: String,
    bytes: u64,
}

impl Reservation<'_> {
    /// Reserved byte count.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.ledger.release(&self.username, self.bytes);
    }
}
