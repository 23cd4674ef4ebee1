use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use nas_config::SocketEndpoint;

use super::{BACKEND_TARGET, BackendClient, BackendError};

/// Credential and quota lookups consumed by command handlers.
pub trait Directory: Send + Sync {
    /// Returns whether `password` is valid for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the lookup cannot be completed.
    fn check_credentials(&self, username: &str, password: &str) -> Result<bool, BackendError>;

    /// Returns the number of bytes `username` may store.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the lookup cannot be completed.
    fn allocated_quota(&self, username: &str) -> Result<u64, BackendError>;

    /// Registers a user; returns whether the backend accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the call cannot be completed.
    fn register_user(&self, username: &str, password: &str, quota: u64)
    -> Result<bool, BackendError>;
}

/// Pool of exclusive backend connections.
///
/// Each call checks out one idle client (or opens a new one), runs on it
/// alone, and returns it afterwards. Clients whose call failed at the
/// connection level are dropped instead of returned. At most `capacity` idle
/// clients are kept.
#[derive(Debug)]
pub struct BackendPool {
    endpoint: SocketEndpoint,
    capacity: usize,
    io_timeout: Option<Duration>,
    idle: Mutex<Vec<BackendClient>>,
}

impl BackendPool {
    /// Connects once to verify the backend is reachable and keeps that
    /// connection as the first idle client. Every client the pool opens uses
    /// `io_timeout` for its reads and writes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Connect`] when the backend is unreachable.
    pub fn connect(
        endpoint: SocketEndpoint,
        capacity: usize,
        io_timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let first = BackendClient::connect(&endpoint, io_timeout)?;
        let kept = capacity.max(1);
        let mut idle = Vec::with_capacity(kept);
        idle.push(first);
        Ok(Self {
            endpoint,
            capacity: kept,
            io_timeout,
            idle: Mutex::new(idle),
        })
    }

    /// Number of idle clients currently pooled.
    #[must_use]
    pub fn idle_len(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs `call` with exclusive use of one client.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `call`, or [`BackendError::Connect`] when
    /// no idle client exists and a new one cannot be opened.
    pub fn with_client<T>(
        &self,
        call: impl FnOnce(&mut BackendClient) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut client = self.checkout()?;
        let result = call(&mut client);
        match &result {
            Err(error) if error.is_connection_failure() => {
                warn!(
                    target: BACKEND_TARGET,
                    endpoint = %self.endpoint,
                    error = %error,
                    "discarding backend connection"
                );
            }
            _ => self.checkin(client),
        }
        result
    }

    fn checkout(&self) -> Result<BackendClient, BackendError> {
        let pooled = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
        match pooled {
            Some(client) => Ok(client),
            None => {
                debug!(target: BACKEND_TARGET, endpoint = %self.endpoint, "pool empty, connecting");
                BackendClient::connect(&self.endpoint, self.io_timeout)
            }
        }
    }

    fn checkin(&self, client: BackendClient) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(client);
        }
    }
}

impl Directory for BackendPool {
    fn check_credentials(&self, username: &str, password: &str) -> Result<bool, BackendError> {
        self.with_client(|client| client.check_credentials(username, password))
    }

    fn allocated_quota(&self, username: &str) -> Result<u64, BackendError> {
        self.with_client(|client| client.get_allocated_quota(username))
    }

    fn register_user(
        &self,
        username: &str,
        password: &str,
        quota: u64,
    ) -> Result<bool, BackendError> {
        self.with_client(|client| client.register_user(username, password, quota))
    }
}
