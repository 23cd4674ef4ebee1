//! Layered configuration for the NAS daemon.
//!
//! Values are merged from built-in defaults, an optional TOML file
//! (`--config-path` or `NAS_CONFIG_PATH`), `NAS_*` environment variables, and
//! command-line flags, with later sources taking precedence. Loading is
//! delegated to [`ortho_config`], which aggregates failures from every source
//! into a single [`ortho_config::OrthoError`].

mod defaults;
mod logging;
mod socket;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_BACKEND_POOL_SIZE, DEFAULT_BACKEND_PORT, DEFAULT_IO_TIMEOUT_SECS, DEFAULT_LISTEN_PORT,
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, default_backend_pool_size, default_backend_socket,
    default_io_timeout_secs, default_listen_socket, default_log_filter, default_log_filter_string,
    default_log_format, default_max_frame_bytes, default_storage_root,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NAS")]
pub struct Config {
    /// Endpoint the daemon accepts client connections on.
    #[ortho_config(default = default_listen_socket())]
    pub listen_socket: SocketEndpoint,
    /// Endpoint of the credential and quota backend.
    #[ortho_config(default = default_backend_socket())]
    pub backend_socket: SocketEndpoint,
    /// Base directory holding one subdirectory per user.
    #[ortho_config(default = default_storage_root())]
    pub storage_root: Utf8PathBuf,
    /// Idle backend connections kept for reuse.
    #[ortho_config(default = default_backend_pool_size())]
    pub backend_pool_size: usize,
    /// Read/write deadline for client connections in seconds; zero disables it.
    #[ortho_config(default = default_io_timeout_secs())]
    pub io_timeout_secs: u64,
    /// Largest frame accepted from a client.
    #[ortho_config(default = default_max_frame_bytes())]
    pub max_frame_bytes: u32,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_listen_socket(),
            backend_socket: default_backend_socket(),
            storage_root: default_storage_root(),
            backend_pool_size: default_backend_pool_size(),
            io_timeout_secs: default_io_timeout_secs(),
            max_frame_bytes: default_max_frame_bytes(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint the daemon listens on.
    #[must_use]
    pub const fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Endpoint of the credential backend.
    #[must_use]
    pub const fn backend_socket(&self) -> &SocketEndpoint {
        &self.backend_socket
    }

    /// Base directory for per-user storage.
    #[must_use]
    pub fn storage_root(&self) -> &Utf8Path {
        self.storage_root.as_path()
    }

    /// Idle backend connections kept for reuse.
    #[must_use]
    pub const fn backend_pool_size(&self) -> usize {
        self.backend_pool_size
    }

    /// Client I/O deadline; `None` when disabled.
    #[must_use]
    pub const fn io_timeout(&self) -> Option<Duration> {
        if self.io_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.io_timeout_secs))
        }
    }

    /// Largest frame accepted from a client.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> u32 {
        self.max_frame_bytes
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Checks invariants that individual field types cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty storage root, a zero pool size, or
    /// a zero frame limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_root.as_str().trim().is_empty() {
            return Err(ConfigError::EmptyStorageRoot);
        }
        if self.backend_pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::ZeroFrameLimit);
        }
        Ok(())
    }
}

/// Invariant violations detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `storage_root` was empty.
    #[error("storage_root must not be empty")]
    EmptyStorageRoot,
    /// `backend_pool_size` was zero.
    #[error("backend_pool_size must be at least 1")]
    ZeroPoolSize,
    /// `max_frame_bytes` was zero.
    #[error("max_frame_bytes must be at least 1")]
    ZeroFrameLimit,
}

impl ConfigError {
    /// Configuration key the error refers to.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::EmptyStorageRoot => "storage_root",
            Self::ZeroPoolSize => "backend_pool_size",
            Self::ZeroFrameLimit => "max_frame_bytes",
        }
    }
}
