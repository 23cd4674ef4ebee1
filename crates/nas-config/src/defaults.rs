use std::env;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// TCP port the daemon listens on by default.
pub const DEFAULT_LISTEN_PORT: u16 = 9300;

/// TCP port of the credential backend by default.
pub const DEFAULT_BACKEND_PORT: u16 = 9301;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Idle backend connections kept for reuse.
pub const DEFAULT_BACKEND_POOL_SIZE: usize = 4;

/// Read/write deadline applied to client connections, in seconds.
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 300;

/// Largest frame the daemon accepts from a client.
pub const DEFAULT_MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Loopback endpoint the daemon listens on by default.
#[must_use]
pub fn default_listen_socket() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_LISTEN_PORT)
}

/// Loopback endpoint of the credential backend by default.
#[must_use]
pub fn default_backend_socket() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_BACKEND_PORT)
}

/// Base directory holding one subdirectory per user.
///
/// Resolves to `<data dir>/nas/files`, falling back to the temporary
/// directory when the platform reports no data directory.
#[must_use]
pub fn default_storage_root() -> Utf8PathBuf {
    let base = dirs::data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .or_else(|| Utf8PathBuf::from_path_buf(env::temp_dir()).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("/tmp"));
    base.join("nas").join("files")
}

/// Default number of idle backend connections.
#[must_use]
pub const fn default_backend_pool_size() -> usize {
    DEFAULT_BACKEND_POOL_SIZE
}

/// Default client I/O deadline in seconds.
#[must_use]
pub const fn default_io_timeout_secs() -> u64 {
    DEFAULT_IO_TIMEOUT_SECS
}

/// Default frame limit in bytes.
#[must_use]
pub const fn default_max_frame_bytes() -> u32 {
    DEFAULT_MAX_FRAME_BYTES
}
