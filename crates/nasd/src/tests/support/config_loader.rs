//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::net::TcpListener;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use nas_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that places the storage root and a Unix listen socket under a
/// temporary directory.
#[derive(Debug)]
pub struct TestConfigLoader {
    dir: TempDir,
    backend: SocketEndpoint,
    pool_size: usize,
}

impl TestConfigLoader {
    /// Loader pointing at the given backend.
    #[must_use]
    pub fn new(backend: SocketEndpoint) -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary directory"),
            backend,
            pool_size: 2,
        }
    }

    /// Loader whose backend endpoint refuses connections.
    #[must_use]
    pub fn with_unreachable_backend() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("reserve port");
        let port = listener.local_addr().expect("reserved address").port();
        drop(listener);
        Self::new(SocketEndpoint::tcp("127.0.0.1", port))
    }

    /// Overrides the backend pool size.
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Storage root handed to the daemon.
    #[must_use]
    pub fn storage_root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join("files"))
            .expect("temporary path was not valid UTF-8")
    }

    /// Listen socket handed to the daemon.
    #[must_use]
    pub fn listen_socket(&self) -> SocketEndpoint {
        let path = self.dir.path().join("run").join("nasd.sock");
        SocketEndpoint::unix(
            Utf8PathBuf::from_path_buf(path).expect("temporary path was not valid UTF-8"),
        )
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen_socket: self.listen_socket(),
            backend_socket: self.backend.clone(),
            storage_root: self.storage_root(),
            backend_pool_size: self.pool_size,
            io_timeout_secs: 5,
            log_filter: "nasd=debug".to_owned(),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing an invalid endpoint on the
/// command line.
#[derive(Debug, Default)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("nasd"),
            OsString::from("--listen-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
