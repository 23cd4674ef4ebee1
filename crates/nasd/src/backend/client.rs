use std::io::{Read, Write};
use std::time::Duration;

use tracing::debug;

use nas_config::SocketEndpoint;
use nas_protocol::{BackendCommand, Framed, Request, Response, Status};

use super::{BACKEND_TARGET, BackendError};
use crate::transport::ConnectionStream;

/// One connection to the backend.
///
/// Calls are strictly request-then-response and take `&mut self`, so a client
/// can never be used by two callers at once.
#[derive(Debug)]
pub struct BackendClient<S = ConnectionStream> {
    framed: Framed<S>,
}

impl BackendClient<ConnectionStream> {
    /// Connects to the backend at `endpoint`. Reads and writes on the
    /// connection give up after `io_timeout`; `None` waits forever.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Connect`] when the backend is unreachable or
    /// the timeout cannot be applied.
    pub fn connect(
        endpoint: &SocketEndpoint,
        io_timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let connect_error = |source| BackendError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };
        let stream = ConnectionStream::connect(endpoint).map_err(connect_error)?;
        stream.set_io_timeout(io_timeout).map_err(connect_error)?;
        debug!(target: BACKEND_TARGET, %endpoint, ?io_timeout, "backend connection opened");
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> BackendClient<S> {
    /// Wraps an established stream.
    #[must_use]
    pub const fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream),
        }
    }

    /// Asks whether `password` is valid for `username`.
    ///
    /// A success status whose body starts with byte `1` means the credentials
    /// match; any other success body means they do not.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] on connection failure or a failure status.
    pub fn check_credentials(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<bool, BackendError> {
        let reply = self.call(BackendCommand::CheckCredentials, [username, password])?;
        let response = expect_success(BackendCommand::CheckCredentials, reply)?;
        Ok(response.body().first() == Some(&1))
    }

    /// Fetches the number of bytes `username` may store.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidQuota`] when the body is not a decimal
    /// integer, or another [`BackendError`] on failure.
    pub fn get_allocated_quota(&mut self, username: &str) -> Result<u64, BackendError> {
        let reply = self.call(BackendCommand::GetAllocatedQuota, [username])?;
        let response = expect_success(BackendCommand::GetAllocatedQuota, reply)?;
        let body = response.body_text();
        body.trim()
            .parse()
            .map_err(|_| BackendError::InvalidQuota { body })
    }

    /// Registers a new user with the given allocation. Returns whether the
    /// backend accepted the registration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] on connection failure.
    pub fn register_user(
        &mut self,
        username: &str,
        password: &str,
        quota: u64,
    ) -> Result<bool, BackendError> {
        let allocation = quota.to_string();
        let response = self.call(
            BackendCommand::AddUser,
            [username, password, allocation.as_str()],
        )?;
        Ok(response.status() == Status::Success)
    }

    /// Consumes the client and returns the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }

    fn call<const N: usize>(
        &mut self,
        command: BackendCommand,
        arguments: [&str; N],
    ) -> Result<Response, BackendError> {
        let payload = Request::new(command, arguments).encode()?;
        self.framed.write_frame(&payload)?;
        let reply = self
            .framed
            .read_frame()?
            .ok_or(BackendError::Closed { command })?;
        let response = Response::decode(&reply)?;
        debug!(
            target: BACKEND_TARGET,
            %command,
            status = ?response.status(),
            "backend call completed"
        );
        Ok(response)
    }
}

fn expect_success(command: BackendCommand, response: Response) -> Result<Response, BackendError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(BackendError::Rejected {
            command,
            message: response.body_text(),
        })
    }
}
