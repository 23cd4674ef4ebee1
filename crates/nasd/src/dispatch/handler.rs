//! Connection handler that runs the command loop.
//!
//! Each connection owns a [`Session`] and reads one request frame at a time.
//! The router answers every request before the next frame is read. A frame
//! that fails to decode is answered with `malformed request` and the loop
//! continues; a clean close between frames ends the loop quietly, and any
//! stream failure ends it with a warning.

use std::io::{Read, Write};
use std::time::Duration;

use nas_protocol::{FrameCodec, Framed, Request};
use tracing::{debug, warn};

use crate::session::Session;
use crate::transport::{ConnectionHandler, ConnectionStream};

use super::errors::{CommandError, ConnectionError};
use super::router::{CommandRouter, DISPATCH_TARGET};
use super::services::Services;

/// Connection handler that dispatches framed commands.
#[derive(Debug)]
pub struct DispatchConnectionHandler {
    router: CommandRouter,
    codec: FrameCodec,
    io_timeout: Option<Duration>,
}

impl DispatchConnectionHandler {
    /// Creates a handler over the shared services.
    #[must_use]
    pub const fn new(
        services: Services,
        max_frame_bytes: u32,
        io_timeout: Option<Duration>,
    ) -> Self {
        Self {
            router: CommandRouter::new(services),
            codec: FrameCodec::with_max_len(max_frame_bytes),
            io_timeout,
        }
    }

    /// Shared services.
    #[must_use]
    pub const fn services(&self) -> &Services {
        self.router.services()
    }

    /// Runs the command loop until the peer disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the stream fails or a transfer loses
    /// sync with the peer.
    pub fn serve<S: Read + Write>(&self, framed: &mut Framed<S>) -> Result<(), ConnectionError> {
        let mut session = Session::new();
        while let Some(frame) = framed.read_frame()? {
            match Request::decode(&frame) {
                Ok(request) => self.router.route(&mut session, &request, framed)?,
                Err(error) => self
                    .router
                    .reject(framed, CommandError::MalformedRequest(error))?,
            }
        }
        debug!(
            target: DISPATCH_TARGET,
            username = session.username(),
            "client disconnected"
        );
        Ok(())
    }

    fn dispatch(&self, stream: ConnectionStream) {
        if let Err(error) = stream.set_io_timeout(self.io_timeout) {
            warn!(target: DISPATCH_TARGET, %error, "failed to apply connection timeout");
        }
        let mut framed = Framed::with_codec(stream, self.codec);
        if let Err(error) = self.serve(&mut framed) {
            if error.is_timeout() {
                debug!(target: DISPATCH_TARGET, %error, "connection timed out");
            } else {
                warn!(target: DISPATCH_TARGET, %error, "connection failed");
            }
        }
        if let Err(error) = framed.get_ref().shutdown() {
            debug!(target: DISPATCH_TARGET, %error, "connection already closed");
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}
