//! Command routing.
//!
//! The router maps a decoded request to its handler and guarantees that every
//! command is answered by exactly one response before the next frame is read.
//! Handler failures become failure responses; only connection failures
//! escape to the dispatch loop.

use std::io::{Read, Write};

use nas_protocol::{CommandId, Framed, Request, Response};
use tracing::{debug, warn};

use super::commands::{self, Outcome};
use super::errors::{CommandError, ConnectionError};
use super::services::Services;
use crate::session::Session;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes requests to command handlers.
#[derive(Debug)]
pub struct CommandRouter {
    services: Services,
}

impl CommandRouter {
    /// Creates a router over the shared services.
    #[must_use]
    pub const fn new(services: Services) -> Self {
        Self { services }
    }

    /// Shared services.
    #[must_use]
    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// Executes one request and writes its response.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the connection can no longer be used.
    pub fn route<S: Read + Write>(
        &self,
        session: &mut Session,
        request: &Request,
        framed: &mut Framed<S>,
    ) -> Result<(), ConnectionError> {
        let result = match request.command() {
            Ok(command) => {
                debug!(
                    target: DISPATCH_TARGET,
                    command = command.as_str(),
                    arguments = request.arguments().len(),
                    authenticated = session.is_authenticated(),
                    "routing command"
                );
                self.dispatch(command, session, request.arguments(), framed)
            }
            Err(unknown) => Err(unknown.into()),
        };
        match result {
            Ok(Outcome::Respond(response)) => commands::send(framed, &response),
            Ok(Outcome::Complete) => Ok(()),
            Err(error) => self.reject(framed, error),
        }
    }

    /// Answers a failed command with its diagnostic.
    ///
    /// # Errors
    ///
    /// Returns the connection failure itself, or any failure writing the
    /// response.
    pub fn reject<S: Write>(
        &self,
        framed: &mut Framed<S>,
        error: CommandError,
    ) -> Result<(), ConnectionError> {
        if let CommandError::Connection(failure) = error {
            return Err(failure);
        }
        if error.is_internal() {
            warn!(target: DISPATCH_TARGET, error = %error, "command failed");
        } else {
            debug!(target: DISPATCH_TARGET, error = %error, "command rejected");
        }
        commands::send(framed, &Response::failure(error.diagnostic()))
    }

    fn dispatch<S: Read + Write>(
        &self,
        command: CommandId,
        session: &mut Session,
        args: &[String],
        framed: &mut Framed<S>,
    ) -> Result<Outcome, CommandError> {
        let services = &self.services;
        match command {
            CommandId::Upload => commands::upload(services, args, framed),
            CommandId::Download => commands::download(services, args, framed),
            CommandId::CreateDirectory => commands::create_directory(session, args),
            CommandId::Remove => commands::remove(session, args),
            CommandId::Rename => commands::rename(session, args),
            CommandId::Login => commands::login(services, session, args),
            CommandId::List => commands::list(session, args),
            CommandId::Info => commands::info(services, session, args),
        }
    }
}
