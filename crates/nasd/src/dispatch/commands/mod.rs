//! Command handlers.
//!
//! Every handler validates its argument count before anything else, then
//! resolves an [`Authority`]: from the session for session commands, or from
//! the credentials carried by transfer commands. The remaining preconditions
//! run in a fixed order (size, quota, path) before any side effect.

mod files;
mod session;
mod transfer;

use std::io::Write;

use nas_protocol::{CommandId, Framed, Response};

use super::errors::{CommandError, ConnectionError};
use super::services::Services;
use crate::session::{Authority, Session};
use crate::storage::SafePath;

pub(super) use self::files::{create_directory, list, remove, rename};
pub(super) use self::session::{info, login};
pub(super) use self::transfer::{download, upload};

/// What the router still has to do after a handler returns.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Send this response.
    Respond(Response),
    /// The handler already wrote its response (transfers).
    Complete,
}

impl Outcome {
    fn empty() -> Self {
        Self::Respond(Response::success(Vec::new()))
    }
}

/// Borrows the arguments as a fixed-size array, or fails with
/// [`CommandError::InvalidArguments`].
fn arguments<const N: usize>(
    command: CommandId,
    arguments: &[String],
) -> Result<&[String; N], CommandError> {
    <&[String; N]>::try_from(arguments).map_err(|_| CommandError::InvalidArguments {
        command,
        expected: N,
        received: arguments.len(),
    })
}

fn session_authority(session: &Session, command: CommandId) -> Result<&Authority, CommandError> {
    session
        .authority()
        .ok_or(CommandError::Unauthenticated { command })
}

/// Checks per-request credentials. `Login` reports a rejected pair as
/// invalid credentials; transfer commands report it as unauthenticated.
fn verify_credentials(
    services: &Services,
    command: CommandId,
    username: &str,
    password: &str,
) -> Result<Authority, CommandError> {
    if services.directory().check_credentials(username, password)? {
        return Ok(Authority::new(username, services.storage_base()));
    }
    Err(match command {
        CommandId::Login => CommandError::InvalidCredentials {
            username: username.to_owned(),
        },
        _ => CommandError::Unauthenticated { command },
    })
}

/// Resolves a path that must name something below the root.
fn entry_path(raw: &str) -> Result<SafePath, CommandError> {
    SafePath::parse(raw)
        .filter(|path| !path.is_root())
        .ok_or_else(|| CommandError::BadPath {
            path: raw.to_owned(),
        })
}

/// Resolves a directory path; the root itself is allowed.
fn directory_path(raw: &str) -> Result<SafePath, CommandError> {
    SafePath::parse(raw).ok_or_else(|| CommandError::BadPath {
        path: raw.to_owned(),
    })
}

pub(super) fn send<S: Write>(
    framed: &mut Framed<S>,
    response: &Response,
) -> Result<(), ConnectionError> {
    let payload = response.encode().map_err(ConnectionError::Encode)?;
    framed.write_frame(&payload)?;
    Ok(())
}
