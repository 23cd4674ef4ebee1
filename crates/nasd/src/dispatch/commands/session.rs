use nas_protocol::{CommandId, Response};

use super::{Outcome, arguments, session_authority, verify_credentials};
use crate::dispatch::errors::CommandError;
use crate::dispatch::router::DISPATCH_TARGET;
use crate::dispatch::services::Services;
use crate::session::Session;

/// Body of a successful login response.
pub(crate) const LOGIN_SUCCESS: &str = "success";

/// `Login(username, password)`: authenticates the session and ensures the
/// user's root directory exists.
pub(crate) fn login(
    services: &Services,
    session: &mut Session,
    args: &[String],
) -> Result<Outcome, CommandError> {
    let [username, password] = arguments::<2>(CommandId::Login, args)?;
    let authority = verify_credentials(services, CommandId::Login, username, password)?;
    let storage = authority.open_storage()?;
    session.authenticate(authority.username(), services.storage_base());
    tracing::info!(
        target: DISPATCH_TARGET,
        username = authority.username(),
        root = %storage.root_path(),
        "session authenticated"
    );
    Ok(Outcome::Respond(Response::success(LOGIN_SUCCESS)))
}

/// `Info()`: reports the bytes the logged-in user may still store.
pub(crate) fn info(
    services: &Services,
    session: &Session,
    args: &[String],
) -> Result<Outcome, CommandError> {
    let [] = arguments::<0>(CommandId::Info, args)?;
    let authority = session_authority(session, CommandId::Info)?;
    let storage = authority.open_storage()?;
    let allocated = services.directory().allocated_quota(authority.username())?;
    let used = storage.used_bytes()?;
    let remaining = services
        .ledger()
        .remaining(authority.username(), allocated, used);
    Ok(Outcome::Respond(Response::success(remaining.to_string())))
}
