use std::io::{Read, Write};

use nas_protocol::{CommandId, Framed, Response, UPLOAD_READY};
use tracing::{debug, warn};

use super::{Outcome, arguments, entry_path, send, verify_credentials};
use crate::dispatch::errors::CommandError;
use crate::dispatch::router::DISPATCH_TARGET;
use crate::dispatch::services::Services;

/// `Upload(username, password, path, size)`.
///
/// Once every precondition holds the declared size stays reserved against
/// the user's quota until the transfer ends. The handler answers `ready`,
/// receives the data frames, and finishes with an acknowledgement carrying
/// the stored byte count.
pub(crate) fn upload<S: Read + Write>(
    services: &Services,
    args: &[String],
    framed: &mut Framed<S>,
) -> Result<Outcome, CommandError> {
    let [username, password, raw_path, raw_size] = arguments::<4>(CommandId::Upload, args)?;
    let authority = verify_credentials(services, CommandId::Upload, username, password)?;
    let size = raw_size
        .parse::<u64>()
        .map_err(|_| CommandError::InvalidSize {
            value: raw_size.clone(),
        })?;

    let storage = authority.open_storage()?;
    let allocated = services.directory().allocated_quota(authority.username())?;
    let used = storage.used_bytes()?;
    let reservation = services
        .ledger()
        .reserve(authority.username(), size, allocated, used)?;
    let path = entry_path(raw_path)?;

    send(framed, &Response::success(UPLOAD_READY))?;
    let acknowledgement = match storage.receive_upload(framed, &path, size) {
        Ok(stored) => Response::success(stored.to_string()),
        Err(error) if error.breaks_connection() => return Err(error.into()),
        Err(error) => {
            let failure = CommandError::from(error);
            warn!(
                target: DISPATCH_TARGET,
                username = authority.username(),
                path = %path.as_path(),
                error = %failure,
                "upload failed"
            );
            Response::failure(failure.diagnostic())
        }
    };
    drop(reservation);
    send(framed, &acknowledgement)?;
    debug!(
        target: DISPATCH_TARGET,
        username = authority.username(),
        path = %path.as_path(),
        bytes = size,
        success = acknowledgement.is_success(),
        "upload finished"
    );
    Ok(Outcome::Complete)
}

/// `Download(username, password, path)`: a size header followed by the
/// content as data frames.
pub(crate) fn download<S: Read + Write>(
    services: &Services,
    args: &[String],
    framed: &mut Framed<S>,
) -> Result<Outcome, CommandError> {
    let [username, password, raw_path] = arguments::<3>(CommandId::Download, args)?;
    let authority = verify_credentials(services, CommandId::Download, username, password)?;
    let path = entry_path(raw_path)?;
    let storage = authority.open_storage()?;
    match storage.send_download(framed, &path) {
        Ok(sent) => {
            debug!(
                target: DISPATCH_TARGET,
                username = authority.username(),
                path = %path.as_path(),
                bytes = sent,
                "download finished"
            );
            Ok(Outcome::Complete)
        }
        Err(error) => Err(error.into()),
    }
}
