use nas_protocol::{CommandId, Response};

use super::{Outcome, arguments, directory_path, entry_path, session_authority};
use crate::dispatch::errors::CommandError;
use crate::session::Session;

/// `CreateDirectory(path)`: creates the directory and any missing parents.
pub(crate) fn create_directory(
    session: &Session,
    args: &[String],
) -> Result<Outcome, CommandError> {
    let [raw] = arguments::<1>(CommandId::CreateDirectory, args)?;
    let authority = session_authority(session, CommandId::CreateDirectory)?;
    let path = entry_path(raw)?;
    authority.open_storage()?.create_directory(&path)?;
    Ok(Outcome::empty())
}

/// `Remove(path)`: deletes a file or a whole directory tree.
pub(crate) fn remove(session: &Session, args: &[String]) -> Result<Outcome, CommandError> {
    let [raw] = arguments::<1>(CommandId::Remove, args)?;
    let authority = session_authority(session, CommandId::Remove)?;
    let path = entry_path(raw)?;
    authority.open_storage()?.delete(&path)?;
    Ok(Outcome::empty())
}

/// `Rename(old, new)`: both paths must be safe.
pub(crate) fn rename(session: &Session, args: &[String]) -> Result<Outcome, CommandError> {
    let [old, new] = arguments::<2>(CommandId::Rename, args)?;
    let authority = session_authority(session, CommandId::Rename)?;
    let from = entry_path(old)?;
    let to = entry_path(new)?;
    authority.open_storage()?.rename(&from, &to)?;
    Ok(Outcome::empty())
}

/// `List(path)`: responds with the serialised directory listing.
pub(crate) fn list(session: &Session, args: &[String]) -> Result<Outcome, CommandError> {
    let [raw] = arguments::<1>(CommandId::List, args)?;
    let authority = session_authority(session, CommandId::List)?;
    let path = directory_path(raw)?;
    let listing = authority.open_storage()?.list_directory(&path)?;
    Ok(Outcome::Respond(Response::success(listing.to_bytes()?)))
}
