//! Stable command identifiers.
//!
//! The numeric values are part of the wire format and must never be
//! renumbered.

use std::fmt;

use thiserror::Error;

/// Commands understood by the file server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    /// Store a file under the caller's root (credentials in the arguments).
    Upload = 0,
    /// Stream a file back to the caller (credentials in the arguments).
    Download = 1,
    /// Create a directory, including missing parents.
    CreateDirectory = 2,
    /// Remove a file or a directory tree.
    Remove = 3,
    /// Move or rename a file or directory.
    Rename = 4,
    /// Authenticate the connection.
    Login = 5,
    /// List the entries of a directory.
    List = 6,
    /// Report the caller's remaining quota.
    Info = 7,
}

impl CommandId {
    /// Every command in identifier order.
    pub const ALL: [Self; 8] = [
        Self::Upload,
        Self::Download,
        Self::CreateDirectory,
        Self::Remove,
        Self::Rename,
        Self::Login,
        Self::List,
        Self::Info,
    ];

    /// Returns the wire identifier.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns the canonical lower-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::CreateDirectory => "create-directory",
            Self::Remove => "remove",
            Self::Rename => "rename",
            Self::Login => "login",
            Self::List => "list",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<CommandId> for u8 {
    fn from(command: CommandId) -> Self {
        command.id()
    }
}

/// Raised when a request carries an identifier outside the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown command identifier {0}")]
pub struct UnknownCommand(pub u8);

impl TryFrom<u8> for CommandId {
    type Error = UnknownCommand;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Upload),
            1 => Ok(Self::Download),
            2 => Ok(Self::CreateDirectory),
            3 => Ok(Self::Remove),
            4 => Ok(Self::Rename),
            5 => Ok(Self::Login),
            6 => Ok(Self::List),
            7 => Ok(Self::Info),
            other => Err(UnknownCommand(other)),
        }
    }
}

/// Commands understood by the credential and quota backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BackendCommand {
    /// `(username, password)`; success body byte `1` means the pair matches.
    CheckCredentials = 0,
    /// `(username)`; success body is the allocation as a decimal string.
    GetAllocatedQuota = 1,
    /// `(username, password, quota)`; answered with a status only.
    AddUser = 2,
}

impl BackendCommand {
    /// Returns the wire identifier.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns the canonical name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckCredentials => "check-credentials",
            Self::GetAllocatedQuota => "get-allocated-quota",
            Self::AddUser => "add-user",
        }
    }
}

impl fmt::Display for BackendCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<BackendCommand> for u8 {
    fn from(command: BackendCommand) -> Self {
        command.id()
    }
}

impl TryFrom<u8> for BackendCommand {
    type Error = UnknownCommand;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::CheckCredentials),
            1 => Ok(Self::GetAllocatedQuota),
            2 => Ok(Self::AddUser),
            other => Err(UnknownCommand(other)),
        }
    }
}
