//! Typed request and response messages and their byte encoding.
//!
//! A request payload is one command byte followed by each argument as a
//! 4-byte big-endian length and its UTF-8 bytes. A response payload is one
//! status byte followed by a single length-prefixed body. Decoding is the
//! exact inverse of encoding; leftover or missing bytes are malformed.

use std::fmt;

use thiserror::Error;

use crate::command::{CommandId, UnknownCommand};

const FIELD_PREFIX_LEN: usize = 4;

/// Errors raised while encoding or decoding messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The payload ended before a declared field was complete.
    #[error("malformed message: needed {needed} more bytes at offset {offset}")]
    Truncated {
        /// Offset at which the missing field starts.
        offset: usize,
        /// Bytes still required.
        needed: usize,
    },
    /// Bytes remained after the last field.
    #[error("malformed message: {count} trailing bytes")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },
    /// An argument was not valid UTF-8.
    #[error("malformed message: argument {index} is not valid UTF-8")]
    InvalidUtf8 {
        /// Zero-based argument position.
        index: usize,
    },
    /// The response status byte was neither success nor failure.
    #[error("malformed message: unknown status byte {0}")]
    UnknownStatus(u8),
    /// A field is too long for its length prefix.
    #[error("field of {len} bytes does not fit a 32-bit length prefix")]
    FieldTooLarge {
        /// Field length in bytes.
        len: usize,
    },
}

/// A command invocation sent by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command: u8,
    arguments: Vec<String>,
}

impl Request {
    /// Creates a request from a command identifier and its arguments.
    #[must_use]
    pub fn new<C, I, A>(command: C, arguments: I) -> Self
    where
        C: Into<u8>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            command: command.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the raw command identifier.
    #[must_use]
    pub const fn command_id(&self) -> u8 {
        self.command
    }

    /// Resolves the identifier against the file-server command table.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCommand`] for identifiers outside the table.
    pub fn command(&self) -> Result<CommandId, UnknownCommand> {
        CommandId::try_from(self.command)
    }

    /// Returns the ordered arguments.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Consumes the request, returning its arguments.
    #[must_use]
    pub fn into_arguments(self) -> Vec<String> {
        self.arguments
    }

    /// Encodes the request payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::FieldTooLarge`] for arguments longer than
    /// `u32::MAX` bytes.
    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        let size = 1 + self
            .arguments
            .iter()
            .map(|argument| FIELD_PREFIX_LEN + argument.len())
            .sum::<usize>();
        let mut bytes = Vec::with_capacity(size);
        bytes.push(self.command);
        for argument in &self.arguments {
            put_field(&mut bytes, argument.as_bytes())?;
        }
        Ok(bytes)
    }

    /// Decodes a request payload.
    ///
    /// # Errors
    ///
    /// Returns a [`MessageError`] when the payload is empty, a field is
    /// truncated, an argument is not UTF-8, or bytes are left over.
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut cursor = Cursor::new(bytes);
        let command = cursor.byte()?;
        let mut arguments = Vec::new();
        while !cursor.is_empty() {
            let field = cursor.field()?;
            let argument = std::str::from_utf8(field).map_err(|_| MessageError::InvalidUtf8 {
                index: arguments.len(),
            })?;
            arguments.push(argument.to_owned());
        }
        Ok(Self { command, arguments })
    }
}

/// Outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// The command succeeded; the body is command-specific.
    Success = 0,
    /// The command failed; the body is a short UTF-8 diagnostic.
    Failure = 1,
}

impl TryFrom<u8> for Status {
    type Error = MessageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Failure),
            other => Err(MessageError::UnknownStatus(other)),
        }
    }
}

/// The single reply written for each request.
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    body: Vec<u8>,
}

impl Response {
    /// Creates a response with an explicit status.
    #[must_use]
    pub fn new(status: Status, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a success response carrying `body`.
    #[must_use]
    pub fn success(body: impl Into<Vec<u8>>) -> Self {
        Self::new(Status::Success, body)
    }

    /// Creates a failure response carrying a diagnostic message.
    #[must_use]
    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self::new(Status::Failure, diagnostic.into().into_bytes())
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns true for [`Status::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the response, returning the body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Encodes the response payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::FieldTooLarge`] for bodies longer than
    /// `u32::MAX` bytes.
    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        let mut bytes = Vec::with_capacity(1 + FIELD_PREFIX_LEN + self.body.len());
        bytes.push(self.status as u8);
        put_field(&mut bytes, &self.body)?;
        Ok(bytes)
    }

    /// Decodes a response payload.
    ///
    /// # Errors
    ///
    /// Returns a [`MessageError`] for unknown status bytes, a truncated body,
    /// or trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut cursor = Cursor::new(bytes);
        let status = Status::try_from(cursor.byte()?)?;
        let body = cursor.field()?.to_vec();
        cursor.finish()?;
        Ok(Self { status, body })
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Response")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the wire format fixes big-endian field prefixes"
)]
fn put_field(bytes: &mut Vec<u8>, field: &[u8]) -> Result<(), MessageError> {
    let len = u32::try_from(field.len())
        .map_err(|_| MessageError::FieldTooLarge { len: field.len() })?;
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(field);
    Ok(())
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the wire format fixes big-endian field prefixes"
)]
fn field_len(prefix: [u8; FIELD_PREFIX_LEN]) -> u32 {
    u32::from_be_bytes(prefix)
}

/// Bounds-checked reader over a message payload.
struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], MessageError> {
        let available = self.bytes.len().saturating_sub(self.offset);
        let slice = self
            .offset
            .checked_add(count)
            .and_then(|end| self.bytes.get(self.offset..end))
            .ok_or(MessageError::Truncated {
                offset: self.offset,
                needed: count.saturating_sub(available),
            })?;
        self.offset += count;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, MessageError> {
        let slice = self.take(1)?;
        slice.first().copied().ok_or(MessageError::Truncated {
            offset: self.offset,
            needed: 1,
        })
    }

    fn field(&mut self) -> Result<&'a [u8], MessageError> {
        let prefix = self.take(FIELD_PREFIX_LEN)?;
        let mut raw = [0_u8; FIELD_PREFIX_LEN];
        raw.copy_from_slice(prefix);
        let len = usize::try_from(field_len(raw)).unwrap_or(usize::MAX);
        self.take(len)
    }

    fn finish(self) -> Result<(), MessageError> {
        let remaining = self.bytes.len().saturating_sub(self.offset);
        if remaining == 0 {
            Ok(())
        } else {
            Err(MessageError::TrailingBytes { count: remaining })
        }
    }
}
