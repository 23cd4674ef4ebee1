//! Length-prefixed framing over byte streams.
//!
//! A frame is a 4-byte big-endian payload length followed by exactly that
//! many payload bytes. Readers never surface a partial frame: either the whole
//! payload arrives or the read fails. A peer that closes the stream cleanly
//! between frames is reported as `Ok(None)`, while a stream that ends inside a
//! frame is a [`FrameError::Truncated`] connection error.
//!
//! The codec itself does not bound frame sizes unless a limit is configured
//! with [`FrameCodec::with_max_len`]. Writers assemble the prefix and payload
//! into one buffer so a single call emits a single contiguous frame.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Width of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Errors raised while reading or writing frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended after a frame had started.
    #[error("stream closed mid-frame: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes the frame announced (prefix or payload).
        expected: usize,
        /// Bytes that arrived before the stream ended.
        received: usize,
    },
    /// The frame length exceeds what the codec accepts.
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Announced or attempted payload length.
        size: u64,
        /// Configured limit.
        max: u64,
    },
    /// The underlying stream failed.
    #[error("frame I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Returns true when the failure came from an expired read or write
    /// deadline on the underlying socket.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(error)
                if matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}

/// Reads and writes frames, optionally enforcing a maximum payload length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCodec {
    max_len: Option<u32>,
}

impl FrameCodec {
    /// Creates a codec without a size limit.
    #[must_use]
    pub const fn new() -> Self {
        Self { max_len: None }
    }

    /// Creates a codec that rejects payloads longer than `max_len` bytes.
    #[must_use]
    pub const fn with_max_len(max_len: u32) -> Self {
        Self {
            max_len: Some(max_len),
        }
    }

    /// Returns the configured payload limit, if any.
    #[must_use]
    pub const fn max_len(&self) -> Option<u32> {
        self.max_len
    }

    /// Writes `payload` as a single frame and flushes the writer.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] when the payload does not fit the
    /// prefix or the configured limit, and [`FrameError::Io`] when writing
    /// fails.
    pub fn write_frame<W: Write>(&self, writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
        let len = self.checked_len(payload.len())?;
        let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
        frame.extend_from_slice(&encode_prefix(len));
        frame.extend_from_slice(payload);
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads one complete frame.
    ///
    /// Returns `Ok(None)` when the stream ends before any byte of a new frame
    /// arrives.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Truncated`] when the stream ends inside a frame,
    /// [`FrameError::TooLarge`] when the announced length exceeds the limit,
    /// and [`FrameError::Io`] for any other stream failure.
    pub fn read_frame<R: Read>(&self, reader: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
        let Some(prefix) = read_prefix(reader)? else {
            return Ok(None);
        };
        let len = decode_prefix(prefix);
        if let Some(max) = self.max_len
            && len > max
        {
            return Err(FrameError::TooLarge {
                size: u64::from(len),
                max: u64::from(max),
            });
        }

        let expected = len as usize;
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(u64::from(len))
            .read_to_end(&mut payload)?;
        if payload.len() != expected {
            return Err(FrameError::Truncated {
                expected,
                received: payload.len(),
            });
        }
        Ok(Some(payload))
    }

    fn checked_len(&self, len: usize) -> Result<u32, FrameError> {
        let limit = self.max_len.unwrap_or(u32::MAX);
        match u32::try_from(len) {
            Ok(value) if value <= limit => Ok(value),
            _ => Err(FrameError::TooLarge {
                size: len as u64,
                max: u64::from(limit),
            }),
        }
    }
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the wire format fixes big-endian length prefixes"
)]
fn encode_prefix(len: u32) -> [u8; PREFIX_LEN] {
    len.to_be_bytes()
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the wire format fixes big-endian length prefixes"
)]
fn decode_prefix(prefix: [u8; PREFIX_LEN]) -> u32 {
    u32::from_be_bytes(prefix)
}

fn read_prefix<R: Read>(reader: &mut R) -> Result<Option<[u8; PREFIX_LEN]>, FrameError> {
    let mut prefix = [0_u8; PREFIX_LEN];
    let mut filled = 0;
    while let Some(rest) = prefix.get_mut(filled..)
        && !rest.is_empty()
    {
        match reader.read(rest) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(FrameError::Truncated {
                    expected: PREFIX_LEN,
                    received: filled,
                });
            }
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(FrameError::Io(error)),
        }
    }
    Ok(Some(prefix))
}

/// A stream paired with a [`FrameCodec`].
///
/// The wrapper owns the stream so a connection has exactly one frame writer,
/// which keeps frames from interleaving.
#[derive(Debug)]
pub struct Framed<S> {
    stream: S,
    codec: FrameCodec,
}

impl<S> Framed<S> {
    /// Wraps `stream` with an unlimited codec.
    #[must_use]
    pub const fn new(stream: S) -> Self {
        Self::with_codec(stream, FrameCodec::new())
    }

    /// Wraps `stream` with the supplied codec.
    #[must_use]
    pub const fn with_codec(stream: S, codec: FrameCodec) -> Self {
        Self { stream, codec }
    }

    /// Returns the codec in use.
    #[must_use]
    pub const fn codec(&self) -> FrameCodec {
        self.codec
    }

    /// Borrows the underlying stream.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrows the underlying stream.
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Releases the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read> Framed<S> {
    /// Reads the next frame; see [`FrameCodec::read_frame`].
    ///
    /// # Errors
    ///
    /// Propagates [`FrameError`] from the codec.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        self.codec.read_frame(&mut self.stream)
    }
}

impl<S: Write> Framed<S> {
    /// Writes one frame; see [`FrameCodec::write_frame`].
    ///
    /// # Errors
    ///
    /// Propagates [`FrameError`] from the codec.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        self.codec.write_frame(&mut self.stream, payload)
    }
}
