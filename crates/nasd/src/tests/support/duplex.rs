//! In-memory duplex stream for driving the dispatch loop without sockets.

use std::io::{self, Cursor, Read, Write};

use nas_protocol::{FrameCodec, Request, Response};

/// Stream fed with pre-framed client input that captures everything the
/// server writes.
#[derive(Debug, Default)]
pub struct Duplex {
    input: Cursor<Vec<u8>>,
    pub(crate) output: Vec<u8>,
}

impl Duplex {
    /// Builds a stream whose read side yields `frames` in order.
    pub fn with_frames<I, F>(frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        let mut input = Vec::new();
        for frame in frames {
            FrameCodec::new()
                .write_frame(&mut input, frame.as_ref())
                .expect("frame client input");
        }
        Self {
            input: Cursor::new(input),
            output: Vec::new(),
        }
    }

    /// Frames written by the server, in order.
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        let mut reader = Cursor::new(self.output.as_slice());
        let mut frames = Vec::new();
        while let Some(frame) = FrameCodec::new()
            .read_frame(&mut reader)
            .expect("read server frame")
        {
            frames.push(frame);
        }
        frames
    }
}

impl Read for Duplex {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Duplex {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Encodes a request frame.
pub fn request_frame(command: impl Into<u8>, arguments: &[&str]) -> Vec<u8> {
    Request::new(command, arguments.iter().copied())
        .encode()
        .expect("encode request")
}

/// Decodes a response frame.
pub fn decode_response(frame: &[u8]) -> Response {
    Response::decode(frame).expect("decode response")
}
