use crate::base::error::Result;
use crate::base::message::{Command, Response};
use std::io;

/// Defines the behavior for reassembling a byte stream into a `Response`.
///
/// The camera protocol has no request ids, so a decoder is armed with the
/// payload size expected for the command just sent and then fed bytes until
/// it is complete or the caller gives up.
pub trait ProtocolDecoder {
    /// Prepares the decoder for a response carrying `payload_size` bytes of payload.
    fn expect(&mut self, payload_size: usize);

    /// Number of bytes still missing before the armed response is complete.
    fn remaining(&self) -> usize;

    /// Feeds received bytes into the decoder.
    ///
    /// Returns the number of bytes consumed. Bytes beyond the armed response
    /// size are not consumed.
    fn decode(&mut self, buf: &[u8]) -> usize;

    /// Validates whatever has been received so far and returns the response.
    ///
    /// This never fails: a malformed or missing response yields
    /// `Response::invalid()`. The decoder is reset afterwards.
    fn finish(&mut self) -> Response;

    /// Resets the internal state of the decoder, dropping any partial response.
    fn reset_decoder(&mut self);
}

/// Defines the behavior for framing `Command` objects into byte streams.
pub trait ProtocolEncoder {
    /// Encodes a `Command` into the provided byte buffer.
    ///
    /// Returns the number of bytes written to the buffer upon successful encoding.
    ///
    /// # Arguments
    ///
    /// * `cmd` - The `Command` to encode.
    /// * `bytes` - The mutable byte slice to write the encoded frame into.
    fn encode(&mut self, cmd: &Command, bytes: &mut [u8]) -> Result<usize>;

    /// Returns the exact size in bytes of the frame for the given `Command`.
    fn estimate_encoded_size(&mut self, cmd: &Command) -> Result<usize>;

    /// Encodes a `Command` and writes it directly to a `Write` target (e.g., a serial port).
    ///
    /// Returns the number of bytes successfully written to the destination.
    fn write_to(&mut self, cmd: &Command, dest: &mut impl io::Write) -> Result<usize>;
}

/// A byte-stream transport the camera is attached to.
///
/// Besides plain `Read`/`Write`, the channel needs to know how many bytes
/// are waiting so it can poll without blocking on a partial frame.
pub trait Transport: io::Read + io::Write {
    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Drops any received bytes that have not been read yet.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }
}
