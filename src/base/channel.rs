use crate::base::error::Result;
use crate::base::message::{Command, Response};
use crate::base::traits::{ProtocolDecoder, ProtocolEncoder, Transport};
use crate::internals::TAU_DEFAULT_POLL_INTERVAL;
use log::{error, trace, warn};
use std::io::{self, Read};
use std::thread;
use std::time::{Duration, Instant};

const READ_CHUNK_SIZE: usize = 4096;

/// Channel encodes commands with a protocol, sends them to a transport and
/// reassembles the matching response.
///
/// Responses carry no request id and are matched purely by arrival order,
/// so `invoke` always writes and then reads before returning.
///
/// # Examples
/// ```ignore
/// let mut channel = Channel::new(TauHostProtocol::new(), serial_port);
/// let ack = channel.invoke(&Command::new(TAU_CMD_SET_MODE).push_u8(0), 0, Duration::from_secs(1))?;
/// ```
#[derive(Debug)]
pub struct Channel<P, T: ?Sized> {
    protocol: P,
    poll_interval: Duration,
    stream: Box<T>,
}

impl<P, T: ?Sized> Channel<P, T>
where
    P: ProtocolDecoder + ProtocolEncoder,
    T: Transport,
{
    /// Create a new `Channel` polling the transport every 100 µs while waiting.
    pub fn new(protocol: P, stream: Box<T>) -> Channel<P, T> {
        Channel::with_poll_interval(protocol, stream, TAU_DEFAULT_POLL_INTERVAL)
    }

    /// Create a new `Channel` with a custom sleep between empty polls.
    pub fn with_poll_interval(
        protocol: P,
        stream: Box<T>,
        poll_interval: Duration,
    ) -> Channel<P, T> {
        trace!("Creating new Channel (poll interval {:?})", poll_interval);
        let mut chn = Channel {
            protocol,
            poll_interval,
            stream,
        };
        chn.reset();
        chn
    }

    /// Reset the protocol decoder, dropping any partially received response.
    pub fn reset(&mut self) {
        trace!("Resetting Channel protocol decoder");
        self.protocol.reset_decoder();
    }

    /// Drops stale bytes waiting on the transport, e.g. the tail of a response
    /// that arrived after its read deadline.
    pub fn discard_input(&mut self) -> Result<()> {
        self.stream.discard_input()?;
        Ok(())
    }

    /// Write command to channel
    pub fn write(&mut self, cmd: &Command) -> Result<usize> {
        trace!(
            "Channel write called: opcode={:02X}, payload_len={}",
            cmd.opcode,
            cmd.payload.len()
        );
        let written = self.protocol.write_to(cmd, &mut self.stream)?;
        self.stream.flush()?;
        Ok(written)
    }

    /// Read a response carrying `payload_size` payload bytes, waiting at most `timeout`.
    ///
    /// Reaching the deadline is not an error: whatever arrived is validated
    /// and returned, which may be a truncated payload or `Response::invalid()`.
    /// Only transport failures are reported as `Err`.
    pub fn read_response(&mut self, payload_size: usize, timeout: Duration) -> Result<Response> {
        trace!(
            "Channel read_response called: payload_size={}, timeout={:?}",
            payload_size,
            timeout
        );
        self.protocol.expect(payload_size);
        let deadline = Instant::now() + timeout;
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        while self.protocol.remaining() > 0 {
            if Instant::now() >= deadline {
                warn!(
                    "Read deadline of {:?} reached with {} bytes missing",
                    timeout,
                    self.protocol.remaining()
                );
                break;
            }
            let available = match self.stream.bytes_available() {
                Ok(n) => n,
                Err(e) => {
                    error!("IO error polling stream: {}", e);
                    self.protocol.reset_decoder();
                    return Err(e.into());
                }
            };
            let wanted = available.min(self.protocol.remaining()).min(chunk.len());

            if wanted > 0 {
                match self.stream.read(&mut chunk[..wanted]) {
                    Ok(0) => thread::sleep(self.poll_interval),
                    Ok(read) => {
                        trace!("Read {} bytes from stream", read);
                        self.protocol.decode(&chunk[..read]);
                    }
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                        trace!("Stream read timed out");
                    }
                    Err(e) => {
                        error!("IO error reading from stream: {}", e);
                        self.protocol.reset_decoder();
                        return Err(e.into());
                    }
                }
            } else {
                thread::sleep(self.poll_interval);
            }
        }

        Ok(self.protocol.finish())
    }

    /// Send a command and wait for its response.
    pub fn invoke(
        &mut self,
        cmd: &Command,
        payload_size: usize,
        timeout: Duration,
    ) -> Result<Response> {
        trace!(
            "Channel invoke called: opcode={:02X}, payload_size={}, timeout={:?}",
            cmd.opcode,
            payload_size,
            timeout
        );
        if let Err(e) = self.write(cmd) {
            error!("Invoke: failed to write command: {:?}", e);
            return Err(e);
        }
        let response = self.read_response(payload_size, timeout)?;
        trace!(
            "Invoke: response {:?}, {} bytes",
            response.kind,
            response.data.len()
        );
        Ok(response)
    }

    /// Consumes the channel, returning the transport.
    pub fn into_inner(self) -> Box<T> {
        self.stream
    }
}

impl<P, T: ?Sized> Channel<P, T> {
    /// Borrow the underlying transport.
    pub fn stream(&self) -> &T {
        &self.stream
    }
}
