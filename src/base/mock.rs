//! Scripted in-memory transport for exercising the driver without hardware.

use crate::answers::{TAU_ANS_HEADER_SIZE, TAU_ANS_START_MARK};
use crate::base::Transport;
use crate::checksum::checksum;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// Builds a well-formed response frame with a valid checksum trailer.
pub fn response_frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![TAU_ANS_START_MARK, kind];
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(payload);
    let crc = checksum(&frame, TAU_ANS_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Vec<u8>>,
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    frames_sent: usize,
    chunk_size: Option<usize>,
    fail_reads: bool,
    stall: Option<Stall>,
}

#[derive(Debug, Clone, Copy)]
enum Stall {
    TimedOut,
    Empty,
}

/// A transport that answers each flushed command with the next scripted reply.
///
/// Clones share state, so a test can keep a handle after the transport has
/// been moved into a camera.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// A transport with no scripted replies.
    pub fn new() -> MockTransport {
        MockTransport::default()
    }

    /// Limits how many bytes each poll reports as available.
    pub fn with_chunk_size(self, chunk_size: usize) -> MockTransport {
        self.lock().chunk_size = Some(chunk_size);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Queues bytes to deliver after the next command is flushed.
    pub fn push_reply(&self, reply: Vec<u8>) {
        self.lock().replies.push_back(reply);
    }

    /// Makes every poll and read fail with `BrokenPipe`.
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Keeps reporting input as available while every read comes back
    /// without data, either as `TimedOut` or as `Ok(0)`.
    pub fn stall_reads(&self, timed_out: bool) {
        self.lock().stall = Some(if timed_out { Stall::TimedOut } else { Stall::Empty });
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Number of flushes, i.e. commands sent.
    pub fn frames_sent(&self) -> usize {
        self.lock().frames_sent
    }

    /// Bytes received but not yet read.
    pub fn pending_input(&self) -> usize {
        self.lock().inbound.len()
    }
}

impl io::Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.lock();
        if state.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock read failure"));
        }
        match state.stall {
            Some(Stall::TimedOut) => {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "mock read stalled"))
            }
            Some(Stall::Empty) => return Ok(0),
            None => {}
        }
        let n = buf.len().min(state.inbound.len());
        for (dst, src) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl io::Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.lock();
        state.frames_sent += 1;
        if let Some(reply) = state.replies.pop_front() {
            state.inbound.extend(reply);
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let state = self.lock();
        if state.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock poll failure"));
        }
        if state.stall.is_some() {
            return Ok(64);
        }
        Ok(match state.chunk_size {
            Some(chunk) => chunk.min(state.inbound.len()),
            None => state.inbound.len(),
        })
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.lock().inbound.clear();
        Ok(())
    }
}
