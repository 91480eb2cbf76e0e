use crate::answers::*;
use crate::base::{Command, Error, ProtocolDecoder, ProtocolEncoder, Response, Result};
use crate::checksum::{checksum, Crc32};
use crate::cmds::*;
use byteorder::{ByteOrder, LittleEndian};
use log::{error, trace, warn};
use std::cmp::min;
use std::io::Write;

/// The implementation of the Tau host communication protocol.
///
/// Encoding stamps the start mark, opcode, payload and CRC-32 into a
/// fixed-size frame. Decoding collects `expected + 8` bytes of a response
/// and then validates and strips it in `finish`.
#[derive(Debug, Clone, PartialEq)]
pub struct TauHostProtocol {
    verify_response_checksum: bool,
    expected_payload: usize,
    received: Vec<u8>,
}

/// Size of the command frame carrying `opcode`.
pub fn command_frame_size(opcode: u8) -> usize {
    if opcode == TAU_CMD_SET_ROI {
        TAU_CMD_ROI_FRAME_SIZE
    } else {
        TAU_CMD_FRAME_SIZE
    }
}

impl TauHostProtocol {
    /// Creates a new `TauHostProtocol` instance that does not verify response checksums.
    pub fn new() -> TauHostProtocol {
        TauHostProtocol::with_response_verification(false)
    }

    /// Creates a protocol instance, optionally verifying the CRC-32 trailer of responses.
    ///
    /// Verification walks every payload byte bit by bit, which is noticeable
    /// on full-frame acquisitions.
    pub fn with_response_verification(verify: bool) -> TauHostProtocol {
        trace!(
            "Creating new TauHostProtocol (verify response checksum: {})",
            verify
        );
        TauHostProtocol {
            verify_response_checksum: verify,
            expected_payload: 0,
            received: Vec::new(),
        }
    }

    fn response_checksum_matches(&self, declared: usize) -> bool {
        let end = TAU_ANS_HEADER_SIZE + declared;
        if self.received.len() < end + TAU_ANS_CHECKSUM_SIZE {
            trace!("Checksum trailer not received, skipping verification");
            return true;
        }
        let received_crc = LittleEndian::read_u32(&self.received[end..end + 4]);
        let calculated_crc = checksum(&self.received, end);
        trace!(
            "Response CRC32: received {:08X}, calculated {:08X}",
            received_crc,
            calculated_crc
        );
        received_crc == calculated_crc
    }
}

impl Default for TauHostProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolDecoder for TauHostProtocol {
    fn expect(&mut self, payload_size: usize) {
        trace!(
            "Decoder armed for {} payload bytes ({} on the wire)",
            payload_size,
            payload_size + TAU_ANS_OVERHEAD
        );
        self.expected_payload = payload_size;
        self.received.clear();
        self.received.reserve(payload_size + TAU_ANS_OVERHEAD);
    }

    fn remaining(&self) -> usize {
        (self.expected_payload + TAU_ANS_OVERHEAD).saturating_sub(self.received.len())
    }

    fn decode(&mut self, buf: &[u8]) -> usize {
        let take = min(self.remaining(), buf.len());
        self.received.extend_from_slice(&buf[..take]);
        trace!(
            "Decoder consumed {} of {} bytes, {} still missing",
            take,
            buf.len(),
            self.remaining()
        );
        take
    }

    fn finish(&mut self) -> Response {
        let response = self.validate();
        self.reset_decoder();
        response
    }

    fn reset_decoder(&mut self) {
        trace!("Resetting decoder state");
        self.expected_payload = 0;
        self.received.clear();
    }
}

impl TauHostProtocol {
    fn validate(&self) -> Response {
        let length = self.received.len();
        if length == 0 {
            warn!("Response error: nothing received");
            return Response::invalid();
        }
        if self.received[0] != TAU_ANS_START_MARK {
            warn!(
                "Response error: start mark {:02X}, expected {:02X}",
                self.received[0], TAU_ANS_START_MARK
            );
            return Response::invalid();
        }
        if length < TAU_ANS_HEADER_SIZE || length < TAU_ANS_OVERHEAD {
            warn!("Response error: only {} bytes received", length);
            return Response::invalid();
        }

        let kind = ResponseKind::from(self.received[TAU_ANS_INDEX_TYPE]);
        let declared = LittleEndian::read_u16(
            &self.received[TAU_ANS_INDEX_LENGTH..TAU_ANS_INDEX_LENGTH + 2],
        ) as usize;
        trace!(
            "Response header: type {:?}, declared payload {} bytes",
            kind,
            declared
        );

        if self.verify_response_checksum && !self.response_checksum_matches(declared) {
            warn!("Response error: checksum mismatch");
            return Response::invalid();
        }

        let end = min(length, TAU_ANS_HEADER_SIZE + declared);
        let data = self.received[TAU_ANS_HEADER_SIZE..end].to_vec();
        if data.len() < self.expected_payload {
            warn!(
                "Data error, actual size: {}, expected size: {}",
                data.len(),
                self.expected_payload
            );
        }
        Response { kind, data }
    }
}

impl ProtocolEncoder for TauHostProtocol {
    /// Encodes a `Command` into the provided byte buffer.
    ///
    /// Writes the start mark, opcode and payload, zero-pads the rest of the
    /// frame and stamps the CRC-32 over everything but the last four bytes.
    fn encode(&mut self, cmd: &Command, bytes: &mut [u8]) -> Result<usize> {
        trace!(
            "Encoding command: opcode={:02X}, payload_len={}",
            cmd.opcode,
            cmd.payload.len()
        );
        let frame_size = self.estimate_encoded_size(cmd)?;
        if frame_size > bytes.len() {
            error!(
                "Buffer too small: required {}, available {}",
                frame_size,
                bytes.len()
            );
            return Err(Error::BufferTooSmall);
        }

        let frame = &mut bytes[..frame_size];
        frame.fill(0);
        frame[0] = TAU_CMD_START_MARK;
        frame[TAU_CMD_INDEX_OPCODE] = cmd.opcode;
        frame[TAU_CMD_INDEX_DATA..TAU_CMD_INDEX_DATA + cmd.payload.len()]
            .copy_from_slice(&cmd.payload);

        let checksum_at = frame_size - TAU_CMD_CHECKSUM_SIZE;
        let mut crc = Crc32::new();
        crc.push_slice(&frame[..checksum_at]);
        let calculated_checksum = crc.checksum();
        LittleEndian::write_u32(&mut frame[checksum_at..], calculated_checksum);
        trace!("Calculated checksum: {:08X}", calculated_checksum);

        Ok(frame_size)
    }

    /// Returns the frame size for the opcode, rejecting payloads that do not fit.
    fn estimate_encoded_size(&mut self, cmd: &Command) -> Result<usize> {
        let frame_size = command_frame_size(cmd.opcode);
        let capacity = frame_size - TAU_CMD_INDEX_DATA - TAU_CMD_CHECKSUM_SIZE;
        if cmd.payload.len() > capacity {
            error!(
                "Payload too large for opcode {:02X}: {} bytes (max {})",
                cmd.opcode,
                cmd.payload.len(),
                capacity
            );
            return Err(Error::OperationFail {
                description: "payload too big".to_owned(),
            });
        }
        Ok(frame_size)
    }

    fn write_to(&mut self, cmd: &Command, dest: &mut impl Write) -> Result<usize> {
        let frame_size = self.estimate_encoded_size(cmd)?;
        let mut buf = vec![0; frame_size];
        let encoded_size = self.encode(cmd, &mut buf)?;
        trace!("Writing frame {:02X?}", &buf[..encoded_size]);
        match dest.write_all(&buf[..encoded_size]) {
            Ok(()) => Ok(encoded_size),
            Err(err) => {
                error!("IO error during write_all: {}", err);
                Err(err.into())
            }
        }
    }
}
