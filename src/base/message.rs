use crate::answers::ResponseKind;

/// A command sent to the camera: an opcode plus its little-endian payload fields.
///
/// The payload is laid out starting at byte 2 of the command frame; framing,
/// padding and the checksum trailer are added by the protocol encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// The command opcode.
    pub opcode: u8,

    /// Payload bytes, in frame order.
    pub payload: Vec<u8>,
}

impl Command {
    /// Creates a new command with an opcode and no payload.
    ///
    /// # Arguments
    ///
    /// * `opcode` - The opcode for the command.
    pub fn new(opcode: u8) -> Command {
        Command::with_data(opcode, &[])
    }

    /// Creates a new command with an opcode and raw payload data.
    ///
    /// # Arguments
    ///
    /// * `opcode` - The opcode for the command.
    /// * `data` - A slice containing the payload data.
    #[inline]
    pub fn with_data(opcode: u8, data: &[u8]) -> Command {
        Command {
            opcode,
            payload: data.to_vec(),
        }
    }

    /// Appends a single byte field.
    pub fn push_u8(mut self, value: u8) -> Command {
        self.payload.push(value);
        self
    }

    /// Appends a little-endian `u16` field.
    pub fn push_u16(mut self, value: u16) -> Command {
        self.payload.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends a little-endian `i16` field.
    pub fn push_i16(mut self, value: i16) -> Command {
        self.payload.extend_from_slice(&value.to_le_bytes());
        self
    }
}

/// A reassembled response: its type and the payload with header and checksum removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The response type, or `ResponseKind::Invalid` when reassembly failed.
    pub kind: ResponseKind,

    /// Payload bytes. Empty for invalid responses, possibly shorter than
    /// declared when the read deadline expired mid-frame.
    pub data: Vec<u8>,
}

impl Response {
    /// The sentinel returned when no valid response could be assembled.
    pub fn invalid() -> Response {
        Response {
            kind: ResponseKind::Invalid,
            data: Vec::new(),
        }
    }

    /// Returns `true` unless this is the reassembly failure sentinel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.kind != ResponseKind::Invalid
    }
}
