use std::error;
use std::fmt;
use std::io;

/// Represents errors that can occur while talking to a Tau camera or decoding its frames.
#[derive(Debug)]
pub enum Error {
    /// The execution of operation failed. Contains a description of the failure.
    OperationFail { description: String },

    /// The execution of operation is timed out.
    OperationTimeout,

    /// The received data is invalid according to current protocol. Contains a description of the protocol error.
    ProtocolError { description: String },

    /// The payload does not fit into the fixed-size command frame.
    BufferTooSmall,

    /// A raw frame payload is shorter than its pixel layout requires.
    MalformedFrame { expected: usize, actual: usize },

    /// The serial port is already held by another open camera in this process.
    PortBusy { port: String },

    /// The serial port could not be opened.
    PortOpenFailed { port: String, description: String },

    /// Auto-discovery did not find any supported camera.
    DeviceNotFound,

    /// A color range with `near >= far` (or non-finite bounds) was requested.
    InvalidRange { near: f64, far: f64 },

    /// A region of interest outside the sensor grid or with inverted corners was requested.
    InvalidRoi {
        x_min: u16,
        y_min: u16,
        x_max: u16,
        y_max: u16,
    },

    /// An I/O error occurred while communicating with the underlying stream (e.g., serial port).
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OperationFail { description } => write!(f, "operation failed: {}", description),
            Error::OperationTimeout => write!(f, "operation timeout"),
            Error::ProtocolError { description } => write!(f, "protocol error: {}", description),
            Error::BufferTooSmall => write!(f, "payload does not fit into command frame"),
            Error::MalformedFrame { expected, actual } => write!(
                f,
                "malformed frame: expected at least {} bytes, got {}",
                expected, actual
            ),
            Error::PortBusy { port } => write!(f, "serial port {} is already opened", port),
            Error::PortOpenFailed { port, description } => {
                write!(f, "failed to open serial port {}: {}", port, description)
            }
            Error::DeviceNotFound => write!(
                f,
                "no Tau camera found, check that it is connected and that the current user may access serial ports"
            ),
            Error::InvalidRange { near, far } => {
                write!(f, "invalid color range: near {} must be below far {}", near, far)
            }
            Error::InvalidRoi {
                x_min,
                y_min,
                x_max,
                y_max,
            } => write!(
                f,
                "invalid region of interest ({}, {}) - ({}, {})",
                x_min, y_min, x_max, y_max
            ),
            Error::IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Error::IoError(err.into())
    }
}

/// A specialized `Result` type for Tau camera operations.
pub type Result<T> = std::result::Result<T, Error>;
