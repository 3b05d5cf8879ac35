use std::error;
use std::fmt;
use std::io;

/// Represents errors that can occur while driving the lidar or detecting obstacles.
#[derive(Debug)]
pub enum Error {
    /// The execution of operation failed. Contains a description of the failure.
    OperationFail { description: String },

    /// The decoding data is invalid according to current protocol. Contains a description of the protocol error.
    ProtocolError { description: String },

    /// The buffer provided is too small for message encoding.
    BufferTooSmall,

    /// The receive buffer cannot hold the incoming bytes. Frame boundaries can
    /// no longer be trusted and the scan session has to be restarted.
    BufferOverflow { capacity: usize, pending: usize },

    /// An avoidance handler reported a failure.
    HandlerFailed { description: String },

    /// An I/O error occurred while communicating with the underlying stream (e.g., serial port).
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OperationFail { description } => write!(f, "operation failed: {}", description),
            Error::ProtocolError { description } => write!(f, "protocol error: {}", description),
            Error::BufferTooSmall => write!(f, "buffer is too small for message encoding"),
            Error::BufferOverflow { capacity, pending } => write!(
                f,
                "receive buffer overflow: {} bytes pending, capacity {}",
                pending, capacity
            ),
            Error::HandlerFailed { description } => write!(f, "handler failed: {}", description),
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

/// A specialized `Result` type for lidar operations.
pub type Result<T> = std::result::Result<T, Error>;
