//! Error types for the cobolt-host library.

use cobolt_proto::{EncodeError, LaserKind};
use thiserror::Error;

/// Result type alias for laser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a laser.
#[derive(Error, Debug)]
pub enum Error {
    /// Opening or enumerating serial ports failed.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error on an open port or the console.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The selected index is not one of the enumerated ports.
    #[error("Port ID out of range")]
    PortOutOfRange { index: usize, count: usize },

    /// The port selection could not be read as a number.
    #[error("Invalid port selection: {0:?}")]
    InvalidSelection(String),

    /// Nothing came back before the timeout.
    #[error("No response to `{0}`")]
    NoResponse(String),

    /// The laser answered with an error or something that does not decode.
    #[error("Unexpected response to `{command}`: {response}")]
    UnexpectedResponse { command: String, response: String },

    #[error("Invalid command: {0}")]
    Encode(#[from] EncodeError),

    /// The device on this port did not identify as a Cobolt laser.
    #[error("{0} is not a Cobolt laser")]
    NotCobolt(String),

    #[error("No laser found with serial number {0}")]
    NoLaserFound(String),

    /// The operation exists only on another laser family.
    #[error("{operation} is not supported by {kind} lasers")]
    Unsupported {
        operation: &'static str,
        kind: LaserKind,
    },
}
