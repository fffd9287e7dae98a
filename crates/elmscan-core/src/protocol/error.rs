//! Protocol errors

use thiserror::Error;

use super::ConnectionState;

/// Errors raised while assembling one response from the adapter
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Timed out waiting for adapter prompt")]
    Timeout,

    #[error("Adapter prompt received with no response text")]
    Empty,

    #[error("Response exceeded {0} bytes without a prompt")]
    Overflow(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a connection attempt
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Could not open serial port: {0}")]
    Open(String),

    #[error("Handshake failed at '{command}': {source}")]
    Handshake {
        command: &'static str,
        #[source]
        source: FrameError,
    },

    #[error("Session is already {0:?}")]
    InvalidState(ConnectionState),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No adapter answered on any candidate port")]
    NoAdapter,
}

/// Errors local to a single command/response exchange
///
/// None of these tear down the session; the caller may keep querying.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("No response from adapter")]
    NoResponse,

    #[error("Malformed response: {0:?}")]
    Malformed(String),

    #[error("Parameter {0} returned no data")]
    NoData(usize),

    #[error("Unknown parameter index {0}")]
    UnknownParameter(usize),

    #[error("Session not ready (state: {0:?})")]
    NotReady(ConnectionState),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FrameError> for QueryError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Timeout | FrameError::Empty | FrameError::Overflow(_) => {
                QueryError::NoResponse
            }
            FrameError::Io(e) => QueryError::Io(e),
        }
    }
}

/// Errors from the pure hex decoders
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid hex input: {0:?}")]
    InvalidHex(String),

    #[error("Invalid DTC type code: {0}")]
    InvalidTypeCode(u8),

    #[error("Input too short: expected {expected} characters, got {actual}")]
    TooShort { expected: usize, actual: usize },
}

/// Errors loading a session configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
