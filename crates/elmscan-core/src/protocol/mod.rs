//! ELM327 Serial Protocol
//!
//! Implements the text command/response protocol spoken by ELM327-compatible
//! OBD-II adapters.
//!
//! Commands are ASCII followed by CR LF. Responses are ASCII terminated by the
//! `>` prompt character.

pub mod commands;
mod error;
mod framer;
pub mod serial;
mod session;

pub use commands::Command;
pub use error::{ConfigError, ConnectError, DecodeError, FrameError, QueryError};
pub use framer::ResponseFramer;
pub use serial::{configure_port, list_ports, open_port, PortInfo, Transport};
pub use session::{
    expand_bitmap, interpret_response, ConnectionState, ProtocolSession, RawInterpreted,
    SessionConfig,
};

/// Default baud rate for ELM327 adapters
pub const DEFAULT_BAUD_RATE: u32 = 38400;

/// Default per-byte read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Time the adapter is given to come back up after `ATZ`
pub const DEFAULT_RESET_SETTLE_MS: u64 = 1000;

/// Consecutive empty reads before a response is abandoned
pub const MAX_EMPTY_READS: u32 = 5;

/// Longest response accepted before the framer gives up on a prompt
pub const MAX_RESPONSE_LEN: usize = 4096;

/// Prompt character that ends every adapter response
pub const PROMPT: u8 = b'>';

/// Token the adapter sends for an unsupported or absent parameter
pub const NO_DATA: &str = "NODATA";

/// Shortest cleaned response that still carries a payload
pub const MIN_RESPONSE_LEN: usize = 7;

/// Length of the echoed mode/PID header stripped from PID responses
pub const RESPONSE_HEADER_LEN: usize = 4;
