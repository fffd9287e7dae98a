//! # elmscan Core Library
//!
//! Core functionality for reading live data and trouble codes from a vehicle
//! through an ELM327-compatible OBD-II adapter.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial transport and prompt-terminated response framing
//! - The adapter session: handshake, PID queries, DTC retrieval
//! - A static registry of mode 01 parameters and their decode formulas
//! - Diagnostic trouble code decoding
//! - Port scanning and timestamped capture snapshots
//!
//! ## Example
//!
//! ```rust,ignore
//! use elmscan_core::prelude::*;
//!
//! // Connect to the adapter
//! let mut session = ProtocolSession::open_serial(SessionConfig::for_port("/dev/rfcomm0"))?;
//!
//! // Read one parameter
//! let reading = session.query_pid(12)?;
//! println!("RPM: {}", reading.value);
//!
//! // Read stored and freeze-frame trouble codes
//! for code in session.read_dtcs()? {
//!     println!("{}", code);
//! }
//! ```

pub mod capture;
pub mod demo;
pub mod dtc;
pub mod protocol;
pub mod sensors;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::capture::{connect_first, scan_and_connect, Capture};
    pub use crate::demo::DemoAdapter;
    pub use crate::dtc::{DtcCode, DtcStatus, MonitorStatus};
    pub use crate::protocol::{
        ConnectError, ConnectionState, ProtocolSession, QueryError, RawInterpreted,
        SessionConfig, Transport,
    };
    pub use crate::sensors::{ParameterDescriptor, SensorReading, SensorValue};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
