//! Adapter commands
//!
//! The AT and OBD mode commands used by the session.

use serde::{Deserialize, Serialize};

/// Commands sent to the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Reset the adapter (`ATZ`)
    Reset,

    /// Turn command echo off (`ATE0`)
    EchoOff,

    /// Supported PIDs 01-20 (`0100`)
    SupportedPids,

    /// Monitor status since DTCs cleared (`0101`)
    MonitorStatus,

    /// Request stored DTCs (mode `03`)
    ReadStoredDtcs,

    /// Clear DTCs and stored values (mode `04`)
    ClearDtcs,

    /// Request freeze-frame DTCs (mode `07`)
    ReadFreezeDtcs,
}

impl Command {
    /// Wire text for this command, without line terminator
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Reset => "ATZ",
            Command::EchoOff => "ATE0",
            Command::SupportedPids => "0100",
            Command::MonitorStatus => "0101",
            Command::ReadStoredDtcs => "03",
            Command::ClearDtcs => "04",
            Command::ReadFreezeDtcs => "07",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
