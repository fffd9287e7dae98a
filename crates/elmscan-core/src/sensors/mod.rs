//! Sensor Registry
//!
//! Maps a parameter index to its query command, display names, unit and
//! decode function. The table is static and never changes at runtime.

pub mod decode;
mod table;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dtc::MonitorStatus;
use crate::protocol::DecodeError;

/// Pure conversion from a hex payload to a value
pub type DecodeFn = fn(&str) -> Result<SensorValue, DecodeError>;

/// Static description of one queryable parameter
#[derive(Debug, Clone, Copy)]
pub struct ParameterDescriptor {
    /// Position in the parameter table
    pub index: usize,
    /// Machine-friendly name (e.g., "rpm")
    pub short_name: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// Command sent to the adapter (e.g., "010C")
    pub command: &'static str,
    /// Unit of the decoded value, empty when unitless
    pub unit: &'static str,
    /// Payload decoder
    pub decode_fn: DecodeFn,
}

impl ParameterDescriptor {
    /// Decode a hex payload with this parameter's formula
    pub fn decode(&self, hex: &str) -> Result<SensorValue, DecodeError> {
        (self.decode_fn)(hex)
    }
}

/// A decoded parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SensorValue {
    /// Scaled numeric value
    Number(f64),
    /// Whole minutes
    Minutes(u64),
    /// Payload passed through unconverted
    Raw(String),
    /// Bitstring expansion of the payload
    Bits(String),
    /// Readiness monitor summary
    Monitor(MonitorStatus),
}

impl SensorValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SensorValue::Number(n) => Some(*n),
            SensorValue::Minutes(m) => Some(*m as f64),
            _ => None,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Number(n) => write!(f, "{}", n),
            SensorValue::Minutes(m) => write!(f, "{}", m),
            SensorValue::Raw(s) | SensorValue::Bits(s) => f.write_str(s),
            SensorValue::Monitor(status) => write!(f, "{}", status),
        }
    }
}

/// One decoded response for a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Index of the queried parameter
    pub index: usize,
    /// Payload as received, header removed
    pub raw_hex: String,
    /// Decoded value
    pub value: SensorValue,
    /// Unit of `value`
    pub unit: String,
}

/// All parameters in table order
pub fn parameters() -> &'static [ParameterDescriptor] {
    &table::PARAMETERS
}

/// Look up a parameter by index
pub fn get(index: usize) -> Option<&'static ParameterDescriptor> {
    table::PARAMETERS.get(index)
}

/// Look up a parameter by short name
pub fn by_short_name(name: &str) -> Option<&'static ParameterDescriptor> {
    table::PARAMETERS.iter().find(|p| p.short_name == name)
}
