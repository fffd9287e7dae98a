//! Diagnostic Trouble Codes
//!
//! Decodes the stored-code count from the monitor status byte, the packed
//! 16-bit codes carried by mode 03/07 responses, and the readiness monitor
//! summary of PID 01.
//!
//! Two code decoders exist:
//! - [`decode_packed16`] (default): works on the 16-bit value and treats 0
//!   as packet fill. Used by the session.
//! - [`decode_nibble_codes`] (alternative): reads exactly three contiguous
//!   4-character groups nibble by nibble and rejects bad type codes. It has
//!   no notion of fill and is not used by the session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::protocol::DecodeError;

/// System letter indexed by the top two bits of a code
const DTC_LETTERS: [char; 4] = ['P', 'C', 'B', 'U'];

/// Codes carried by one mode 03/07 response
pub const CODES_PER_PACKET: usize = 3;

/// Hex characters of the echoed mode byte in front of DTC data
const DTC_HEADER_LEN: usize = 2;

/// Hex characters per packed code
const CODE_HEX_LEN: usize = 4;

/// Whether a code is currently stored or was captured with a freeze frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DtcStatus {
    /// Stored code (mode 03)
    Active,
    /// Code that triggered the freeze frame (mode 07)
    Freeze,
}

/// One decoded trouble code, e.g. `P0301`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtcCode {
    /// Where the code was read from
    pub status: DtcStatus,
    /// Letter and four hex digits
    pub code: String,
}

impl DtcCode {
    /// Create a code
    pub fn new(status: DtcStatus, code: String) -> Self {
        Self { status, code }
    }
}

impl fmt::Display for DtcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.code, self.status)
    }
}

/// Split the first status byte into (stored code count, MIL on)
pub fn decode_count(status_byte: u8) -> (usize, bool) {
    ((status_byte & 0x7F) as usize, status_byte & 0x80 != 0)
}

/// Decode one packed code, `None` for the zero fill value
pub fn decode_packed16(value: u16) -> Option<String> {
    if value == 0 {
        return None;
    }
    let letter = DTC_LETTERS[((value >> 14) & 0x3) as usize];
    let digits = [
        (value >> 12) & 0x3,
        (value >> 8) & 0xF,
        (value >> 4) & 0xF,
        value & 0xF,
    ];

    let mut code = String::with_capacity(5);
    code.push(letter);
    for d in digits {
        code.push(hex_digit(d as u32));
    }
    Some(code)
}

/// Decode the codes in one mode 03/07 response
///
/// Whitespace is ignored and the 2-character mode header is skipped. At most
/// [`CODES_PER_PACKET`] codes are read, and fewer when `remaining` is smaller.
/// Scanning stops at the first zero value.
pub fn decode_packet(response: &str, remaining: usize) -> Result<Vec<String>, DecodeError> {
    let cleaned: String = response.chars().filter(|c| !c.is_whitespace()).collect();
    let data = cleaned.get(DTC_HEADER_LEN..).unwrap_or("");

    let mut codes = Vec::new();
    for slot in 0..CODES_PER_PACKET.min(remaining) {
        let start = slot * CODE_HEX_LEN;
        let Some(group) = data.get(start..start + CODE_HEX_LEN) else {
            break;
        };
        let value = u16::from_str_radix(group, 16)
            .map_err(|_| DecodeError::InvalidHex(group.to_string()))?;
        match decode_packed16(value) {
            Some(code) => codes.push(code),
            None => break,
        }
    }
    Ok(codes)
}

/// Alternative decoder: three contiguous codes, nibble by nibble
pub fn decode_nibble_codes(hex: &str) -> Result<Vec<String>, DecodeError> {
    let expected = CODES_PER_PACKET * CODE_HEX_LEN;
    if hex.len() < expected {
        return Err(DecodeError::TooShort {
            expected,
            actual: hex.len(),
        });
    }

    let nibbles = hex
        .chars()
        .take(expected)
        .map(|c| {
            c.to_digit(16)
                .ok_or_else(|| DecodeError::InvalidHex(hex.to_string()))
        })
        .collect::<Result<Vec<u32>, _>>()?;

    nibbles
        .chunks(CODE_HEX_LEN)
        .map(|group| {
            let type_code = group[0] >> 2;
            let letter = DTC_LETTERS
                .get(type_code as usize)
                .ok_or(DecodeError::InvalidTypeCode(type_code as u8))?;
            let mut code = String::with_capacity(5);
            code.push(*letter);
            code.push(hex_digit(group[0] & 0x3));
            for &n in &group[1..] {
                code.push(hex_digit(n));
            }
            Ok(code)
        })
        .collect()
}

fn hex_digit(value: u32) -> char {
    std::char::from_digit(value, 16)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('0')
}

/// State of one on-board readiness test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Not available on this vehicle
    Unsupported,
    /// Ran to completion
    Complete,
    /// Not yet completed since codes were cleared
    Incomplete,
}

impl TestStatus {
    fn from_bits(supported: bool, incomplete: bool) -> Self {
        match (supported, incomplete) {
            (false, _) => TestStatus::Unsupported,
            (true, false) => TestStatus::Complete,
            (true, true) => TestStatus::Incomplete,
        }
    }

    /// Text shown for this state
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Unsupported => "Unsupported",
            TestStatus::Complete => "Supported - Completed",
            TestStatus::Incomplete => "Supported - Incompleted",
        }
    }
}

/// Monitor status since DTCs cleared (PID 01)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Number of stored codes
    pub dtc_count: usize,
    /// Malfunction indicator lamp
    pub mil_on: bool,
    /// Misfire, fuel system, components
    pub continuous: [TestStatus; 3],
    /// Catalyst through EGR, in bit order
    pub non_continuous: [TestStatus; 8],
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} DTC, MIL {}",
            self.dtc_count,
            if self.mil_on { "On" } else { "Off" }
        )
    }
}

/// Decode the 4-byte PID 01 payload
pub fn decode_monitor_status(hex: &str) -> Result<MonitorStatus, DecodeError> {
    if hex.len() < 8 {
        return Err(DecodeError::TooShort {
            expected: 8,
            actual: hex.len(),
        });
    }
    let byte = |i: usize| {
        hex.get(i * 2..i * 2 + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| DecodeError::InvalidHex(hex.to_string()))
    };
    let (a, b, c, d) = (byte(0)?, byte(1)?, byte(2)?, byte(3)?);

    let (dtc_count, mil_on) = decode_count(a);
    let continuous =
        std::array::from_fn(|i| TestStatus::from_bits((b >> i) & 1 == 1, (b >> (i + 4)) & 1 == 1));
    let non_continuous =
        std::array::from_fn(|i| TestStatus::from_bits((c >> i) & 1 == 1, (d >> i) & 1 == 1));

    Ok(MonitorStatus {
        dtc_count,
        mil_on,
        continuous,
        non_continuous,
    })
}
