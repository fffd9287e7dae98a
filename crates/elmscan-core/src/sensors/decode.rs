//! Sensor Decode Functions
//!
//! Pure conversions from the hex payload of a mode 01 response to a value in
//! the units shown to the user:
//! - Temperatures: °F
//! - Pressure: psi
//! - Speed: mph
//! - Air flow: lb/min
//!
//! Every function takes the payload with the echoed header already removed.

use crate::dtc::decode_monitor_status;
use crate::protocol::DecodeError;

use super::SensorValue;

/// Parse a hex payload into an integer
///
/// Rejects empty input, non-hex characters, and payloads wider than 64 bits.
pub fn hex_to_int(code: &str) -> Result<u64, DecodeError> {
    if code.is_empty() || code.len() > 16 || !code.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex(code.to_string()));
    }
    u64::from_str_radix(code, 16).map_err(|_| DecodeError::InvalidHex(code.to_string()))
}

/// Mass air flow in lb/min
pub fn maf(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Number(code as f64 * 0.00132276))
}

/// Throttle position in percent
pub fn throttle_pos(code: &str) -> Result<SensorValue, DecodeError> {
    percent_scale(code)
}

/// Intake manifold pressure in psi
pub fn intake_m_pres(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Number(code as f64 / 0.14504))
}

/// Engine speed; the payload counts quarter revolutions per minute
pub fn rpm(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Number(code as f64 / 4.0))
}

/// Vehicle speed in mph
pub fn speed(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Number(code as f64 / 1.609))
}

/// Scale a single byte to 0-100 %
pub fn percent_scale(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Number(code as f64 * 100.0 / 255.0))
}

/// Ignition timing advance in degrees before TDC
pub fn timing_advance(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Number((code as f64 - 128.0) / 2.0))
}

/// Whole minutes from a seconds counter
pub fn sec_to_min(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Minutes(code / 60))
}

/// Temperature in °F from a byte offset by 40 °C
pub fn temp(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    let celsius = code as f64 - 40.0;
    Ok(SensorValue::Number(32.0 + 9.0 * celsius / 5.0))
}

/// Signed percentage centred on 0x80
pub fn fuel_trim_percent(code: &str) -> Result<SensorValue, DecodeError> {
    let code = hex_to_int(code)?;
    Ok(SensorValue::Number((code as f64 - 128.0) * 100.0 / 128.0))
}

/// No conversion
pub fn cpass(code: &str) -> Result<SensorValue, DecodeError> {
    Ok(SensorValue::Raw(code.to_string()))
}

/// Readiness monitors and stored DTC count
pub fn dtc_status(code: &str) -> Result<SensorValue, DecodeError> {
    decode_monitor_status(code).map(SensorValue::Monitor)
}

/// Expand each nibble into four binary digits, least significant bit first
pub fn hex_to_bitstring(code: &str) -> Result<SensorValue, DecodeError> {
    let mut bits = String::with_capacity(code.len() * 4);
    for c in code.chars() {
        let v = c
            .to_digit(16)
            .ok_or_else(|| DecodeError::InvalidHex(code.to_string()))?;
        bits.extend((0..4).map(|i| if v & (1 << i) != 0 { '1' } else { '0' }));
    }
    if bits.is_empty() {
        return Err(DecodeError::InvalidHex(code.to_string()));
    }
    Ok(SensorValue::Bits(bits))
}
