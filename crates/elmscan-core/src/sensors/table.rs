//! Parameter table
//!
//! The fixed, ordered list of mode 01 parameters this crate knows how to
//! query. A descriptor's position in the table is its stable index, and
//! positions 1..=32 line up with the bits of the `0100` capability bitmap.

use super::decode::*;
use super::{DecodeFn, ParameterDescriptor};

macro_rules! param {
    ($index:expr, $short:expr, $name:expr, $cmd:expr, $decode:expr, $unit:expr) => {
        ParameterDescriptor {
            index: $index,
            short_name: $short,
            display_name: $name,
            command: $cmd,
            decode_fn: $decode as DecodeFn,
            unit: $unit,
        }
    };
}

pub(super) static PARAMETERS: [ParameterDescriptor; 33] = [
    param!(0, "pids", "Supported PIDs", "0100", hex_to_bitstring, ""),
    param!(1, "dtc_status", "S-S DTC Cleared", "0101", dtc_status, ""),
    param!(2, "dtc_ff", "DTC C-F-F", "0102", cpass, ""),
    param!(3, "fuel_status", "Fuel System Stat", "0103", cpass, ""),
    param!(4, "load", "Calc Load Value", "0104", percent_scale, "%"),
    param!(5, "temp", "Coolant Temp", "0105", temp, "°F"),
    param!(6, "short_term_fuel_trim_1", "S-T Fuel Trim", "0106", fuel_trim_percent, "%"),
    param!(7, "long_term_fuel_trim_1", "L-T Fuel Trim", "0107", fuel_trim_percent, "%"),
    param!(8, "short_term_fuel_trim_2", "S-T Fuel Trim", "0108", fuel_trim_percent, "%"),
    param!(9, "long_term_fuel_trim_2", "L-T Fuel Trim", "0109", fuel_trim_percent, "%"),
    param!(10, "fuel_pressure", "FuelRail Pressure", "010A", cpass, ""),
    param!(11, "manifold_pressure", "Intk Manifold", "010B", intake_m_pres, "psi"),
    param!(12, "rpm", "Engine RPM", "010C", rpm, "rpm"),
    param!(13, "speed", "Vehicle Speed", "010D", speed, "mph"),
    param!(14, "timing_advance", "Timing Advance", "010E", timing_advance, "degrees"),
    param!(15, "intake_air_temp", "Intake Air Temp", "010F", temp, "°F"),
    param!(16, "maf", "AirFlow Rate(MAF)", "0110", maf, "lb/min"),
    param!(17, "throttle_pos", "Throttle Position", "0111", throttle_pos, "%"),
    param!(18, "secondary_air_status", "2nd Air Status", "0112", cpass, ""),
    param!(19, "o2_sensor_positions", "Loc of O2 sensors", "0113", cpass, ""),
    param!(20, "o211", "O2 Sensor: 1 - 1", "0114", fuel_trim_percent, "%"),
    param!(21, "o212", "O2 Sensor: 1 - 2", "0115", fuel_trim_percent, "%"),
    param!(22, "o213", "O2 Sensor: 1 - 3", "0116", fuel_trim_percent, "%"),
    param!(23, "o214", "O2 Sensor: 1 - 4", "0117", fuel_trim_percent, "%"),
    param!(24, "o221", "O2 Sensor: 2 - 1", "0118", fuel_trim_percent, "%"),
    param!(25, "o222", "O2 Sensor: 2 - 2", "0119", fuel_trim_percent, "%"),
    param!(26, "o223", "O2 Sensor: 2 - 3", "011A", fuel_trim_percent, "%"),
    param!(27, "o224", "O2 Sensor: 2 - 4", "011B", fuel_trim_percent, "%"),
    param!(28, "obd_standard", "OBD Designation", "011C", cpass, ""),
    param!(29, "o2_sensor_position_b", "Loc of O2 sensor", "011D", cpass, ""),
    param!(30, "aux_input", "Aux input status", "011E", cpass, ""),
    param!(31, "engine_time", "Engine Start MIN", "011F", sec_to_min, "min"),
    param!(32, "engine_mil_time", "Engine Run MIL", "014D", sec_to_min, "min"),
];
