//! Serial port handling
//!
//! Provides the byte-level transport the session talks through, and
//! discovery of candidate adapter ports.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::{self, Read, Write};
use std::time::Duration;

use super::{ConnectError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Byte-oriented duplex channel to an adapter
///
/// Reads are blocking and bounded by the channel's own read timeout. A read
/// that times out yields `Ok(None)` rather than an error, so the framer can
/// count it as an empty read.
pub trait Transport {
    /// Read a single byte, `None` if nothing arrived within the read timeout
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write all bytes to the channel
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Drop any pending input and output
    fn discard_buffers(&mut self) -> io::Result<()>;

    /// Release the channel
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for Box<dyn SerialPort> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::All)
            .map_err(io::Error::from)
    }
}

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/rfcomm0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn named(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                (Some(usb_info.vid), Some(usb_info.pid), usb_info.product)
            }
            _ => (None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// Sort key placing Bluetooth (rfcomm*) ports first, then ttyACM*, then
/// ttyUSB*, each numerically by suffix, then everything else by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in ["rfcomm", "ttyACM", "ttyUSB"].iter().enumerate() {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank as u8, num, basename.to_string());
        }
    }
    (3, 0, basename.to_string())
}

/// List candidate adapter ports in the order they should be tried
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // Bound rfcomm devices are not always reported by the enumeration API
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if ["rfcomm", "ttyACM", "ttyUSB"]
                    .iter()
                    .any(|prefix| fname.starts_with(prefix))
                {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::named(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Open a serial port for an ELM327 adapter
pub fn open_port(
    name: &str,
    baud_rate: Option<u32>,
    read_timeout_ms: Option<u64>,
) -> Result<Box<dyn SerialPort>, ConnectError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    let timeout = read_timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);

    serialport::new(name, baud)
        .timeout(Duration::from_millis(timeout))
        .open()
        .map_err(|e| ConnectError::Open(format!("{}: {}", name, e)))
}

/// Configure a serial port as 8N1 without flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ConnectError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ConnectError::Open(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ConnectError::Open(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ConnectError::Open(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ConnectError::Open(e.to_string()))?;
    Ok(())
}
