//! Session management
//!
//! Handles the adapter connection lifecycle and every command/response
//! exchange made through it.

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    serial::{configure_port, open_port},
    Command, ConfigError, ConnectError, DecodeError, QueryError, ResponseFramer, Transport,
    DEFAULT_BAUD_RATE, DEFAULT_RESET_SETTLE_MS, DEFAULT_TIMEOUT_MS, MAX_EMPTY_READS,
    MIN_RESPONSE_LEN, NO_DATA, RESPONSE_HEADER_LEN,
};
use crate::dtc::{self, DtcCode, DtcStatus, CODES_PER_PACKET};
use crate::sensors::{self, ParameterDescriptor, SensorReading};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Handshake in progress
    Handshaking,
    /// Handshake completed, queries allowed
    Ready,
    /// Handshake failed
    Failed,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Per-byte read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Delay after `ATZ` before reading the banner
    pub reset_settle_ms: u64,
    /// Consecutive empty reads before a response is abandoned
    pub max_empty_reads: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            reset_settle_ms: DEFAULT_RESET_SETTLE_MS,
            max_empty_reads: MAX_EMPTY_READS,
        }
    }
}

impl SessionConfig {
    /// Config for a named port with all other settings at their defaults
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Interpretation of one PID response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInterpreted {
    /// The adapter reported `NO DATA`
    NoData,
    /// Response data with the echoed header removed
    Payload(String),
}

/// Clean up a framed response and strip its echoed header
///
/// Only the text before the first carriage return is used. The length check
/// applies to that line as the adapter sent it (spaces between bytes count),
/// then all whitespace is removed before the header is dropped. `NODATA` is
/// recognised in any case and spacing before the length check, so it is
/// never reported as malformed.
pub fn interpret_response(text: &str) -> Result<RawInterpreted, QueryError> {
    let first = text.split('\r').next().unwrap_or_default().trim();
    let cleaned: String = first.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.to_ascii_uppercase().starts_with(NO_DATA) {
        return Ok(RawInterpreted::NoData);
    }
    if first.len() < MIN_RESPONSE_LEN {
        return Err(QueryError::Malformed(cleaned));
    }
    match cleaned.get(RESPONSE_HEADER_LEN..) {
        Some(payload) if !payload.is_empty() => Ok(RawInterpreted::Payload(payload.to_string())),
        _ => Err(QueryError::Malformed(cleaned)),
    }
}

/// Expand a capability bitmap, most significant bit of each nibble first
///
/// Element `i` is set when the parameter at table position `i + 1` is
/// supported.
pub fn expand_bitmap(hex: &str) -> Result<Vec<bool>, DecodeError> {
    let mut bits = Vec::with_capacity(hex.len() * 4);
    for c in hex.chars() {
        let v = c
            .to_digit(16)
            .ok_or_else(|| DecodeError::InvalidHex(hex.to_string()))?;
        bits.extend((0..4).rev().map(|i| v & (1 << i) != 0));
    }
    Ok(bits)
}

/// One adapter connection
///
/// Every exchange takes `&mut self`, so only one command can be in flight.
/// Share a session across threads only behind external locking.
pub struct ProtocolSession<T: Transport = Box<dyn SerialPort>> {
    /// Channel to the adapter
    transport: T,
    /// Response framing
    framer: ResponseFramer,
    /// Current connection state
    state: ConnectionState,
    /// Session configuration
    config: SessionConfig,
    /// Banner returned by `ATZ`
    adapter_version: Option<String>,
    /// Most recent capability bitmap
    capability_bitmap: Option<Vec<bool>>,
}

impl ProtocolSession<Box<dyn SerialPort>> {
    /// Open the serial port named in `config` and run the handshake
    pub fn open_serial(config: SessionConfig) -> Result<Self, ConnectError> {
        info!(
            "Opening adapter on {} at {} baud",
            config.port_name, config.baud_rate
        );
        let mut port = open_port(
            &config.port_name,
            Some(config.baud_rate),
            Some(config.read_timeout_ms),
        )?;
        configure_port(port.as_mut())?;
        Self::open(port, config)
    }
}

impl<T: Transport> ProtocolSession<T> {
    /// Create a session over an already open transport (not yet connected)
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            framer: ResponseFramer::new(config.max_empty_reads),
            state: ConnectionState::Disconnected,
            config,
            adapter_version: None,
            capability_bitmap: None,
        }
    }

    /// Create a session and run the handshake
    pub fn open(transport: T, config: SessionConfig) -> Result<Self, ConnectError> {
        let mut session = Self::new(transport, config);
        session.connect()?;
        Ok(session)
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Adapter banner from the reset, e.g. "ELM327 v1.5"
    pub fn adapter_version(&self) -> Option<&str> {
        self.adapter_version.as_deref()
    }

    /// Capability bitmap from the last `0100` probe
    pub fn capability_bitmap(&self) -> Option<&[bool]> {
        self.capability_bitmap.as_deref()
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the handshake: reset, echo off, probe supported PIDs
    ///
    /// Any step that gets no framed response moves the session to `Failed`.
    /// Nothing is retried.
    pub fn connect(&mut self) -> Result<(), ConnectError> {
        if self.state != ConnectionState::Disconnected {
            return Err(ConnectError::InvalidState(self.state));
        }

        self.state = ConnectionState::Handshaking;
        match self.handshake() {
            Ok(()) => {
                self.state = ConnectionState::Ready;
                info!(
                    "Adapter ready ({})",
                    self.adapter_version.as_deref().unwrap_or("unknown")
                );
                Ok(())
            }
            Err(e) => {
                warn!("Handshake failed: {}", e);
                self.state = ConnectionState::Failed;
                Err(e)
            }
        }
    }

    fn handshake(&mut self) -> Result<(), ConnectError> {
        let settle = Duration::from_millis(self.config.reset_settle_ms);
        let version = self.handshake_step(Command::Reset, settle)?;
        debug!("handshake: ATZ -> {:?}", version);
        self.adapter_version = Some(version.trim().to_string());

        let echo = self.handshake_step(Command::EchoOff, Duration::ZERO)?;
        debug!("handshake: ATE0 -> {:?}", echo);

        let probe = self.handshake_step(Command::SupportedPids, Duration::ZERO)?;
        debug!("handshake: 0100 -> {:?}", probe);
        match interpret_response(&probe) {
            Ok(RawInterpreted::Payload(hex)) => match expand_bitmap(&hex) {
                Ok(bits) => self.capability_bitmap = Some(bits),
                Err(e) => warn!("handshake: unreadable capability bitmap: {}", e),
            },
            Ok(RawInterpreted::NoData) => warn!("handshake: 0100 returned no data"),
            Err(e) => warn!("handshake: 0100 response not understood: {}", e),
        }

        Ok(())
    }

    fn handshake_step(&mut self, cmd: Command, settle: Duration) -> Result<String, ConnectError> {
        self.send_command(cmd.as_str())?;
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }
        self.framer
            .read_one(&mut self.transport)
            .map_err(|source| ConnectError::Handshake {
                command: cmd.as_str(),
                source,
            })
    }

    /// Discard pending buffers and send `cmd` followed by CR LF
    pub fn send_command(&mut self, cmd: &str) -> io::Result<()> {
        debug!("send_command: {:?}", cmd);
        self.transport.discard_buffers()?;
        self.transport.write_bytes(format!("{}\r\n", cmd).as_bytes())
    }

    fn ensure_ready(&self) -> Result<(), QueryError> {
        if self.state == ConnectionState::Ready {
            Ok(())
        } else {
            Err(QueryError::NotReady(self.state))
        }
    }

    /// Send `cmd` and return the framed response text as-is
    fn exchange(&mut self, cmd: &str) -> Result<String, QueryError> {
        self.ensure_ready()?;
        self.send_command(cmd)?;
        Ok(self.framer.read_one(&mut self.transport)?)
    }

    /// Send a PID command and interpret the response
    pub fn query_raw(&mut self, cmd: &str) -> Result<RawInterpreted, QueryError> {
        let text = self.exchange(cmd)?;
        interpret_response(&text)
    }

    /// Query and decode the parameter at `index`
    ///
    /// `QueryError::NoData` means the vehicle does not provide the parameter
    /// right now, regardless of what the capability bitmap claims.
    pub fn query_pid(&mut self, index: usize) -> Result<SensorReading, QueryError> {
        let descriptor = sensors::get(index).ok_or(QueryError::UnknownParameter(index))?;
        match self.query_raw(descriptor.command)? {
            RawInterpreted::NoData => Err(QueryError::NoData(index)),
            RawInterpreted::Payload(hex) => {
                let value = descriptor.decode(&hex)?;
                Ok(SensorReading {
                    index,
                    raw_hex: hex,
                    value,
                    unit: descriptor.unit.to_string(),
                })
            }
        }
    }

    /// Probe `0100` and return the parameters whose bitmap bit is set
    pub fn supported_parameters(
        &mut self,
    ) -> Result<Vec<&'static ParameterDescriptor>, QueryError> {
        let hex = match self.query_raw(Command::SupportedPids.as_str())? {
            RawInterpreted::NoData => return Err(QueryError::NoData(0)),
            RawInterpreted::Payload(hex) => hex,
        };
        let bits = expand_bitmap(&hex)?;
        let supported = bits
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .filter_map(|(i, _)| sensors::get(i + 1))
            .collect();
        self.capability_bitmap = Some(bits);
        Ok(supported)
    }

    /// Stored code count and MIL state from PID 01
    pub fn dtc_count(&mut self) -> Result<(usize, bool), QueryError> {
        let hex = match self.query_raw(Command::MonitorStatus.as_str())? {
            RawInterpreted::NoData => return Err(QueryError::NoData(1)),
            RawInterpreted::Payload(hex) => hex,
        };
        let status_byte = hex
            .get(..2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| DecodeError::InvalidHex(hex.clone()))?;
        Ok(dtc::decode_count(status_byte))
    }

    /// Send a DTC mode command, `None` if the adapter reports no data
    fn dtc_packet(&mut self, cmd: Command) -> Result<Option<String>, QueryError> {
        let text = self.exchange(cmd.as_str())?;
        debug!("{} result: {:?}", cmd, text);
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.to_ascii_uppercase().starts_with(NO_DATA) {
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Read `count` stored codes, three per `03` response
    ///
    /// A packet that ends in zero fill before `count` is reached does not stop
    /// the batch; the next packet is still requested.
    pub fn read_stored_dtcs(&mut self, count: usize) -> Result<Vec<DtcCode>, QueryError> {
        let mut codes = Vec::with_capacity(count);
        for _ in 0..count.div_ceil(CODES_PER_PACKET) {
            if codes.len() >= count {
                break;
            }
            let Some(text) = self.dtc_packet(Command::ReadStoredDtcs)? else {
                break;
            };
            let decoded = dtc::decode_packet(&text, count - codes.len())?;
            codes.extend(
                decoded
                    .into_iter()
                    .map(|code| DtcCode::new(DtcStatus::Active, code)),
            );
        }
        Ok(codes)
    }

    /// Read codes captured with the freeze frame (`07`)
    pub fn read_freeze_dtcs(&mut self) -> Result<Vec<DtcCode>, QueryError> {
        let Some(text) = self.dtc_packet(Command::ReadFreezeDtcs)? else {
            return Ok(Vec::new());
        };
        Ok(dtc::decode_packet(&text, CODES_PER_PACKET)?
            .into_iter()
            .map(|code| DtcCode::new(DtcStatus::Freeze, code))
            .collect())
    }

    /// All stored codes followed by any freeze-frame codes
    pub fn read_dtcs(&mut self) -> Result<Vec<DtcCode>, QueryError> {
        let (count, mil_on) = self.dtc_count()?;
        info!("Number of stored DTC: {} MIL: {}", count, mil_on);

        let mut codes = self.read_stored_dtcs(count)?;
        codes.extend(self.read_freeze_dtcs()?);
        Ok(codes)
    }

    /// Clear stored codes (`04`) and return the adapter's reply
    pub fn clear_dtcs(&mut self) -> Result<String, QueryError> {
        let reply = self.exchange(Command::ClearDtcs.as_str())?;
        info!("Cleared DTCs: {:?}", reply);
        Ok(reply)
    }

    /// Reset the adapter and release the transport
    ///
    /// Consumes the session, so a closed transport can never be reused.
    pub fn close(mut self) -> io::Result<()> {
        if self.state == ConnectionState::Ready {
            if let Err(e) = self.send_command(Command::Reset.as_str()) {
                warn!("close: reset failed: {}", e);
            }
        }
        self.transport.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoAdapter;
    use crate::protocol::FrameError;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quick_config() -> SessionConfig {
        SessionConfig {
            reset_settle_ms: 0,
            ..Default::default()
        }
    }

    fn ready_session(adapter: DemoAdapter) -> ProtocolSession<DemoAdapter> {
        ProtocolSession::open(adapter, quick_config()).unwrap()
    }

    fn dtc_requests(session: &ProtocolSession<DemoAdapter>) -> usize {
        session
            .transport()
            .commands()
            .iter()
            .filter(|c| c.as_str() == "03")
            .count()
    }

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.max_empty_reads, 5);
        assert_eq!(config.reset_settle_ms, 1000);
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let session = ProtocolSession::new(DemoAdapter::new(), quick_config());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(session.adapter_version().is_none());
    }

    #[test]
    fn test_interpret_payload() {
        assert_eq!(
            interpret_response("41 0C 1A F8").unwrap(),
            RawInterpreted::Payload("1AF8".to_string())
        );
        assert_eq!(
            interpret_response("4100BE1FA813").unwrap(),
            RawInterpreted::Payload("BE1FA813".to_string())
        );
    }

    #[test]
    fn test_interpret_no_data() {
        assert_eq!(interpret_response("NODATA").unwrap(), RawInterpreted::NoData);
        assert_eq!(interpret_response("NO DATA").unwrap(), RawInterpreted::NoData);
        assert_eq!(
            interpret_response("  no data \t").unwrap(),
            RawInterpreted::NoData
        );
    }

    #[test]
    fn test_interpret_short_is_malformed() {
        assert!(matches!(
            interpret_response("OK"),
            Err(QueryError::Malformed(s)) if s == "OK"
        ));
        assert!(matches!(
            interpret_response("41 0D"),
            Err(QueryError::Malformed(_))
        ));
    }

    #[test]
    fn test_interpret_single_byte_payload() {
        assert_eq!(
            interpret_response("41 0D 32").unwrap(),
            RawInterpreted::Payload("32".to_string())
        );
        // Without spaces a one-byte answer is too short to trust
        assert!(matches!(
            interpret_response("410D32"),
            Err(QueryError::Malformed(_))
        ));
    }

    #[test]
    fn test_interpret_uses_first_line() {
        assert_eq!(
            interpret_response("41 0D 32\r41 0D 33").unwrap(),
            RawInterpreted::Payload("32".to_string())
        );
    }

    #[test]
    fn test_expand_bitmap_msb_first() {
        let bits = expand_bitmap("8").unwrap();
        assert_eq!(bits, vec![true, false, false, false]);
        let bits = expand_bitmap("BE").unwrap();
        assert_eq!(
            bits,
            vec![true, false, true, true, true, true, true, false]
        );
        assert!(expand_bitmap("XZ").is_err());
    }

    #[test]
    fn test_handshake_reaches_ready() {
        let session = ready_session(DemoAdapter::new());
        assert_eq!(session.state(), ConnectionState::Ready);
        assert_eq!(session.adapter_version(), Some("ELM327 v1.5"));
        assert_eq!(session.capability_bitmap().unwrap().len(), 32);
        assert_eq!(session.transport().commands(), ["ATZ", "ATE0", "0100"]);
    }

    #[test]
    fn test_handshake_silent_adapter_fails() {
        let adapter = DemoAdapter::blank();
        let mut session = ProtocolSession::new(adapter, quick_config());
        let err = session.connect().unwrap_err();
        assert!(matches!(
            err,
            ConnectError::Handshake {
                command: "ATZ",
                source: FrameError::Timeout
            }
        ));
        assert_eq!(session.state(), ConnectionState::Failed);
        // No further handshake steps after the failure
        assert_eq!(session.transport().commands(), ["ATZ"]);
    }

    #[test]
    fn test_handshake_empty_probe_fails() {
        let adapter = DemoAdapter::new().reply("0100", "");
        let mut session = ProtocolSession::new(adapter, quick_config());
        let err = session.connect().unwrap_err();
        assert!(matches!(
            err,
            ConnectError::Handshake {
                command: "0100",
                source: FrameError::Empty
            }
        ));
        assert_eq!(session.state(), ConnectionState::Failed);
    }

    #[test]
    fn test_connect_twice_is_rejected() {
        let mut session = ready_session(DemoAdapter::new());
        assert!(matches!(
            session.connect(),
            Err(ConnectError::InvalidState(ConnectionState::Ready))
        ));
    }

    #[test]
    fn test_query_before_connect() {
        let mut session = ProtocolSession::new(DemoAdapter::new(), quick_config());
        assert!(matches!(
            session.query_pid(12),
            Err(QueryError::NotReady(ConnectionState::Disconnected))
        ));
    }

    #[test]
    fn test_send_command_appends_crlf() {
        let mut session = ready_session(DemoAdapter::new());
        session.send_command("010C").unwrap();
        assert_eq!(session.transport().written().last(), Some(&b'\n'));
        assert!(session.transport().written().ends_with(b"010C\r\n"));
    }

    #[test]
    fn test_query_pid_decodes() {
        let mut session = ready_session(DemoAdapter::new());
        let reading = session.query_pid(12).unwrap();
        assert_eq!(reading.index, 12);
        assert_eq!(reading.raw_hex, "1AF8");
        assert_eq!(reading.value.as_f64(), Some(1726.0));
        assert_eq!(reading.unit, "rpm");
    }

    #[test]
    fn test_query_pid_no_data() {
        let mut session = ready_session(DemoAdapter::new());
        assert!(matches!(session.query_pid(21), Err(QueryError::NoData(21))));
        // Session is still usable afterwards
        assert!(session.query_pid(13).is_ok());
    }

    #[test]
    fn test_query_pid_unknown_index() {
        let mut session = ready_session(DemoAdapter::new());
        assert!(matches!(
            session.query_pid(99),
            Err(QueryError::UnknownParameter(99))
        ));
    }

    #[test]
    fn test_query_pid_no_response() {
        let adapter = DemoAdapter::new().silent("010C");
        let mut session = ready_session(adapter);
        assert!(matches!(session.query_pid(12), Err(QueryError::NoResponse)));
        assert_eq!(session.state(), ConnectionState::Ready);
    }

    #[test]
    fn test_query_pid_malformed() {
        let adapter = DemoAdapter::new().reply("010D", "41 0D");
        let mut session = ready_session(adapter);
        assert!(matches!(session.query_pid(13), Err(QueryError::Malformed(_))));
    }

    #[test]
    fn test_supported_parameters() {
        let mut session = ready_session(DemoAdapter::new());
        let supported: Vec<usize> = session
            .supported_parameters()
            .unwrap()
            .iter()
            .map(|p| p.index)
            .collect();
        assert_eq!(
            supported,
            vec![1, 3, 4, 5, 6, 7, 12, 13, 14, 15, 16, 17, 19, 21, 28, 31, 32]
        );
    }

    #[test]
    fn test_dtc_count() {
        let mut session = ready_session(DemoAdapter::new());
        assert_eq!(session.dtc_count().unwrap(), (2, true));
    }

    #[test]
    fn test_read_stored_dtcs_multi_packet() {
        let adapter = DemoAdapter::new()
            .reply("03", "43 01 33 03 00 01 01")
            .then_reply("03", "43 C1 23 00 00 00 00");
        let mut session = ready_session(adapter);
        let codes: Vec<String> = session
            .read_stored_dtcs(4)
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(codes, vec!["P0133", "P0300", "P0101", "U0123"]);
        assert_eq!(dtc_requests(&session), 2);
    }

    #[test]
    fn test_read_stored_dtcs_zero_count_sends_nothing() {
        let mut session = ready_session(DemoAdapter::new());
        assert!(session.read_stored_dtcs(0).unwrap().is_empty());
        assert!(!session.transport().commands().contains(&"03".to_string()));
    }

    #[test]
    fn test_read_dtcs_with_freeze_frame() {
        let adapter = DemoAdapter::new().reply("07", "47 01 33 00 00 00 00");
        let mut session = ready_session(adapter);
        let codes = session.read_dtcs().unwrap();
        assert_eq!(
            codes,
            vec![
                DtcCode::new(DtcStatus::Active, "P0133".to_string()),
                DtcCode::new(DtcStatus::Active, "P0300".to_string()),
                DtcCode::new(DtcStatus::Freeze, "P0133".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_dtcs_without_freeze_frame() {
        let mut session = ready_session(DemoAdapter::new());
        let codes = session.read_dtcs().unwrap();
        assert_eq!(codes.len(), 2);
        assert!(codes.iter().all(|c| c.status == DtcStatus::Active));
    }

    #[test]
    fn test_clear_dtcs() {
        let mut session = ready_session(DemoAdapter::new());
        assert_eq!(session.clear_dtcs().unwrap(), "44");
    }

    #[test]
    fn test_read_stored_dtcs_zero_fill_requests_next_packet() {
        let adapter = DemoAdapter::new()
            .reply("03", "43 01 33 00 00 00 00")
            .then_reply("03", "43 03 00 01 01 C1 23");
        let mut session = ready_session(adapter);
        let codes: Vec<String> = session
            .read_stored_dtcs(4)
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(codes, vec!["P0133", "P0300", "P0101", "U0123"]);
        assert_eq!(dtc_requests(&session), 2);
    }

    #[test]
    fn test_read_stored_dtcs_single_code_one_packet() {
        let adapter = DemoAdapter::new()
            .reply("03", "43 01 33 00 00 00 00")
            .then_reply("03", "43 03 00 01 01 C1 23");
        let mut session = ready_session(adapter);
        let codes = session.read_stored_dtcs(1).unwrap();
        assert_eq!(codes, vec![DtcCode::new(DtcStatus::Active, "P0133".to_string())]);
        assert_eq!(dtc_requests(&session), 1);
    }

    /// Lets a test keep looking at an adapter after the session consumed it
    struct SharedAdapter(Rc<RefCell<DemoAdapter>>);

    impl Transport for SharedAdapter {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            self.0.borrow_mut().read_byte()
        }

        fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
            self.0.borrow_mut().write_bytes(data)
        }

        fn discard_buffers(&mut self) -> io::Result<()> {
            self.0.borrow_mut().discard_buffers()
        }

        fn close(&mut self) -> io::Result<()> {
            self.0.borrow_mut().close()
        }
    }

    #[test]
    fn test_close_resets_adapter() {
        let adapter = Rc::new(RefCell::new(DemoAdapter::new()));
        let session =
            ProtocolSession::open(SharedAdapter(Rc::clone(&adapter)), quick_config()).unwrap();
        session.close().unwrap();

        let adapter = adapter.borrow();
        assert_eq!(adapter.commands().last().unwrap(), "ATZ");
        assert!(adapter.is_closed());
    }

    #[test]
    fn test_close_failed_session_skips_reset() {
        let adapter = Rc::new(RefCell::new(DemoAdapter::blank()));
        let mut session = ProtocolSession::new(SharedAdapter(Rc::clone(&adapter)), quick_config());
        assert!(session.connect().is_err());
        assert_eq!(session.state(), ConnectionState::Failed);
        session.close().unwrap();

        let adapter = adapter.borrow();
        assert_eq!(adapter.commands(), ["ATZ"]);
        assert!(adapter.is_closed());
    }
}
