use elmscan_core::protocol::{
    ConnectError, ConnectionState, FrameError, ProtocolSession, QueryError, RawInterpreted,
    SessionConfig, Transport,
};
use elmscan_core::sensors::SensorValue;
use std::io;

/// Mock serial port replaying a fixed byte stream
struct MockSerial {
    send_buffer: Vec<u8>,
    recv_buffer: Vec<u8>,
    recv_idx: usize,
    fail_on_send: bool,
    fail_on_read: bool,
}

impl MockSerial {
    fn new() -> Self {
        Self::with_response(Vec::new())
    }

    fn with_response(response: impl Into<Vec<u8>>) -> Self {
        Self {
            send_buffer: Vec::new(),
            recv_buffer: response.into(),
            recv_idx: 0,
            fail_on_send: false,
            fail_on_read: false,
        }
    }
}

impl Transport for MockSerial {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.fail_on_read {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        if self.recv_idx < self.recv_buffer.len() {
            let byte = self.recv_buffer[self.recv_idx];
            self.recv_idx += 1;
            Ok(Some(byte))
        } else {
            Ok(None)
        }
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.fail_on_send {
            return Err(io::Error::new(io::ErrorKind::Other, "Serial write failed"));
        }
        self.send_buffer.extend_from_slice(buf);
        Ok(())
    }

    // The whole conversation is preloaded, so nothing may be dropped here
    fn discard_buffers(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const HANDSHAKE: &str = "\r\rELM327 v1.5\r\r>OK\r\r>4100BE1FA813\r\r>";

fn config() -> SessionConfig {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    SessionConfig {
        reset_settle_ms: 0,
        ..SessionConfig::default()
    }
}

fn connected(after_handshake: &str) -> ProtocolSession<MockSerial> {
    let mock = MockSerial::with_response(format!("{}{}", HANDSHAKE, after_handshake));
    ProtocolSession::open(mock, config()).unwrap()
}

#[test]
fn test_handshake_end_to_end() {
    let session = connected("");
    assert_eq!(session.state(), ConnectionState::Ready);
    assert_eq!(session.adapter_version(), Some("ELM327 v1.5"));
    assert_eq!(session.transport().send_buffer, b"ATZ\r\nATE0\r\n0100\r\n".to_vec());

    // BE1FA813, most significant bit first
    let expected: Vec<bool> = "10111110000111111010100000010011"
        .chars()
        .map(|c| c == '1')
        .collect();
    assert_eq!(session.capability_bitmap().unwrap(), expected.as_slice());
}

#[test]
fn test_handshake_timeout_at_echo_off() {
    let mock = MockSerial::with_response("ELM327 v1.5>");
    let mut session = ProtocolSession::new(mock, config());
    let err = session.connect().unwrap_err();
    assert!(matches!(
        err,
        ConnectError::Handshake {
            command: "ATE0",
            source: FrameError::Timeout
        }
    ));
    assert_eq!(session.state(), ConnectionState::Failed);
}

#[test]
fn test_handshake_write_failure() {
    let mut mock = MockSerial::new();
    mock.fail_on_send = true;
    let mut session = ProtocolSession::new(mock, config());
    assert!(matches!(session.connect(), Err(ConnectError::Io(_))));
    assert_eq!(session.state(), ConnectionState::Failed);
}

#[test]
fn test_handshake_read_failure() {
    let mut mock = MockSerial::new();
    mock.fail_on_read = true;
    let result = ProtocolSession::open(mock, config());
    assert!(matches!(
        result,
        Err(ConnectError::Handshake {
            command: "ATZ",
            source: FrameError::Io(_)
        })
    ));
}

#[test]
fn test_query_after_handshake() {
    let mut session = connected("41 0C 01 90\r\r>");
    let reading = session.query_pid(12).unwrap();
    assert_eq!(reading.value, SensorValue::Number(100.0));
    assert!(session.transport().send_buffer.ends_with(b"010C\r\n"));
}

#[test]
fn test_query_raw_no_data_any_case() {
    let mut session = connected("no data\r\r>");
    assert_eq!(session.query_raw("0110").unwrap(), RawInterpreted::NoData);
}

#[test]
fn test_query_failures_are_local() {
    let mut session = connected("NO DATA\r\r>41 0D 32\r\r>");
    assert!(matches!(session.query_pid(16), Err(QueryError::NoData(16))));
    let speed = session.query_pid(13).unwrap();
    assert!((speed.value.as_f64().unwrap() - 31.075).abs() < 0.001);
    // Stream is exhausted now
    assert!(matches!(session.query_pid(13), Err(QueryError::NoResponse)));
    assert_eq!(session.state(), ConnectionState::Ready);
}

#[test]
fn test_supported_parameters_requery() {
    let mut session = connected("41 00 80 00 00 01\r\r>");
    let supported: Vec<&str> = session
        .supported_parameters()
        .unwrap()
        .iter()
        .map(|p| p.short_name)
        .collect();
    assert_eq!(supported, vec!["dtc_status", "engine_mil_time"]);
}

#[test]
fn test_read_dtcs_from_stream() {
    let stream = concat!(
        "41 01 83 07 65 04\r\r>",
        "43 01 33 03 00 01 01\r\r>",
        "NO DATA\r\r>",
    );
    let mut session = connected(stream);
    let codes: Vec<String> = session
        .read_dtcs()
        .unwrap()
        .into_iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, vec!["P0133", "P0300", "P0101"]);
}
