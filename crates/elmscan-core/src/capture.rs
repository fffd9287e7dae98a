//! Capture
//!
//! Finds an adapter among candidate ports and takes a snapshot of every
//! parameter the vehicle reports as supported.

use chrono::{Local, NaiveTime};
use std::fmt;
use tracing::{info, warn};

use crate::protocol::{
    list_ports, ConnectError, ProtocolSession, QueryError, SessionConfig, Transport,
};
use crate::sensors::{ParameterDescriptor, SensorReading};

/// Try each candidate in turn and keep the first session that connects
///
/// `open` is responsible for opening the candidate and running the
/// handshake. A failed candidate's transport is dropped before the next one
/// is tried.
pub fn connect_first<C, T, F>(candidates: impl IntoIterator<Item = C>, mut open: F) -> Result<ProtocolSession<T>, ConnectError>
where
    C: fmt::Display,
    T: Transport,
    F: FnMut(&C) -> Result<ProtocolSession<T>, ConnectError>,
{
    for candidate in candidates {
        match open(&candidate) {
            Ok(session) => {
                info!("Connected to {}", candidate);
                return Ok(session);
            }
            Err(e) => warn!("No adapter on {}: {}", candidate, e),
        }
    }
    Err(ConnectError::NoAdapter)
}

/// Scan the system's serial ports and connect to the first adapter found
///
/// Every setting except the port name is taken from `config`.
pub fn scan_and_connect(config: &SessionConfig) -> Result<ProtocolSession, ConnectError> {
    let names: Vec<String> = list_ports().into_iter().map(|p| p.name).collect();
    info!("Candidate ports: {:?}", names);
    connect_first(names, |name: &String| {
        ProtocolSession::open_serial(SessionConfig {
            port_name: name.clone(),
            ..config.clone()
        })
    })
}

/// Outcome of querying one parameter during a capture
#[derive(Debug)]
pub struct CaptureEntry {
    /// The queried parameter
    pub descriptor: &'static ParameterDescriptor,
    /// Reading, or why there is none
    pub outcome: Result<SensorReading, QueryError>,
}

impl fmt::Display for CaptureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(reading) => write!(
                f,
                "{} = {} {}",
                self.descriptor.display_name, reading.value, reading.unit
            ),
            Err(QueryError::NoData(_)) => write!(
                f,
                "{} = NODATA {}",
                self.descriptor.display_name, self.descriptor.unit
            ),
            Err(_) => write!(
                f,
                "{} = NORESPONSE {}",
                self.descriptor.display_name, self.descriptor.unit
            ),
        }
    }
}

/// A timestamped snapshot of all supported parameters
///
/// Renders as the timestamp line `HH:MM:SS.mmm` followed by one
/// `"<name> = <value> <unit>"` line per parameter.
#[derive(Debug)]
pub struct Capture {
    /// Local time the capture started
    pub timestamp: NaiveTime,
    /// One entry per supported parameter, in table order
    pub entries: Vec<CaptureEntry>,
}

impl Capture {
    /// Query every supported parameter once
    ///
    /// Only the capability probe can fail the capture; individual parameter
    /// failures are recorded in their entries.
    pub fn take<T: Transport>(session: &mut ProtocolSession<T>) -> Result<Self, QueryError> {
        let supported = session.supported_parameters()?;
        for descriptor in &supported {
            info!(
                "Supported sensor index = {} {}",
                descriptor.index, descriptor.short_name
            );
        }

        let timestamp = Local::now().time();
        let entries = supported
            .into_iter()
            .map(|descriptor| CaptureEntry {
                descriptor,
                outcome: session.query_pid(descriptor.index),
            })
            .collect();

        Ok(Self { timestamp, entries })
    }
}

impl fmt::Display for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.timestamp.format("%H:%M:%S%.3f"))?;
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
