//! Demo Mode - Simulated ELM327 adapter
//!
//! A scripted in-memory [`Transport`] that answers commands the way an
//! ELM327 attached to an idling car would. Useful for exercising a session
//! without hardware.
//!
//! Each command maps to a queue of replies. Replies are served in order and
//! the last one repeats. The default adapter answers unscripted commands with
//! `?`; a blank adapter ignores them.

use std::collections::{HashMap, VecDeque};
use std::io;

use crate::protocol::Transport;

/// Terminator appended to every scripted reply
const REPLY_END: &[u8] = b"\r\r>";

/// Replies of an adapter on a car with two stored codes and MIL on
const DEFAULT_SCRIPT: &[(&str, &str)] = &[
    ("ATZ", "\r\rELM327 v1.5"),
    ("ATE0", "OK"),
    ("0100", "41 00 BE 1F A8 13"),
    ("0101", "41 01 82 07 65 04"),
    ("0103", "41 03 02 00"),
    ("0104", "41 04 64"),
    ("0105", "41 05 7B"),
    ("0106", "41 06 80"),
    ("0107", "41 07 84"),
    ("010C", "41 0C 1A F8"),
    ("010D", "41 0D 32"),
    ("010E", "41 0E 8A"),
    ("010F", "41 0F 44"),
    ("0110", "41 10 01 2C"),
    ("0111", "41 11 26"),
    ("0113", "41 13 03"),
    ("0115", "NO DATA"),
    ("011C", "41 1C 01"),
    ("011F", "41 1F 02 58"),
    ("014D", "NO DATA"),
    ("03", "43 01 33 03 00 00 00"),
    ("04", "44"),
    ("07", "NO DATA"),
];

/// Simulated adapter
#[derive(Debug, Default)]
pub struct DemoAdapter {
    /// Replies per command
    script: HashMap<String, VecDeque<Vec<u8>>>,
    /// Bytes waiting to be read
    pending: VecDeque<u8>,
    /// Command being received
    line: Vec<u8>,
    /// Every byte written by the host
    written: Vec<u8>,
    /// Every complete command received
    commands: Vec<String>,
    /// Whether the host closed the channel
    closed: bool,
    /// Answer unscripted commands with `?`
    answer_unknown: bool,
}

impl DemoAdapter {
    /// Create an adapter with the default car script
    pub fn new() -> Self {
        let adapter = Self {
            answer_unknown: true,
            ..Self::blank()
        };
        DEFAULT_SCRIPT
            .iter()
            .fold(adapter, |adapter, (cmd, text)| adapter.reply(cmd, text))
    }

    /// Create an adapter that answers nothing until scripted
    pub fn blank() -> Self {
        Self::default()
    }

    /// Replace the replies to `cmd` with `text` followed by the prompt
    pub fn reply(mut self, cmd: &str, text: &str) -> Self {
        self.script.remove(&cmd.to_uppercase());
        self.then_reply(cmd, text)
    }

    /// Queue another reply to `cmd` after the existing ones
    pub fn then_reply(self, cmd: &str, text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.extend_from_slice(REPLY_END);
        self.then_reply_raw(cmd, &bytes)
    }

    /// Queue raw reply bytes to `cmd`, no prompt added
    pub fn then_reply_raw(mut self, cmd: &str, bytes: &[u8]) -> Self {
        self.script
            .entry(cmd.to_uppercase())
            .or_default()
            .push_back(bytes.to_vec());
        self
    }

    /// Never answer `cmd`
    pub fn silent(mut self, cmd: &str) -> Self {
        self.script.remove(&cmd.to_uppercase());
        self.then_reply_raw(cmd, b"")
    }

    /// Commands received so far, in order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Raw bytes written by the host
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Whether the host closed the channel
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn respond(&mut self, command: String) {
        let reply = match self.script.get_mut(&command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None if self.answer_unknown => [b"?".as_slice(), REPLY_END].concat(),
            None => Vec::new(),
        };
        self.commands.push(command);
        self.pending.extend(reply);
    }
}

impl Transport for DemoAdapter {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.pending.pop_front())
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "adapter closed"));
        }
        self.written.extend_from_slice(data);
        for &byte in data {
            match byte {
                b'\r' => {
                    let command = String::from_utf8_lossy(&self.line).trim().to_uppercase();
                    self.line.clear();
                    if !command.is_empty() {
                        self.respond(command);
                    }
                }
                b'\n' => {}
                other => self.line.push(other),
            }
        }
        Ok(())
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.pending.clear();
        Ok(())
    }
}
