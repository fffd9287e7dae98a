//! Response framing
//!
//! Assembles the bytes following a command into one response string, ending
//! at the adapter's `>` prompt.

use tracing::{debug, trace, warn};

use super::{FrameError, Transport, MAX_EMPTY_READS, MAX_RESPONSE_LEN, PROMPT};

/// Reads one prompt-terminated response at a time
///
/// Holds no state between calls. `max_empty_reads` bounds how many
/// consecutive read timeouts are tolerated before giving up.
#[derive(Debug, Clone, Copy)]
pub struct ResponseFramer {
    max_empty_reads: u32,
}

impl Default for ResponseFramer {
    fn default() -> Self {
        Self::new(MAX_EMPTY_READS)
    }
}

impl ResponseFramer {
    /// Create a framer that gives up after `max_empty_reads` consecutive
    /// empty reads
    pub fn new(max_empty_reads: u32) -> Self {
        Self { max_empty_reads }
    }

    /// Read bytes until the prompt and return the text before it
    ///
    /// Carriage returns are dropped. A received byte resets the empty-read
    /// counter. More than [`MAX_RESPONSE_LEN`] bytes without a prompt is an
    /// overflow.
    pub fn read_one<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<String, FrameError> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut empty_reads = 0u32;

        loop {
            match transport.read_byte()? {
                None => {
                    empty_reads += 1;
                    trace!("read_one: empty read {}/{}", empty_reads, self.max_empty_reads);
                    if empty_reads >= self.max_empty_reads {
                        debug!(
                            "read_one: giving up after {} empty reads ({} bytes buffered)",
                            empty_reads,
                            buffer.len()
                        );
                        return Err(FrameError::Timeout);
                    }
                }
                Some(b'\r') => empty_reads = 0,
                Some(PROMPT) => break,
                Some(byte) => {
                    empty_reads = 0;
                    if buffer.len() >= MAX_RESPONSE_LEN {
                        warn!("read_one: no prompt within {} bytes", MAX_RESPONSE_LEN);
                        return Err(FrameError::Overflow(MAX_RESPONSE_LEN));
                    }
                    buffer.push(byte);
                }
            }
        }

        if buffer.is_empty() {
            return Err(FrameError::Empty);
        }

        let text = String::from_utf8_lossy(&buffer).into_owned();
        debug!("read_one: {:?}", text);
        Ok(text)
    }
}
