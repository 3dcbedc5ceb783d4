//! Streaming TNC2 line codec
//!
//! Packets arrive as text lines terminated by `\n` (optionally `\r\n`), e.g.
//! from a KISS-less TNC monitor port or a pipe. The codec buffers partial
//! input and yields complete packets as they become available.

use crate::error::ParseError;
use crate::packet::Packet;

/// Maximum line length kept while waiting for a terminator
pub const MAX_LINE_LEN: usize = 512;

/// Streaming line-oriented packet codec
#[derive(Debug)]
pub struct PacketCodec {
    buffer: Vec<u8>,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Push raw bytes into the buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // A line this long without a terminator is noise; keep the tail
        if self.buffer.len() > MAX_LINE_LEN * 4 && !self.buffer.contains(&b'\n') {
            let start = self.buffer.len() - MAX_LINE_LEN;
            self.buffer.drain(..start);
        }
    }

    /// Next complete non-empty line, without its terminator
    ///
    /// Lines that are not valid UTF-8 are logged and skipped.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let term_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let mut raw: Vec<u8> = self.buffer.drain(..=term_pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            if raw.is_empty() {
                continue;
            }

            match String::from_utf8(raw) {
                Ok(line) => return Some(line),
                Err(e) => tracing::warn!(
                    "Dropping line that is not valid UTF-8 ({} bytes): {}",
                    e.as_bytes().len(),
                    e.utf8_error()
                ),
            }
        }
    }

    /// Next line that parses as a packet
    ///
    /// Malformed lines are logged and skipped.
    pub fn next_packet(&mut self) -> Option<Packet> {
        self.next_packet_with_line().map(|(packet, _)| packet)
    }

    /// Next packet along with the line it was parsed from
    pub fn next_packet_with_line(&mut self) -> Option<(Packet, String)> {
        loop {
            let line = self.next_line()?;
            match Packet::parse(&line) {
                Ok(packet) => return Some((packet, line)),
                Err(e) => log_rejected(&line, &e),
            }
        }
    }

    /// Bytes buffered but not yet terminated
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any buffered input
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn log_rejected(line: &str, error: &ParseError) {
    tracing::warn!("Failed to parse packet {:?}: {}", line, error);
}
