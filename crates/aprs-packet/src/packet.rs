//! TNC2 packet text
//!
//! # Format
//! - `SOURCE>DEST[,HOP...]:PAYLOAD`
//! - `>` ends the source, the first `,` ends the destination
//! - the first `:` after `>` ends the header; the payload may contain more `:`
//!
//! ```text
//! N0CALL>APRS,CALLA,CALLB*,WIDE2-1:data
//! ~~~~~~ ~~~~ ~~~~~~~~~~~~~~~~~~~~ ~~~~
//! source dest path                 payload
//! ```

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::callsign::Callsign;
use crate::error::{FormatError, ParseError};
use crate::path::PathElement;
use crate::MAX_HOPS;

/// A parsed packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Originating station
    pub source: Callsign,
    /// Destination (tocall)
    pub destination: Callsign,
    /// Digipeater path in hop order
    pub path: Vec<PathElement>,
    /// Everything after the header, verbatim
    pub payload: String,
}

impl Packet {
    pub fn new(
        source: Callsign,
        destination: Callsign,
        path: Vec<PathElement>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            source,
            destination,
            path,
            payload: payload.into(),
        }
    }

    /// Parse packet text
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (source, rest) = text
            .split_once('>')
            .ok_or(ParseError::MissingSeparator('>'))?;
        let (header, payload) = rest
            .split_once(':')
            .ok_or(ParseError::MissingSeparator(':'))?;

        let mut fields = header.split(',');
        // split always yields at least one item
        let destination = fields.next().unwrap_or_default();

        let hops: Vec<&str> = fields.collect();
        if hops.len() > MAX_HOPS {
            return Err(ParseError::TooManyHops {
                count: hops.len(),
                max: MAX_HOPS,
            });
        }

        let path = hops
            .into_iter()
            .map(PathElement::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: Callsign::parse(source)?,
            destination: Callsign::parse(destination)?,
            path,
            payload: payload.to_string(),
        })
    }

    /// Exact number of bytes [`Packet::format`] produces
    pub fn encoded_len(&self) -> usize {
        let path_len: usize = self.path.iter().map(|e| e.encoded_len() + 1).sum();
        self.source.encoded_len()
            + 1
            + self.destination.encoded_len()
            + path_len
            + 1
            + self.payload.len()
    }

    /// Serialize to text no longer than `max_bytes`
    pub fn format(&self, max_bytes: usize) -> Result<String, FormatError> {
        self.check_hops()?;

        let required = self.encoded_len();
        if required > max_bytes {
            return Err(FormatError::BufferTooSmall {
                required,
                capacity: max_bytes,
            });
        }

        Ok(self.to_string())
    }

    /// Serialize into a caller-provided buffer, returning the bytes written
    ///
    /// Nothing is written when the packet does not fit.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, FormatError> {
        let text = self.format(buf.len())?;
        buf[..text.len()].copy_from_slice(text.as_bytes());
        Ok(text.len())
    }

    /// Index of the most recent hop marked `*`
    pub fn last_used_index(&self) -> Option<usize> {
        self.path.iter().rposition(|e| e.used)
    }

    /// Byte range of a path element within the formatted text
    pub fn element_range(&self, index: usize) -> Option<Range<usize>> {
        let element = self.path.get(index)?;
        let start = self.source.encoded_len()
            + 1
            + self.destination.encoded_len()
            + self.path[..index]
                .iter()
                .map(|e| e.encoded_len() + 1)
                .sum::<usize>()
            + 1;
        Some(start..start + element.encoded_len())
    }

    fn check_hops(&self) -> Result<(), FormatError> {
        if self.path.len() > MAX_HOPS {
            return Err(FormatError::TooManyHops {
                count: self.path.len(),
                max: MAX_HOPS,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source, self.destination)?;
        for element in &self.path {
            write!(f, ",{}", element)?;
        }
        write!(f, ":{}", self.payload)
    }
}

impl FromStr for Packet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
