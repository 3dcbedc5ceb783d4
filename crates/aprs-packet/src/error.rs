//! Error types for packet parsing and formatting

use thiserror::Error;

/// Errors that can occur while parsing packet text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The `>` after the source or the `:` before the payload is missing
    #[error("missing separator '{0}'")]
    MissingSeparator(char),

    /// Source, destination or a path element is empty
    #[error("empty callsign")]
    EmptyCallsign,

    /// More path elements than the protocol allows
    #[error("too many hops: {count} (max {max})")]
    TooManyHops { count: usize, max: usize },

    /// SSID suffix is empty, non-numeric, zero-padded or out of range
    #[error("malformed SSID: {0}")]
    MalformedSsid(String),

    /// Base callsign is too long or contains non-alphanumeric characters
    #[error("invalid callsign: {0}")]
    InvalidCallsign(String),
}

/// Errors that can occur while formatting a packet
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Output does not fit; retry with at least `required` bytes
    #[error("buffer too small: need {required} bytes, have {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },

    /// Packet was built by hand with more path elements than allowed
    #[error("too many hops: {count} (max {max})")]
    TooManyHops { count: usize, max: usize },
}
