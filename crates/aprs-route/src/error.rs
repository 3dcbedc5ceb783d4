//! Error types for the router

use aprs_packet::{FormatError, ParseError};
use thiserror::Error;

use crate::engine::IgnoreReason;

/// Errors in router configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Router callsign missing or malformed
    #[error("invalid router callsign: {0}")]
    InvalidCallsign(#[source] ParseError),

    /// A rules-text entry is not a callsign
    #[error("invalid rule entry {entry:?}: {source}")]
    InvalidEntry {
        entry: String,
        #[source]
        source: ParseError,
    },

    /// A rule built by hand (or loaded from settings) is inconsistent
    #[error("invalid rule {rule:?}: {reason}")]
    InvalidRule { rule: String, reason: String },
}

/// Errors from the one-shot routing API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The router decided not to repeat the packet
    #[error("packet not routed: {0}")]
    Ignored(IgnoreReason),
}
