//! APRS Packet Library
//!
//! Parsing and formatting of APRS packets in TNC2 text form:
//!
//! ```text
//! SOURCE>DEST,PATH1,PATH2*,WIDE2-1:payload
//! ```
//!
//! - **Callsigns**: base plus optional SSID, compared case-insensitively
//! - **Path elements**: hops with a used flag (`*`) and `NAMEn-N` alias budgets
//! - **Packets**: bounded path, verbatim payload, exact-size formatting
//! - **Codec**: line-oriented streaming input
//!
//! # Example
//!
//! ```rust
//! use aprs_packet::Packet;
//!
//! let packet: Packet = "N0CALL>APRS,WIDE1-1:hello".parse().unwrap();
//! assert_eq!(packet.path[0].hops().map(|h| h.remaining), Some(1));
//!
//! let text = packet.format(64).unwrap();
//! assert_eq!(text, "N0CALL>APRS,WIDE1-1:hello");
//! ```

pub mod callsign;
pub mod codec;
pub mod error;
pub mod packet;
pub mod path;

pub use callsign::Callsign;
pub use codec::PacketCodec;
pub use error::{FormatError, ParseError};
pub use packet::Packet;
pub use path::{AliasHops, PathElement};

/// Maximum number of digipeater path elements in a packet
pub const MAX_HOPS: usize = 8;
