//! APRS Digipeater Path Router
//!
//! This crate decides whether a digipeater repeats an APRS packet and
//! rewrites the packet's path when it does.
//!
//! # Architecture
//!
//! The router is configured with its own callsign and a list of alias rules
//! (`WIDE1`, `WIDE2-2`, `RELAY`). For each packet it examines the first hop
//! that has not yet repeated it:
//!
//! - **Explicit routing**: the hop is the router's callsign and gets marked used
//! - **n-N routing**: the hop is a `WIDEn-N` style alias; the router consumes
//!   one hop and inserts its callsign
//! - **Explicit aliases**: the hop is a configured alias such as `RELAY`
//!
//! Routing is pure: the input packet is never modified and nothing is
//! remembered between calls.
//!
//! # Example
//!
//! ```rust
//! use aprs_packet::Packet;
//! use aprs_route::{RouteOutcome, Router, RouterConfig};
//!
//! let config = RouterConfig::from_rules("DIGI", "WIDE1,WIDE2").unwrap();
//! let router = Router::new(config);
//!
//! let packet: Packet = "N0CALL>APRS,WIDE1-1,WIDE2-1:data".parse().unwrap();
//! if let RouteOutcome::Repeat(routed) = router.route(&packet) {
//!     assert_eq!(routed.to_string(), "N0CALL>APRS,DIGI*,WIDE1,WIDE2-1:data");
//! }
//! ```

pub mod boundary;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;

pub use boundary::{route_packet, try_route_packet};
pub use config::{parse_rules, AliasRule, DecrementPolicy, RouterConfig};
pub use diagnostics::{ActionKind, AnnotatedLine, RouteReport, RoutingAction};
pub use engine::{route, IgnoreReason, RouteOutcome, Router};
pub use error::{ConfigError, RouteError};
