//! One-shot text routing
//!
//! Convenience entry points that take packet text, a router callsign and
//! rules text, and produce routed packet text. [`try_route_packet`] keeps the
//! boolean contract of embedded digipeater firmware: callers pass a fixed
//! output buffer and, when it is too small, learn the size they need.

use aprs_packet::{FormatError, Packet};
use tracing::debug;

use crate::config::RouterConfig;
use crate::engine::{route, RouteOutcome};
use crate::error::RouteError;

/// Route packet text and return the routed text
///
/// `max_bytes` bounds the length of the result.
pub fn route_packet(
    packet: &str,
    router_callsign: &str,
    router_path_rules: &str,
    max_bytes: usize,
) -> Result<String, RouteError> {
    let routed = route_text(packet, router_callsign, router_path_rules)?;
    Ok(routed.format(max_bytes)?)
}

/// Route packet text into `out`
///
/// Returns `true` only when the packet is repeated and fits; `size` then
/// holds the number of bytes written. When `out` is too small, `size` holds
/// the number of bytes required and `false` is returned. Every other failure
/// returns `false` and leaves `size` unchanged.
pub fn try_route_packet(
    packet: &str,
    router_callsign: &str,
    router_path_rules: &str,
    out: &mut [u8],
    size: &mut usize,
) -> bool {
    let result = route_text(packet, router_callsign, router_path_rules)
        .and_then(|routed| routed.write_to(out).map_err(RouteError::from));

    match result {
        Ok(written) => {
            *size = written;
            true
        }
        Err(RouteError::Format(FormatError::BufferTooSmall { required, .. })) => {
            *size = required;
            false
        }
        Err(e) => {
            debug!("Packet not routed: {}", e);
            false
        }
    }
}

fn route_text(
    packet: &str,
    router_callsign: &str,
    router_path_rules: &str,
) -> Result<Packet, RouteError> {
    let config = RouterConfig::from_rules(router_callsign, router_path_rules)?;
    let packet = Packet::parse(packet)?;

    match route(&packet, &config) {
        RouteOutcome::Repeat(routed) => Ok(routed),
        RouteOutcome::Ignore(reason) => Err(RouteError::Ignored(reason)),
    }
}
