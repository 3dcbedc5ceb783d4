//! Path routing engine
//!
//! Decides whether a digipeater repeats a packet and rewrites the path when
//! it does. Only the first hop that has not yet repeated the packet is
//! considered:
//!
//! 1. A packet the router already repeated, or sent itself, is ignored.
//! 2. A packet addressed to the router is for this station, not via it.
//! 3. The hop after the last `*` is examined (exhausted aliases of a
//!    configured family count as consumed).
//! 4. The router's own callsign is marked used; otherwise the first matching
//!    alias rule decides how the router callsign enters the path.

use std::fmt;

use aprs_packet::{Callsign, Packet, PathElement, MAX_HOPS};
use tracing::debug;

use crate::config::{AliasRule, DecrementPolicy, RouterConfig};
use crate::diagnostics::{ActionKind, RouteReport, RoutingAction};

/// Why a packet is not repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// The router already repeated the packet, or originated it
    AlreadyRelayedOrOwnPacket,
    /// The packet is addressed to the router itself
    AddressedToRouter,
    /// Every hop in the path has been used
    PathExhausted,
    /// An alias asks for more hops than the matching rule allows
    HopLimitExceeded,
    /// The next hop is neither the router nor a configured alias
    NoApplicableRoute,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::AlreadyRelayedOrOwnPacket => "already relayed or own packet",
            IgnoreReason::AddressedToRouter => "addressed to router",
            IgnoreReason::PathExhausted => "path exhausted",
            IgnoreReason::HopLimitExceeded => "hop limit exceeded",
            IgnoreReason::NoApplicableRoute => "no applicable route",
        };
        f.write_str(text)
    }
}

/// Result of routing one packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Repeat the packet with this rewritten path
    Repeat(Packet),
    /// Do not repeat the packet
    Ignore(IgnoreReason),
}

impl RouteOutcome {
    pub fn is_repeat(&self) -> bool {
        matches!(self, RouteOutcome::Repeat(_))
    }

    /// The routed packet, if repeated
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            RouteOutcome::Repeat(packet) => Some(packet),
            RouteOutcome::Ignore(_) => None,
        }
    }

    pub fn into_packet(self) -> Option<Packet> {
        match self {
            RouteOutcome::Repeat(packet) => Some(packet),
            RouteOutcome::Ignore(_) => None,
        }
    }
}

/// A digipeater path router
///
/// Immutable once built; share it freely between threads.
#[derive(Debug, Clone)]
pub struct Router {
    config: RouterConfig,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route a packet
    pub fn route(&self, packet: &Packet) -> RouteOutcome {
        route_with_log(&self.config, packet, None)
    }

    /// Route a packet and record every change made to its path
    pub fn route_with_diagnostics(&self, packet: &Packet) -> RouteReport {
        let mut actions = Vec::new();
        let outcome = route_with_log(&self.config, packet, Some(&mut actions));

        // Ranges depend on the final path, so resolve them last
        let actions = match &outcome {
            RouteOutcome::Repeat(routed) => actions
                .into_iter()
                .map(|(kind, index)| RoutingAction::new(kind, index, routed))
                .collect(),
            RouteOutcome::Ignore(_) => Vec::new(),
        };

        RouteReport { outcome, actions }
    }
}

/// Route a packet with the given configuration
pub fn route(packet: &Packet, config: &RouterConfig) -> RouteOutcome {
    route_with_log(config, packet, None)
}

type ActionLog<'a> = Option<&'a mut Vec<(ActionKind, usize)>>;

fn route_with_log(
    config: &RouterConfig,
    packet: &Packet,
    mut log: ActionLog<'_>,
) -> RouteOutcome {
    let router = &config.callsign;

    if packet.source == *router
        || packet
            .path
            .iter()
            .any(|e| e.used && e.callsign() == router)
    {
        return ignore(packet, IgnoreReason::AlreadyRelayedOrOwnPacket);
    }

    if packet.destination == *router {
        return ignore(packet, IgnoreReason::AddressedToRouter);
    }

    let Some(index) = next_unused(config, packet) else {
        return ignore(packet, IgnoreReason::PathExhausted);
    };

    let element = &packet.path[index];
    let mut routed = packet.clone();

    if element.callsign() == router {
        routed.path[index].used = true;
        record(&mut log, ActionKind::Set, index);
        debug!("Explicit route via {} at position {}", router, index);
        return RouteOutcome::Repeat(routed);
    }

    let Some(rule) = config.find_rule(element) else {
        return ignore(packet, IgnoreReason::NoApplicableRoute);
    };

    if rule.matches_alias(element) {
        route_alias(router, rule, routed, index, &mut log)
    } else {
        RouteOutcome::Repeat(route_explicit_alias(router, rule, routed, index, &mut log))
    }
}

/// Index of the first hop that has not repeated the packet
fn next_unused(config: &RouterConfig, packet: &Packet) -> Option<usize> {
    let start = packet.last_used_index().map_or(0, |i| i + 1);

    (start..packet.path.len()).find(|&i| {
        let element = &packet.path[i];
        !(element.is_exhausted() && config.covers_family(element))
    })
}

fn route_alias(
    router: &Callsign,
    rule: &AliasRule,
    mut routed: Packet,
    index: usize,
    log: &mut ActionLog<'_>,
) -> RouteOutcome {
    let full = routed.path.len() >= MAX_HOPS;
    let alias = &mut routed.path[index];

    if let Some(hops) = alias.hops().filter(|&hops| rule.exceeds_limit(hops)) {
        match rule.policy {
            DecrementPolicy::Trap => {
                debug!("Trapped {} ({} hops remaining)", alias, hops.remaining);
                *alias = PathElement::new(router.clone(), true);
                record(log, ActionKind::Replace, index);
                return RouteOutcome::Repeat(routed);
            }
            DecrementPolicy::Reject => {
                debug!("Rejected {} ({} hops remaining)", alias, hops.remaining);
                return RouteOutcome::Ignore(IgnoreReason::HopLimitExceeded);
            }
            DecrementPolicy::Decrement => {}
        }
    }

    let exhausted = alias.decrement() == Some(0);

    if exhausted && rule.substitute {
        debug!("Substituted {} with {}", alias, router);
        *alias = PathElement::new(router.clone(), true);
        record(log, ActionKind::Replace, index);
    } else if full {
        // No room to insert
        record(log, ActionKind::Decrement, index);
        if exhausted {
            alias.used = true;
            record(log, ActionKind::Set, index);
        }
        debug!("Path full, decremented {} in place", alias);
    } else {
        debug!("Inserted {} before {}", router, alias);
        routed
            .path
            .insert(index, PathElement::new(router.clone(), true));
        record(log, ActionKind::Decrement, index + 1);
        record(log, ActionKind::Insert, index);
    }

    RouteOutcome::Repeat(routed)
}

fn route_explicit_alias(
    router: &Callsign,
    rule: &AliasRule,
    mut routed: Packet,
    index: usize,
    log: &mut ActionLog<'_>,
) -> Packet {
    if rule.substitute || routed.path.len() >= MAX_HOPS {
        debug!("Replaced alias {} with {}", routed.path[index], router);
        routed.path[index] = PathElement::new(router.clone(), true);
        record(log, ActionKind::Replace, index);
    } else {
        debug!("Inserted {} before alias {}", router, routed.path[index]);
        routed
            .path
            .insert(index, PathElement::new(router.clone(), true));
        routed.path[index + 1].used = true;
        record(log, ActionKind::Insert, index);
        record(log, ActionKind::Set, index + 1);
    }
    routed
}

fn record(log: &mut ActionLog<'_>, kind: ActionKind, index: usize) {
    if let Some(actions) = log.as_deref_mut() {
        actions.push((kind, index));
    }
}

fn ignore(packet: &Packet, reason: IgnoreReason) -> RouteOutcome {
    debug!("Ignoring packet from {}: {}", packet.source, reason);
    RouteOutcome::Ignore(reason)
}
