//! Digipeater session
//!
//! Wraps a [`Router`] with the state a running digipeater keeps between
//! packets: a duplicate suppression window and counters.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use aprs_packet::{Callsign, FormatError, Packet};
use aprs_route::{AnnotatedLine, IgnoreReason, RouteOutcome, Router};
use tracing::{debug, info};

/// What happened to a received packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Transmit this text
    Repeat {
        text: String,
        /// Routing actions, when diagnostics are enabled
        annotations: Vec<AnnotatedLine>,
    },
    /// Same packet seen within the dedupe window
    Duplicate,
    /// The router declined to repeat it
    Ignored(IgnoreReason),
    /// Routed packet exceeds the size limit
    TooLarge { required: usize },
}

/// Packet counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigipeaterStats {
    pub received: u64,
    pub repeated: u64,
    pub ignored: u64,
    pub duplicates: u64,
    pub too_large: u64,
}

/// Identity of a packet for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PacketKey {
    source: Callsign,
    destination: Callsign,
    payload: String,
}

impl PacketKey {
    fn of(packet: &Packet) -> Self {
        Self {
            source: packet.source.clone(),
            destination: packet.destination.clone(),
            payload: packet.payload.clone(),
        }
    }
}

/// A running digipeater
pub struct Digipeater {
    router: Router,
    window: Duration,
    max_packet_bytes: usize,
    recent: HashMap<PacketKey, Instant>,
    stats: DigipeaterStats,
}

impl Digipeater {
    pub fn new(router: Router, window: Duration, max_packet_bytes: usize) -> Self {
        Self {
            router,
            window,
            max_packet_bytes,
            recent: HashMap::new(),
            stats: DigipeaterStats::default(),
        }
    }

    pub fn stats(&self) -> DigipeaterStats {
        self.stats
    }

    /// Process a packet received now
    pub fn process(&mut self, packet: &Packet) -> Disposition {
        self.process_at(packet, Instant::now())
    }

    /// Process a packet received at `now`
    pub fn process_at(&mut self, packet: &Packet, now: Instant) -> Disposition {
        self.stats.received += 1;

        if self.is_duplicate(packet, now) {
            debug!("Dropping duplicate from {}", packet.source);
            self.stats.duplicates += 1;
            return Disposition::Duplicate;
        }

        let (outcome, annotations) = if self.router.config().diagnostics {
            let report = self.router.route_with_diagnostics(packet);
            let annotations = report.annotate();
            (report.outcome, annotations)
        } else {
            (self.router.route(packet), Vec::new())
        };

        let routed = match outcome {
            RouteOutcome::Repeat(routed) => routed,
            RouteOutcome::Ignore(reason) => {
                self.stats.ignored += 1;
                return Disposition::Ignored(reason);
            }
        };

        match routed.format(self.max_packet_bytes) {
            Ok(text) => {
                info!("Repeating {}", text);
                self.stats.repeated += 1;
                Disposition::Repeat { text, annotations }
            }
            Err(FormatError::BufferTooSmall { required, .. }) => {
                self.stats.too_large += 1;
                Disposition::TooLarge { required }
            }
            Err(FormatError::TooManyHops { .. }) => {
                // Routing never grows a path past the limit
                self.stats.ignored += 1;
                Disposition::Ignored(IgnoreReason::PathExhausted)
            }
        }
    }

    /// Check the window and remember the packet if it is new
    fn is_duplicate(&mut self, packet: &Packet, now: Instant) -> bool {
        let window = self.window;
        self.recent
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);

        let key = PacketKey::of(packet);
        if self.recent.contains_key(&key) {
            return true;
        }
        if !window.is_zero() {
            self.recent.insert(key, now);
        }
        false
    }
}
