//! Routing diagnostics
//!
//! When asked, the router records each change it makes to the path. A
//! report can render those changes against the routed packet text:
//!
//! ```text
//! Inserted DIGI* at position 0
//! N0CALL>APRS,DIGI*,WIDE1,WIDE2-1:data
//!             ~~~~~
//! ```

use std::fmt;
use std::ops::Range;

use aprs_packet::Packet;

use crate::engine::RouteOutcome;

/// Kind of change applied to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// The router callsign was inserted
    Insert,
    /// An element was replaced by the router callsign
    Replace,
    /// An element was marked used
    Set,
    /// An alias lost one hop
    Decrement,
}

/// One change applied to the path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingAction {
    pub kind: ActionKind,
    /// Path index in the routed packet
    pub index: usize,
    /// Element text after the change
    pub address: String,
    /// Byte range of the element in the routed packet text
    pub range: Range<usize>,
}

impl RoutingAction {
    pub(crate) fn new(kind: ActionKind, index: usize, packet: &Packet) -> Self {
        let address = packet
            .path
            .get(index)
            .map(ToString::to_string)
            .unwrap_or_default();
        let range = packet.element_range(index).unwrap_or(0..0);
        Self {
            kind,
            index,
            address,
            range,
        }
    }
}

impl fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ActionKind::Insert => {
                write!(f, "Inserted {} at position {}", self.address, self.index)
            }
            ActionKind::Replace => write!(
                f,
                "Replaced position {} with {}",
                self.index, self.address
            ),
            ActionKind::Set => {
                write!(f, "Marked {} used at position {}", self.address, self.index)
            }
            ActionKind::Decrement => {
                write!(f, "Decremented {} at position {}", self.address, self.index)
            }
        }
    }
}

/// Routing outcome plus the actions that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteReport {
    pub outcome: RouteOutcome,
    /// In the order they were applied; empty when the packet was ignored
    pub actions: Vec<RoutingAction>,
}

impl RouteReport {
    /// Render every action against the routed packet
    pub fn annotate(&self) -> Vec<AnnotatedLine> {
        let RouteOutcome::Repeat(packet) = &self.outcome else {
            return Vec::new();
        };
        let text = packet.to_string();

        self.actions
            .iter()
            .map(|action| AnnotatedLine {
                message: action.to_string(),
                packet: text.clone(),
                underline: underline(&action.range),
            })
            .collect()
    }
}

/// A message, the packet text and a marker under the affected element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedLine {
    pub message: String,
    pub packet: String,
    pub underline: String,
}

impl fmt::Display for AnnotatedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(f, "{}", self.packet)?;
        write!(f, "{}", self.underline)
    }
}

fn underline(range: &Range<usize>) -> String {
    let mut line = " ".repeat(range.start);
    line.push_str(&"~".repeat(range.len()));
    line
}
