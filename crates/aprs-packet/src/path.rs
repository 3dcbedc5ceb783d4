//! Digipeater path elements
//!
//! Each hop in a packet path is written `BASE[-SSID][*]`. The trailing `*`
//! marks a hop that has already repeated the packet.
//!
//! Generic aliases of the `NAMEn-N` family (`WIDE2-1`, `TRACE3-3`) encode a
//! hop budget: the digit `n` ending the base is the total number of hops the
//! sender asked for and the SSID `N` is the number still remaining. A bare
//! `WIDE2` is an alias with no hops left.

use std::fmt;
use std::str::FromStr;

use crate::callsign::Callsign;
use crate::error::ParseError;

/// Largest hop count an `n-N` alias may carry
pub const MAX_ALIAS_HOPS: u8 = 7;

/// Hop budget of a generic `NAMEn-N` alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AliasHops {
    /// Total hops requested (`n`)
    pub n: u8,
    /// Hops still remaining (`N`)
    pub remaining: u8,
}

impl AliasHops {
    /// Recognize the `NAMEn[-N]` pattern in a callsign
    pub fn detect(callsign: &Callsign) -> Option<Self> {
        let base = callsign.base().as_bytes();
        if base.len() < 2 {
            return None;
        }

        let last = base[base.len() - 1];
        if !last.is_ascii_digit() {
            return None;
        }

        let n = last - b'0';
        let remaining = callsign.ssid_value();

        if n == 0 || n > MAX_ALIAS_HOPS || remaining > MAX_ALIAS_HOPS {
            return None;
        }

        Some(Self { n, remaining })
    }
}

/// One hop in a packet path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
    callsign: Callsign,
    /// Whether this hop has already repeated the packet (`*`)
    pub used: bool,
    hops: Option<AliasHops>,
}

impl PathElement {
    /// Create a path element, detecting the alias pattern from the callsign
    pub fn new(callsign: Callsign, used: bool) -> Self {
        let hops = AliasHops::detect(&callsign);
        Self {
            callsign,
            used,
            hops,
        }
    }

    /// Parse `BASE[-SSID][*]`
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (text, used) = match text.strip_suffix('*') {
            Some(stripped) => (stripped, true),
            None => (text, false),
        };
        Ok(Self::new(Callsign::parse(text)?, used))
    }

    pub fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    /// Alias hop budget, if this element follows the `NAMEn-N` pattern
    pub fn hops(&self) -> Option<AliasHops> {
        self.hops
    }

    /// Alias family name (`WIDE` for `WIDE2-1`)
    pub fn family(&self) -> Option<&str> {
        self.hops.map(|_| {
            let base = self.callsign.base();
            &base[..base.len() - 1]
        })
    }

    /// An alias whose hop budget is spent (`WIDE1`, `WIDE1-0`)
    pub fn is_exhausted(&self) -> bool {
        matches!(self.hops, Some(h) if h.remaining == 0)
    }

    /// Consume one hop of an alias and rewrite its SSID to match
    ///
    /// The SSID becomes the new remaining count, or disappears when the
    /// budget reaches zero so the element renders as the bare family member.
    /// Returns the new remaining count, or `None` if there was nothing to
    /// consume.
    pub fn decrement(&mut self) -> Option<u8> {
        let hops = self.hops.as_mut()?;
        if hops.remaining == 0 {
            return None;
        }

        hops.remaining -= 1;
        let remaining = hops.remaining;
        self.callsign
            .set_ssid(if remaining > 0 { Some(remaining) } else { None });

        Some(remaining)
    }

    /// Number of bytes this element occupies in packet text
    pub fn encoded_len(&self) -> usize {
        self.callsign.encoded_len() + usize::from(self.used)
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.callsign)?;
        if self.used {
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl FromStr for PathElement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
