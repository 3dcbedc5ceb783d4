//! Router configuration
//!
//! A router is configured with its own callsign and an ordered list of alias
//! rules. Rules are usually given as the comma-separated rules text used by
//! digipeater front ends:
//!
//! | Entry      | Meaning                                             |
//! |------------|-----------------------------------------------------|
//! | `WIDE`     | every `WIDEn-N` alias, and the explicit alias `WIDE` |
//! | `WIDE2`    | only `WIDE2-N`                                      |
//! | `WIDE3-2`  | only `WIDE3-N`, with a hop limit of 2               |
//! | `RELAY`    | explicit alias `RELAY`                              |
//! | `CALLA-1`  | explicit alias `CALLA-1`                            |
//!
//! Rules from text use [`DecrementPolicy::Decrement`], which routes past
//! the hop limit. The limit only takes effect with the `trap` or `reject`
//! policy, set through [`AliasRule::with_policy`] or the JSON settings.

use std::fmt;
use std::str::FromStr;

use aprs_packet::callsign::{MAX_BASE_LEN, MAX_SSID};
use aprs_packet::path::MAX_ALIAS_HOPS;
use aprs_packet::{AliasHops, Callsign, PathElement};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with an alias whose remaining hops exceed the rule's limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecrementPolicy {
    /// Ignore the limit and route normally
    #[default]
    Decrement,
    /// Replace the alias with the router callsign so it goes no further
    Trap,
    /// Do not repeat the packet
    Reject,
}

/// A single alias rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasRule {
    /// Alias family (`WIDE`) or explicit alias base (`RELAY`)
    pub name: String,
    /// Restrict to one family member (`2` for `WIDE2-N`)
    pub n: Option<u8>,
    /// Maximum acceptable remaining hops
    pub hop_limit: Option<u8>,
    /// SSID of an explicit alias (`CALLA-1`)
    pub ssid: Option<u8>,
    /// Replace the alias with the router callsign instead of inserting before it
    pub substitute: bool,
    /// Applied when an alias exceeds `hop_limit`
    pub policy: DecrementPolicy,
}

impl AliasRule {
    /// Rule for every member of an alias family, which is also an explicit alias
    pub fn family(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rule for a single family member, `NAMEn`
    pub fn member(name: impl Into<String>, n: u8) -> Self {
        Self {
            name: name.into(),
            n: Some(n),
            ..Self::default()
        }
    }

    /// Rule for an explicit alias callsign
    pub fn explicit(callsign: &Callsign) -> Self {
        Self {
            name: callsign.base().to_string(),
            ssid: callsign.ssid(),
            ..Self::default()
        }
    }

    pub fn with_hop_limit(mut self, limit: u8) -> Self {
        self.hop_limit = Some(limit);
        self
    }

    pub fn with_policy(mut self, policy: DecrementPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_substitute(mut self, substitute: bool) -> Self {
        self.substitute = substitute;
        self
    }

    /// Whether this rule routes the given generic alias (`WIDE2-1`)
    ///
    /// Exhausted aliases never match; they have nothing left to route.
    pub fn matches_alias(&self, element: &PathElement) -> bool {
        let Some(hops) = element.hops() else {
            return false;
        };
        self.ssid.is_none()
            && hops.remaining > 0
            && self.covers_family(element)
            && self.n.map_or(true, |n| n == hops.n)
    }

    /// Whether this rule names the given element as an explicit alias
    pub fn matches_explicit(&self, element: &PathElement) -> bool {
        let callsign = element.callsign();
        self.n.is_none()
            && callsign.base().eq_ignore_ascii_case(&self.name)
            && callsign.ssid_value() == self.ssid.unwrap_or(0)
    }

    /// Whether the element belongs to this rule's alias family
    pub fn covers_family(&self, element: &PathElement) -> bool {
        self.ssid.is_none()
            && element
                .family()
                .is_some_and(|family| family.eq_ignore_ascii_case(&self.name))
    }

    /// Whether an alias carries more hops than this rule accepts
    pub fn exceeds_limit(&self, hops: AliasHops) -> bool {
        self.hop_limit.is_some_and(|limit| hops.remaining > limit)
    }

    /// Check the rule for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRule {
            rule: self.to_string(),
            reason: reason.to_string(),
        };

        if self.name.is_empty()
            || self.name.len() > MAX_BASE_LEN
            || !self.name.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(invalid("name must be 1 to 6 letters or digits"));
        }
        if self.n.is_some_and(|n| n == 0 || n > MAX_ALIAS_HOPS) {
            return Err(invalid("n must be between 1 and 7"));
        }
        if self.hop_limit.is_some_and(|h| h == 0 || h > MAX_ALIAS_HOPS) {
            return Err(invalid("hop limit must be between 1 and 7"));
        }
        if self.ssid.is_some_and(|s| s > MAX_SSID) {
            return Err(invalid("SSID must be between 0 and 15"));
        }
        if self.ssid.is_some() && (self.n.is_some() || self.hop_limit.is_some()) {
            return Err(invalid("an explicit alias cannot carry a hop count"));
        }
        Ok(())
    }
}

impl FromStr for AliasRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let callsign = Callsign::parse(s).map_err(|source| ConfigError::InvalidEntry {
            entry: s.to_string(),
            source,
        })?;

        let hops = AliasHops::detect(&callsign);
        let rule = match (hops, callsign.ssid()) {
            // NAMEn or NAMEn-N with N in 1..=7
            (Some(hops), ssid) if ssid.map_or(true, |s| s > 0) => {
                let base = callsign.base();
                let rule = AliasRule::member(&base[..base.len() - 1], hops.n);
                match ssid {
                    Some(limit) => rule.with_hop_limit(limit),
                    None => rule,
                }
            }
            (None, None) if !ends_with_digit(callsign.base()) => {
                AliasRule::family(callsign.base())
            }
            _ => AliasRule::explicit(&callsign),
        };

        Ok(rule)
    }
}

impl fmt::Display for AliasRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(n) = self.n {
            write!(f, "{}", n)?;
        }
        if let Some(limit) = self.hop_limit {
            write!(f, "-{}", limit)?;
        } else if let Some(ssid) = self.ssid {
            write!(f, "-{}", ssid)?;
        }
        Ok(())
    }
}

fn ends_with_digit(base: &str) -> bool {
    base.bytes().last().is_some_and(|b| b.is_ascii_digit())
}

/// Parse comma-separated rules text
///
/// Empty entries are skipped.
pub fn parse_rules(text: &str) -> Result<Vec<AliasRule>, ConfigError> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<AliasRule>().inspect_err(|e| {
                tracing::warn!("Rejected routing rule {:?}: {}", entry, e);
            })
        })
        .collect()
}

/// Router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// The router's own callsign
    pub callsign: Callsign,
    /// Alias rules, first match wins
    #[serde(default)]
    pub rules: Vec<AliasRule>,
    /// Collect routing actions for display
    #[serde(default)]
    pub diagnostics: bool,
}

impl RouterConfig {
    /// Configuration with no alias rules; only explicit routing applies
    pub fn new(callsign: Callsign) -> Self {
        Self {
            callsign,
            rules: Vec::new(),
            diagnostics: false,
        }
    }

    /// Build a configuration from a callsign and rules text
    pub fn from_rules(callsign: &str, rules_text: &str) -> Result<Self, ConfigError> {
        let callsign = Callsign::parse(callsign.trim()).map_err(ConfigError::InvalidCallsign)?;
        let config = Self {
            callsign,
            rules: parse_rules(rules_text)?,
            diagnostics: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_rule(mut self, rule: AliasRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Check every rule for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.iter().try_for_each(AliasRule::validate)
    }

    /// First rule that routes the element, as a generic or explicit alias
    pub fn find_rule(&self, element: &PathElement) -> Option<&AliasRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches_alias(element) || rule.matches_explicit(element))
    }

    /// Whether the element is an alias of a configured family
    pub fn covers_family(&self, element: &PathElement) -> bool {
        self.rules.iter().any(|rule| rule.covers_family(element))
    }
}
