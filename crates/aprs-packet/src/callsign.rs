//! Station callsigns
//!
//! A callsign is a short alphanumeric base with an optional SSID suffix,
//! e.g. `N0CALL` or `N0CALL-9`. Comparison ignores the case of the base, and
//! an absent SSID is the same station as SSID 0.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ParseError;

/// Maximum length of the base callsign (AX.25 address field)
pub const MAX_BASE_LEN: usize = 6;

/// Largest valid SSID
pub const MAX_SSID: u8 = 15;

/// A station identifier: `BASE[-SSID]`
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Callsign {
    base: String,
    /// Kept as written so `CALL-0` and `CALL` both format back unchanged
    ssid: Option<u8>,
}

impl Callsign {
    /// Create a callsign from a base and an optional SSID
    pub fn new(base: impl Into<String>, ssid: Option<u8>) -> Result<Self, ParseError> {
        let base = base.into();
        validate_base(&base)?;
        if let Some(value) = ssid {
            if value > MAX_SSID {
                return Err(ParseError::MalformedSsid(value.to_string()));
            }
        }
        Ok(Self { base, ssid })
    }

    /// Parse `BASE[-SSID]`
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if text.is_empty() {
            return Err(ParseError::EmptyCallsign);
        }

        let (base, ssid) = match text.split_once('-') {
            Some((base, ssid_text)) => (base, Some(parse_ssid(ssid_text)?)),
            None => (text, None),
        };

        validate_base(base)?;

        Ok(Self {
            base: base.to_string(),
            ssid,
        })
    }

    /// The base callsign without SSID, as written
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The SSID if one was written
    pub fn ssid(&self) -> Option<u8> {
        self.ssid
    }

    /// The SSID value, treating an absent SSID as 0
    pub fn ssid_value(&self) -> u8 {
        self.ssid.unwrap_or(0)
    }

    /// Number of bytes this callsign occupies in packet text
    pub fn encoded_len(&self) -> usize {
        match self.ssid {
            Some(ssid) if ssid >= 10 => self.base.len() + 3,
            Some(_) => self.base.len() + 2,
            None => self.base.len(),
        }
    }

    pub(crate) fn set_ssid(&mut self, ssid: Option<u8>) {
        self.ssid = ssid;
    }
}

impl PartialEq for Callsign {
    fn eq(&self, other: &Self) -> bool {
        self.base.eq_ignore_ascii_case(&other.base) && self.ssid_value() == other.ssid_value()
    }
}

impl Eq for Callsign {}

impl Hash for Callsign {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.base.bytes() {
            state.write_u8(b.to_ascii_uppercase());
        }
        state.write_u8(self.ssid_value());
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ssid {
            Some(ssid) => write!(f, "{}-{}", self.base, ssid),
            None => f.write_str(&self.base),
        }
    }
}

impl FromStr for Callsign {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Callsign {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Callsign> for String {
    fn from(callsign: Callsign) -> Self {
        callsign.to_string()
    }
}

fn validate_base(base: &str) -> Result<(), ParseError> {
    if base.is_empty() {
        return Err(ParseError::EmptyCallsign);
    }
    if base.len() > MAX_BASE_LEN || !base.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ParseError::InvalidCallsign(base.to_string()));
    }
    Ok(())
}

fn parse_ssid(text: &str) -> Result<u8, ParseError> {
    // One or two digits, no zero padding: "-0".."-15"
    let well_formed = matches!(text.len(), 1 | 2)
        && text.bytes().all(|b| b.is_ascii_digit())
        && !(text.len() == 2 && text.starts_with('0'));

    if !well_formed {
        return Err(ParseError::MalformedSsid(text.to_string()));
    }

    match text.parse::<u8>() {
        Ok(ssid) if ssid <= MAX_SSID => Ok(ssid),
        _ => Err(ParseError::MalformedSsid(text.to_string())),
    }
}
