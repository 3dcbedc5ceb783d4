//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use aprs_packet::Callsign;
use aprs_route::{AliasRule, RouterConfig};
use serde::{Deserialize, Serialize};

/// Digipeater settings, loaded from `settings.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Router callsign
    #[serde(default)]
    pub callsign: Option<Callsign>,
    /// Alias rules, first match wins
    #[serde(default)]
    pub rules: Vec<AliasRule>,
    /// Print routing actions for each repeated packet
    #[serde(default)]
    pub diagnostics: bool,
    /// Packets with the same source, destination and payload seen within
    /// this window are dropped
    #[serde(default = "default_dedupe_window_ms")]
    pub dedupe_window_ms: u64,
    /// Largest routed packet the digipeater will emit
    #[serde(default = "default_max_packet_bytes")]
    pub max_packet_bytes: usize,
}

fn default_dedupe_window_ms() -> u64 {
    30_000
}

fn default_max_packet_bytes() -> usize {
    512
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            callsign: None,
            rules: Vec::new(),
            diagnostics: false,
            dedupe_window_ms: default_dedupe_window_ms(),
            max_packet_bytes: default_max_packet_bytes(),
        }
    }
}

impl Settings {
    /// Default settings file, `<config dir>/aprsroute/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aprsroute").join("settings.json"))
    }

    /// Load settings
    ///
    /// An explicit path must exist. Without one, the default file is used if
    /// present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Apply command-line overrides
    pub fn apply_overrides(
        &mut self,
        callsign: Option<Callsign>,
        rules: Option<Vec<AliasRule>>,
        diagnostics: bool,
    ) {
        if callsign.is_some() {
            self.callsign = callsign;
        }
        if let Some(rules) = rules {
            self.rules = rules;
        }
        self.diagnostics |= diagnostics;
    }

    /// Build and validate the router configuration
    pub fn router_config(&self) -> Result<RouterConfig> {
        let callsign = self
            .callsign
            .clone()
            .context("No router callsign configured; pass --callsign or set it in settings")?;

        let config = RouterConfig {
            callsign,
            rules: self.rules.clone(),
            diagnostics: self.diagnostics,
        };
        config.validate().context("Invalid routing rules")?;
        Ok(config)
    }

    pub fn dedupe_window(&self) -> Duration {
        Duration::from_millis(self.dedupe_window_ms)
    }
}
