//! Bridge configuration
//!
//! `BridgeSettings` carries the values the processor caches at construction.
//! `BridgeConfig` is the file format for a whole bridge (settings plus every
//! inbound mapping).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::domain::mapping::InboundMapping;
use crate::error::ConfigError;

/// Default reply timeout in milliseconds
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 30_000;

/// Environment variable overriding the send timeout (milliseconds)
pub const SEND_TIMEOUT_ENV: &str = "BUS_BRIDGE_SEND_TIMEOUT";

/// Settings read once when a processor is built
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeSettings {
    send_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        }
    }
}

impl BridgeSettings {
    /// Settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `BUS_BRIDGE_SEND_TIMEOUT`: reply timeout in ms (default: 30000)
    pub fn from_env() -> Self {
        Self::from_env_value(env::var(SEND_TIMEOUT_ENV).ok().as_deref())
    }

    /// Settings from a raw timeout value, falling back to the default when
    /// the value is absent, unparsable or zero.
    pub fn from_env_value(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Self::default().with_send_timeout(Duration::from_millis(ms)),
            _ => {
                warn!(
                    variable = SEND_TIMEOUT_ENV,
                    value = raw,
                    default_ms = DEFAULT_SEND_TIMEOUT_MS,
                    "Ignoring invalid send timeout"
                );
                Self::default()
            }
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Send timeout in whole milliseconds, saturating at `u64::MAX`
    pub fn send_timeout_ms(&self) -> u64 {
        u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Whole-bridge configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Reply timeout in milliseconds
    pub send_timeout_ms: u64,
    /// Inbound mappings, one per routing endpoint
    pub inbound: Vec<InboundMapping>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            inbound: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "send_timeout_ms cannot be 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for mapping in &self.inbound {
            mapping.validate()?;
            if !seen.insert(mapping.uri.as_str()) {
                return Err(ConfigError::DuplicateUri(mapping.uri.clone()));
            }
        }

        Ok(())
    }

    /// Settings shared by every processor of this bridge
    pub fn settings(&self) -> BridgeSettings {
        BridgeSettings::default().with_send_timeout(Duration::from_millis(self.send_timeout_ms))
    }
}
