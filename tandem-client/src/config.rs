//! Client-side configuration loading
//!
//! Reads the `[client]` table of the shared config file. Missing or
//! malformed files fall back to defaults with a warning; configuration
//! problems never keep the viewer from starting.

use std::path::Path;

use serde::Deserialize;

use tandem_utils::paths::config_file;

/// Default relay address
pub const DEFAULT_RELAY_ADDR: &str = "tcp://127.0.0.1:9440";

/// Default minimum interval between cursor emissions, in milliseconds
pub const DEFAULT_CURSOR_THROTTLE_MS: u64 = 50;

/// Top-level config file shape (shared with the relay)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    client: ClientConfig,
}

/// Client configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay address (`tcp://host:port`)
    pub relay: String,
    /// Minimum interval between cursor emissions; 0 disables throttling
    pub cursor_throttle_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay: DEFAULT_RELAY_ADDR.into(),
            cursor_throttle_ms: DEFAULT_CURSOR_THROTTLE_MS,
        }
    }
}

impl ClientConfig {
    /// Load from the default config file location
    pub fn load() -> Self {
        Self::load_from_path(&config_file())
    }

    /// Load from a specific path, falling back to defaults
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(file) => file.client,
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file: {}, using defaults", e);
                Self::default()
            }
        }
    }
}
