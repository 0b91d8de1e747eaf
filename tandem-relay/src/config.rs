//! Relay configuration
//!
//! Reads the `[relay]` table of the shared config file. The
//! `TANDEM_LISTEN` environment variable overrides the listen address.

use std::path::Path;

use serde::Deserialize;

use tandem_utils::paths::config_file;
use tandem_utils::{Result, TandemError};

/// Default listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9440";

/// Per-peer outbound frame buffer
pub const DEFAULT_PEER_BUFFER: usize = 256;

/// Top-level config file shape (shared with the client)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    relay: RelayConfig,
}

/// Relay configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the accept loop binds to
    pub listen_addr: String,
    /// Capacity of each peer's outbound frame channel
    pub peer_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            peer_buffer: DEFAULT_PEER_BUFFER,
        }
    }
}

impl RelayConfig {
    /// Load from the default location, applying the env override.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&config_file())?;
        if let Ok(addr) = std::env::var("TANDEM_LISTEN") {
            config.listen_addr = addr;
        }
        Ok(config)
    }

    /// Load from a specific path. A missing file yields defaults; a
    /// malformed one is a configuration error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| TandemError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&content).map_err(|e| TandemError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::validate(&file.relay)?;
        Ok(file.relay)
    }

    fn validate(config: &RelayConfig) -> Result<()> {
        if config.peer_buffer == 0 {
            return Err(TandemError::config("peer_buffer must be at least 1"));
        }
        if config.listen_addr.is_empty() {
            return Err(TandemError::config("listen_addr must not be empty"));
        }
        Ok(())
    }
}
