//! Device identity
//!
//! Each viewer process generates one random identifier at startup and
//! uses it to label its own chat messages. Uniqueness is probabilistic
//! only; a collision mislabels chat lines but never affects the
//! synchronization logic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of random characters in the display form
const TAG_LEN: usize = 9;

/// Process-lifetime device identifier, e.g. `Device-4F09A1C22`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(format!("Device-{}", &raw[..TAG_LEN]))
    }

    /// Wrap an existing identifier string (e.g. from a peer message)
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
