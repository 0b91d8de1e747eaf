//! tandem-utils: Shared infrastructure for the tandem workspace
//!
//! Provides the unified error type, tracing-based logging setup, and
//! XDG-compliant path helpers used by the client and the relay.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Result, TandemError};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};
pub use paths::{config_dir, config_file, ensure_dir, log_dir, state_dir};
