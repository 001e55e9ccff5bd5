//! # framewalk utilities
//!
//! Shared helpers for the framewalk workspace. For now that is the logging
//! setup, built on `tracing`.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{format_from_env, init_logging, init_logging_with_level, LogFormat, LogGuard, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
