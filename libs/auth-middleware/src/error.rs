//! Middleware Configuration Errors
//!
//! Construction-time failures only. Request-time failures never raise; they
//! degrade to a denial-handler invocation.

use thiserror::Error;

/// Invalid middleware configuration, surfaced when the pipeline is set up
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("enforcer requires a denial handler")]
    MissingDenialHandler,
}
