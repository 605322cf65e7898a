//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidHost(String),

    #[error("JWT secret must be at least {0} bytes in production")]
    JwtSecretTooShort(usize),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("CORS origin must be set explicitly in production")]
    WildcardCorsInProduction,

    #[error("Interval '{0}' must be greater than zero")]
    InvalidInterval(&'static str),

    #[error("Outbound buffer must be between 1 and {0}")]
    InvalidOutboundBuffer(usize),
}
