//! Error types for the cutoff engine
//!
//! The forecasting functions themselves never fail; these errors cover the
//! edges around them (configuration, input files, region tasks).

use thiserror::Error;

/// Result type for cutoff engine operations
pub type Result<T> = std::result::Result<T, CutoffError>;

/// Errors that can occur around the forecasting core
#[derive(Error, Debug)]
pub enum CutoffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Region task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Logging error: {0}")]
    Logging(String),
}
