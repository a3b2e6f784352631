//! Error types for the clustering engine.
//!
//! Empty inputs, query misses and levels the host cannot resolve are not
//! errors; they surface as empty results, `None` or `LevelOutcome::NoData`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Debug, Error)]
pub enum ClusterError {
    /// A configuration value was rejected by `Config::validate`
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An argument to a query was out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
