//! Error types for SurangNav

use thiserror::Error;

/// SurangNav error type
#[derive(Error, Debug)]
pub enum SurangError {
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl From<toml::de::Error> for SurangError {
    fn from(e: toml::de::Error) -> Self {
        SurangError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SurangError>;
