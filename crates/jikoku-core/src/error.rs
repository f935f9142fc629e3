//! Error types for jikoku-core

use thiserror::Error;

/// Main error type for jikoku-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Scraping server unavailable: {0}")]
    ScrapingUnavailable(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for jikoku-core
pub type Result<T> = std::result::Result<T, Error>;
