//! Custom error types for jobtrawl

use thiserror::Error;

/// Main error type for jobtrawl operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A company or posting references a (country, city) pair that was never
    /// written to the locations table.
    #[error("No location row for country '{country}', city '{city}'")]
    MissingLocation { country: String, city: String },

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for jobtrawl
pub type Result<T> = std::result::Result<T, Error>;
