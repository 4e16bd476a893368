/*
 * Error Module
 *
 * This module defines the error type shared by the loaders and the oracle
 * client. None of these errors are fatal for the showcase: callers log them
 * and fall back to an inert feature (empty catalog, default config,
 * fallback oracle reasoning, procedural or silent audio).
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShowcaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog parse error: {0}")]
    CatalogParse(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle response unusable: {0}")]
    OracleResponse(String),

    #[error("oracle API key missing (environment variable {0} is not set)")]
    MissingApiKey(String),

    #[error("audio output failed: {0}")]
    Audio(String),
}

pub type Result<T> = std::result::Result<T, ShowcaseError>;
