//! Error types for the data layer, storage, configuration and plotting.

use std::path::PathBuf;
use thiserror::Error;

/// Transport or HTTP status failure while fetching a source.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// The response body did not have the expected shape.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("path segment {segment} not found")]
    MissingPath { segment: String },
    #[error("expected {expected} at {at}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        at: String,
        found: &'static str,
    },
    #[error("series has {labels} labels but {values} values")]
    LengthMismatch { labels: usize, values: usize },
    #[error("value at index {index} is not finite")]
    NonFinite { index: usize },
}

/// Any failure of a single fetch-and-normalize attempt.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no source configured")]
    NoSource,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access storage file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Chart rasterization failure.
#[derive(Debug, Error)]
#[error("failed to draw chart '{chart}': {message}")]
pub struct PlotError {
    pub chart: String,
    pub message: String,
}
