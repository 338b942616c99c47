// Error types for acquire.
// Covers HTTP fetch failures, malformed envelopes, runaway pagination, and cache I/O.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::table::Table;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("HTTP {status} fetching {url}")]
    Fetch { url: String, status: StatusCode },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("Pagination overran at {url}: {reason}")]
    PaginationOverrun { url: String, reason: String },

    #[error("Cache file {} is unreadable: {source}", .path.display())]
    CacheRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to persist cache file {}: {source}", .path.display())]
    CachePersist {
        path: PathBuf,
        #[source]
        source: csv::Error,
        /// The table that was fetched successfully before the write failed.
        table: Box<Table>,
    },

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquireError {
    /// Recover the fetched table from a post-fetch persist failure.
    pub fn into_table(self) -> Option<Table> {
        match self {
            AcquireError::CachePersist { table, .. } => Some(*table),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AcquireError>;
