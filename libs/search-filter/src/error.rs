//! Error types for the filter compiler

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Filter compiler errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid pagination parameter {name}: {value}")]
    InvalidPagination { name: String, value: String },

    #[error("Invalid sort parameter: {0}")]
    InvalidSort(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
