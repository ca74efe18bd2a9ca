//! Error types for the instrument metadata service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation too costly: {0}")]
    TooCostly(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Search backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relational store error: {0}")]
    Relational(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<instrumeta_filter::Error> for Error {
    fn from(err: instrumeta_filter::Error) -> Self {
        Error::Validation(err.to_string())
    }
}

impl Error {
    /// Whether the caller sent something we cannot serve, as opposed to a
    /// failure on our side or in a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::TooCostly(_))
    }
}
