//! Error taxonomy.
//!
//! Pipeline functions return [`anyhow::Result`]; the typed errors below travel inside it
//! and can be recovered with `downcast_ref`:
//! - [`TransportError`] — a single failed request. Retried by [`crate::fetch::Session`].
//! - [`ResolutionError`] — a fatal problem with the archive data. Aborts the run.
//! - [`ConfigurationError`] — bad user input, raised before any network activity.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("{status} error for url: {url}")]
    Status { url: String, status: u16 },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            TransportError::Connection { url, .. } | TransportError::Status { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("malformed TimeMap document at {url}")]
    MalformedTimeMap {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid datetime '{value}'")]
    InvalidDatetime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("response from {url} has no rel=\"original\" link")]
    MissingOriginal { url: String },

    #[error("cannot derive a file path from '{uri}'")]
    EmptyPath { uri: String },

    #[error("more than {limit} redirects while resolving {url}")]
    TooManyRedirects { url: String, limit: usize },

    #[error("giving up on {url} after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to parse date '{input}'. Just copy-paste it from git log")]
    InvalidDate { input: String },
}
