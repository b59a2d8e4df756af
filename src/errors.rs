//! Error types for the burst runner.
//!
//! Startup problems ([`ConfigError`], [`BurstError`]) abort the process before
//! any request is sent. Per-request problems ([`RequestError`]) never leave the
//! worker that produced them: they are logged and the request counts as done.

use thiserror::Error;

/// Invalid ambient configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid LOG_FORMAT '{0}': expected 'text' or 'json'")]
    InvalidLogFormat(String),
}

/// Fatal errors raised while setting up or driving a burst.
#[derive(Debug, Error)]
pub enum BurstError {
    #[error("failed to encode request payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Outcome of a single failed POST.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered with something other than 200.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Building, connecting or sending failed before a status was read.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The status arrived but the error body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl RequestError {
    /// HTTP status code, if the server produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Transport(e) | RequestError::Body(e) => e.status().map(|s| s.as_u16()),
        }
    }
}
