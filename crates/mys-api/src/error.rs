//! Error types for API client operations

use reqwest::StatusCode;
use thiserror::Error;

/// Why a fetch produced no result.
///
/// A provider-side application error (`retcode != 0`) is not represented
/// here: such responses are returned to the caller as data.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Missing parameter {name} for {operation}")]
    MissingParameter {
        operation: String,
        name: &'static str,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status: {} {reason}", .status.as_u16())]
    HttpStatus { status: StatusCode, reason: String },

    #[error("Empty provider response")]
    EmptyResponse,

    #[error("Malformed provider response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] mys_cache::CacheError),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn from_status(status: StatusCode) -> Self {
        Self::HttpStatus {
            status,
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Check if the failure happened before anything reached the network
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::UnknownOperation(_)
                | Self::MissingParameter { .. }
                | Self::InvalidHeader(_)
                | Self::Config(_)
        )
    }

    /// Check if the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
