//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level failure reported by the server
///
/// Built from a `4xx`/`5xx` response body. Terminal for the request that
/// produced it; nothing retries it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct FetchError {
    pub message: String,
    pub code: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self { message: message.into(), code: code.into() }
    }
}

/// Main error type for RosterLink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterLinkError {
    /// Malformed or missing input; raised before any network I/O
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Discovery attempted before a successful `auth()`
    #[error("Not authenticated: call auth() before discovery")]
    NotAuthenticated,

    /// Network-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// An explicit cancel signal aborted the outstanding request
    #[error("upload canceled")]
    Canceled,

    /// Server signaled an error with a recognized payload
    #[error("Server error: {0}")]
    Fetch(#[from] FetchError),

    /// Server response breaks the expected contract
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// Discovery response does not carry the requested scope
    #[error("Scope not available: {0}")]
    ScopeUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RosterLinkError {
    /// `true` for errors raised before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// The server-reported error, if this is one
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for RosterLink operations
pub type Result<T> = std::result::Result<T, RosterLinkError>;
