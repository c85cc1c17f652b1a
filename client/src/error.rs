//! Client error taxonomy.
//!
//! Nothing here is retried by the client; retry policy belongs to the caller.

use bitwallet_crypto::CryptoError;
use bitwallet_types::{Network, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection-level failure: DNS, refused connection, TLS, reset.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("404 Not Found")]
    NotFound,

    #[error("400 Bad Request: {message}")]
    BadRequest { message: String },

    #[error("401 Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("{status} Server Error: {message}")]
    Server { status: u16, message: String },

    #[error("Network mismatch, server network is: {server} (expected {local})")]
    NetworkMismatch { server: String, local: Network },

    #[error("invalid response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("signing error: {0}")]
    Signing(#[from] CryptoError),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// The service broke the cursor protocol; an integration fault, not a
    /// transient condition.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("certificate rejected by known-host handler: {0}")]
    TrustRejected(String),
}

impl ClientError {
    /// HTTP status carried by status-class errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
