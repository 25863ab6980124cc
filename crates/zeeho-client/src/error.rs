//! Error types for ZEEHO client operations

use thiserror::Error;

/// Result type alias for ZEEHO client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur talking to the ZEEHO cloud
#[derive(Error, Debug)]
pub enum ClientError {
    /// Upstream answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request could not be sent or the response could not be read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A credential contains characters not allowed in an HTTP header
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the request timed out or never reached the server
    pub fn is_transport(&self) -> bool {
        match self {
            ClientError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClientError::Io(_) => true,
            _ => false,
        }
    }

    /// HTTP status, if the upstream answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
