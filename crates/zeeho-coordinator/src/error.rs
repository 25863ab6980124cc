//! Refresh and unlock error types

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use zeeho_client::ClientError;

/// How a failed refresh should be handled by whoever drives the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Retry on the next tick
    Transient,
    /// Credentials or session are no longer accepted
    Reauthenticate,
    /// Local configuration does not match the account
    Misconfiguration,
}

/// A failed telemetry refresh
///
/// Cloneable so one result can be handed to every coalesced caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// Fetch exceeded the bounded timeout
    #[error("Telemetry fetch timed out after {0:?}")]
    Timeout(Duration),

    /// Connection failure or similar transport problem
    #[error("Telemetry fetch failed: {0}")]
    TransientFetch(String),

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Body was not valid JSON
    #[error("Malformed telemetry response: {0}")]
    Decode(String),

    /// Top-level status code was not the success code
    #[error("Upstream rejected the request with code {code}: {}", .message.as_deref().unwrap_or("no message"))]
    AuthRequired {
        code: String,
        message: Option<String>,
    },

    /// Configured slot does not exist in the vehicle array
    #[error("Vehicle slot {slot_index} out of range ({available} vehicle(s) on account)")]
    SlotOutOfRange { slot_index: usize, available: usize },

    /// Slot exists but holds no record
    #[error("Vehicle slot {slot_index} is empty")]
    EmptyData { slot_index: usize },

    /// Client could not be used to build a request
    #[error("Client misconfigured: {0}")]
    Client(String),
}

impl RefreshError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RefreshError::Timeout(_)
            | RefreshError::TransientFetch(_)
            | RefreshError::Decode(_)
            | RefreshError::EmptyData { .. } => FailureKind::Transient,
            RefreshError::Http { status, .. } => classify_status(*status),
            RefreshError::AuthRequired { .. } => FailureKind::Reauthenticate,
            RefreshError::SlotOutOfRange { .. } | RefreshError::Client(_) => {
                FailureKind::Misconfiguration
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }
}

fn classify_status(status: u16) -> FailureKind {
    match status {
        401 | 403 => FailureKind::Reauthenticate,
        408 | 429 => FailureKind::Transient,
        400..=499 => FailureKind::Misconfiguration,
        _ => FailureKind::Transient,
    }
}

impl From<ClientError> for RefreshError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http { status, body } => RefreshError::Http {
                status,
                message: body,
            },
            ClientError::Decode(e) => RefreshError::Decode(e.to_string()),
            ClientError::Request(e) if e.is_decode() => RefreshError::Decode(e.to_string()),
            ClientError::Request(e) => RefreshError::TransientFetch(e.to_string()),
            ClientError::Io(e) => RefreshError::TransientFetch(e.to_string()),
            ClientError::InvalidUrl(_) | ClientError::InvalidHeader(_) => {
                RefreshError::Client(err.to_string())
            }
        }
    }
}

/// A failed unlock command
#[derive(Debug, Error)]
pub enum UnlockError {
    #[error("Unlock request failed: {0}")]
    Client(#[from] ClientError),

    #[error("Unlock request timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream understood the command but refused it
    #[error("Unlock rejected with code {code}: {}", .message.as_deref().unwrap_or("no message"))]
    CommandRejected {
        code: String,
        message: Option<String>,
    },

    #[error("No unlock secret configured")]
    MissingSecret,
}
