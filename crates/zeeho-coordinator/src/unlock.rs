//! Unlock command executor

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};
use zeeho_client::VehicleApi;

use crate::coordinator::PollingCoordinator;
use crate::error::UnlockError;

/// Default bound on one unlock call
pub const DEFAULT_UNLOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of an accepted unlock command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockOutcome {
    pub code: String,
    pub message: Option<String>,
    /// Whether the follow-up refresh succeeded
    pub refreshed: bool,
}

/// Sends unlock commands and optionally refreshes afterwards
///
/// Not idempotent: each call is forwarded upstream as is.
#[derive(Clone)]
pub struct UnlockExecutor {
    api: Arc<dyn VehicleApi>,
    coordinator: Option<PollingCoordinator>,
    secret: Option<String>,
    timeout: Duration,
}

impl UnlockExecutor {
    pub fn new(api: Arc<dyn VehicleApi>) -> Self {
        Self {
            api,
            coordinator: None,
            secret: None,
            timeout: DEFAULT_UNLOCK_TIMEOUT,
        }
    }

    /// Refresh this coordinator after every accepted unlock
    pub fn with_coordinator(mut self, coordinator: PollingCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Secret used by [`unlock_with_configured_secret`](Self::unlock_with_configured_secret)
    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub async fn unlock_with_configured_secret(&self) -> Result<UnlockOutcome, UnlockError> {
        let secret = self.secret.as_deref().ok_or(UnlockError::MissingSecret)?;
        self.unlock_vehicle(secret).await
    }

    #[instrument(skip(self, secret))]
    pub async fn unlock_vehicle(&self, secret: &str) -> Result<UnlockOutcome, UnlockError> {
        let response = tokio::time::timeout(self.timeout, self.api.unlock(secret))
            .await
            .map_err(|_| UnlockError::Timeout(self.timeout))??;

        if !response.is_success() {
            warn!(code = %response.code, message = ?response.message, "Unlock rejected");
            return Err(UnlockError::CommandRejected {
                code: response.code,
                message: response.message,
            });
        }
        info!("Unlock accepted");

        let refreshed = match &self.coordinator {
            Some(coordinator) => match coordinator.refresh_now().await {
                Ok(_) => true,
                Err(e) => {
                    warn!(error = %e, "Refresh after unlock failed");
                    false
                }
            },
            None => false,
        };

        Ok(UnlockOutcome {
            code: response.code,
            message: response.message,
            refreshed,
        })
    }
}
