//! Refresh and unlock handlers

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use zeeho_coordinator::UnlockOutcome;
use zeeho_core::VehicleSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UnlockRequest {
    #[serde(default)]
    pub secret: Option<String>,
}

/// POST /vehicle/refresh
pub async fn refresh(State(state): State<AppState>) -> Result<Json<VehicleSnapshot>, ApiError> {
    let snapshot = state.coordinator.refresh_now().await?;
    Ok(Json(snapshot.as_ref().clone()))
}

/// POST /vehicle/unlock
///
/// Body is optional; without a secret the configured one is used.
pub async fn unlock(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UnlockOutcome>, ApiError> {
    let request: UnlockRequest = if body.iter().all(u8::is_ascii_whitespace) {
        UnlockRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid unlock request: {}", e)))?
    };

    let outcome = match request.secret.filter(|s| !s.is_empty()) {
        Some(secret) => state.unlock.unlock_vehicle(&secret).await?,
        None => state.unlock.unlock_with_configured_secret().await?,
    };
    Ok(Json(outcome))
}
