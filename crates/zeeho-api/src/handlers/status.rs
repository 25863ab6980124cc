//! Coordinator status handler

use axum::extract::State;
use axum::Json;
use zeeho_coordinator::CoordinatorStatus;

use crate::state::AppState;

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> Json<CoordinatorStatus> {
    Json(state.coordinator.status())
}
