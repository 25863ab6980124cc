//! Snapshot read handlers

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use zeeho_core::{CoordSystem, CoordinatePair, FieldInfo, SnapshotField, VehicleSnapshot};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FieldsResponse {
    pub items: Vec<FieldEntry>,
}

#[derive(Serialize)]
pub struct FieldEntry {
    #[serde(flatten)]
    pub info: FieldInfo,
    /// Current value, `null` when absent or before the first snapshot
    pub value: Value,
}

#[derive(Serialize)]
pub struct FieldValueResponse {
    pub key: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub value: Value,
    pub query_time: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MapResponse {
    /// Reference system the upstream reported in
    pub source: CoordSystem,
    pub wgs84: CoordinatePair,
    pub gcj02: CoordinatePair,
    pub bd09: CoordinatePair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_time: Option<String>,
}

/// GET /vehicle
pub async fn get_vehicle(State(state): State<AppState>) -> Result<Json<VehicleSnapshot>, ApiError> {
    let snapshot = state.current_snapshot()?;
    Ok(Json(snapshot.as_ref().clone()))
}

/// GET /vehicle/fields
pub async fn list_fields(State(state): State<AppState>) -> Json<FieldsResponse> {
    let snapshot = state.coordinator.snapshot();
    let items = SnapshotField::ALL
        .into_iter()
        .map(|field| FieldEntry {
            info: field.info(),
            value: snapshot
                .as_deref()
                .map(|s| field.value(s))
                .unwrap_or(Value::Null),
        })
        .collect();

    Json(FieldsResponse { items })
}

/// GET /vehicle/fields/{field}
pub async fn get_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
) -> Result<Json<FieldValueResponse>, ApiError> {
    let field: SnapshotField = field.parse()?;
    let snapshot = state.current_snapshot()?;

    Ok(Json(FieldValueResponse {
        key: field.key(),
        name: field.name(),
        unit: field.unit(),
        value: field.value(&snapshot),
        query_time: snapshot.query_time,
    }))
}

/// GET /vehicle/map
pub async fn get_map(State(state): State<AppState>) -> Result<Json<MapResponse>, ApiError> {
    let snapshot = state.current_snapshot()?;
    let positions = snapshot
        .map_positions(state.coordinate_system)
        .ok_or_else(|| ApiError::NotFound("Vehicle position unknown".to_string()))?;

    Ok(Json(MapResponse {
        source: state.coordinate_system,
        wgs84: positions.wgs84,
        gcj02: positions.gcj02,
        bd09: positions.bd09,
        location_time: snapshot.location_time.clone(),
    }))
}
