//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use zeeho_api::{create_router, AppState};
use zeeho_client::testing::{MockReply, MockUpstream};
use zeeho_client::VehicleApi;
use zeeho_coordinator::{CoordinatorConfig, PollingCoordinator, UnlockExecutor};
use zeeho_core::{CoordSystem, Normalizer};

struct Harness {
    upstream: MockUpstream,
    coordinator: PollingCoordinator,
    router: Router,
}

async fn harness(secret: Option<&str>) -> Harness {
    let upstream = MockUpstream::start().await.unwrap();
    let api: Arc<dyn VehicleApi> = Arc::new(upstream.client().unwrap());
    let coordinator = PollingCoordinator::new(
        api.clone(),
        Normalizer::new("zeeho-api-test"),
        CoordinatorConfig::new(0, Duration::from_secs(60)),
    );
    let unlock = UnlockExecutor::new(api)
        .with_coordinator(coordinator.clone())
        .with_secret(secret.map(str::to_string));
    let state = AppState::new(coordinator.clone(), unlock)
        .with_coordinate_system(CoordSystem::Wgs84);

    Harness {
        upstream,
        coordinator,
        router: create_router(state),
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let h = harness(None).await;
    let (status, body) = send(&h.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_vehicle_unavailable_before_first_refresh() {
    let h = harness(None).await;
    let (status, body) = send(&h.router, "GET", "/vehicle", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_refresh_then_read() {
    let h = harness(None).await;

    let (status, body) = send(&h.router, "POST", "/vehicle/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["battery_percent"], json!(87.0));

    let (status, body) = send(&h.router, "GET", "/vehicle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location_key"], "zeeho-api-test");
    assert_eq!(body["charge_state"], "on_battery");
    assert_eq!(body["lock_state"], json!({"state": "locked"}));
    assert_eq!(body["connectivity"], "online");
}

#[tokio::test]
async fn test_fields_catalogue() {
    let h = harness(None).await;
    let (status, body) = send(&h.router, "GET", "/vehicle/fields", None).await;
    assert_eq!(status, StatusCode::OK);

    let items = body["items"].as_array().unwrap();
    let battery = items.iter().find(|f| f["key"] == "battery_percent").unwrap();
    assert_eq!(battery["unit"], "%");
    assert_eq!(battery["icon"], "mdi:battery");
    assert_eq!(battery["value"], Value::Null);
}

#[tokio::test]
async fn test_single_field() {
    let h = harness(None).await;
    h.coordinator.refresh().await.unwrap();

    let (status, body) = send(&h.router, "GET", "/vehicle/fields/lock_state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "locked");

    let (status, body) = send(&h.router, "GET", "/vehicle/fields/remaining_range", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!(56.0));
    assert_eq!(body["unit"], "km");

    let (status, body) = send(&h.router, "GET", "/vehicle/fields/address", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_map_positions() {
    let h = harness(None).await;
    h.coordinator.refresh().await.unwrap();

    let (status, body) = send(&h.router, "GET", "/vehicle/map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "wgs84");
    assert_eq!(body["wgs84"]["latitude"], json!(31.2304));
    assert_ne!(body["gcj02"]["latitude"], body["wgs84"]["latitude"]);
    assert_ne!(body["bd09"]["longitude"], body["gcj02"]["longitude"]);
}

#[tokio::test]
async fn test_status_reports_failures() {
    let h = harness(None).await;
    h.upstream.set_telemetry(MockReply::json(
        200,
        json!({"code": "40001", "message": "token expired"}),
    ));

    let (status, body) = send(&h.router, "POST", "/vehicle/refresh", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_unauthorized");

    let (status, body) = send(&h.router, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "idle");
    assert_eq!(body["consecutive_failures"], 1);
    assert_eq!(body["last_error_kind"], "reauthenticate");
}

#[tokio::test]
async fn test_unlock_with_body_secret() {
    let h = harness(None).await;
    let (status, body) = send(
        &h.router,
        "POST",
        "/vehicle/unlock",
        Some(json!({"secret": "123456"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "10000");
    assert_eq!(body["refreshed"], true);
    assert_eq!(h.upstream.last_unlock_body(), Some(json!({"secret": "123456"})));
}

#[tokio::test]
async fn test_unlock_falls_back_to_configured_secret() {
    let h = harness(Some("654321")).await;
    let (status, _) = send(&h.router, "POST", "/vehicle/unlock", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.upstream.last_unlock_body(), Some(json!({"secret": "654321"})));
}

#[tokio::test]
async fn test_unlock_without_any_secret() {
    let h = harness(None).await;
    let (status, body) = send(&h.router, "POST", "/vehicle/unlock", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(h.upstream.unlock_calls(), 0);
}

#[tokio::test]
async fn test_unlock_rejected() {
    let h = harness(None).await;
    h.upstream.set_unlock(MockReply::json(
        200,
        json!({"code": "40010", "message": "bad secret"}),
    ));

    let (status, body) = send(
        &h.router,
        "POST",
        "/vehicle/unlock",
        Some(json!({"secret": "000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "command_rejected");
    assert!(body["message"].as_str().unwrap().contains("bad secret"));
}

#[tokio::test]
async fn test_unlock_malformed_body() {
    let h = harness(Some("654321")).await;
    let response = h
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/vehicle/unlock")
                .body(Body::from("{secret"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
