//! Test utilities for zeeho-client
//!
//! [`MockUpstream`] is a scripted stand-in for the ZEEHO cloud. It serves the
//! telemetry and unlock endpoints on a random local port and records what it
//! receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::{Credentials, Result, ZeehoClient};

const API_ROOT: &str = "/v1.0/app/cfmotoserverapp";

/// A canned reply for one endpoint
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// A body sent verbatim, for malformed-JSON cases
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
struct MockState {
    telemetry: MockReply,
    unlock: MockReply,
    telemetry_calls: usize,
    unlock_calls: usize,
    last_headers: Option<HashMap<String, String>>,
    last_unlock_body: Option<Value>,
}

type Shared = Arc<Mutex<MockState>>;

/// Scripted ZEEHO cloud that shuts down when dropped
pub struct MockUpstream {
    pub addr: SocketAddr,
    state: Shared,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockUpstream {
    /// Start a mock serving one sample vehicle and accepting unlocks
    pub async fn start() -> Result<Self> {
        let state = Arc::new(Mutex::new(MockState {
            telemetry: MockReply::json(200, telemetry_body(vec![sample_vehicle()])),
            unlock: MockReply::json(200, json!({"code": "10000", "message": "success"})),
            telemetry_calls: 0,
            unlock_calls: 0,
            last_headers: None,
            last_unlock_body: None,
        }));

        let router = Router::new()
            .route(&format!("{}/vehicleHomePage", API_ROOT), get(telemetry_handler))
            .route(
                &format!("{}/vehicleSet/network/unlock", API_ROOT),
                post(unlock_handler),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// API root to hand to [`ZeehoClient::with_config`]
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_ROOT)
    }

    /// A client pointed at this mock with test credentials
    pub fn client(&self) -> Result<ZeehoClient> {
        self.client_with_timeout(Duration::from_secs(5))
    }

    pub fn client_with_timeout(&self, timeout: Duration) -> Result<ZeehoClient> {
        ZeehoClient::with_config(
            &self.base_url(),
            test_credentials(),
            timeout,
            Duration::from_secs(2),
        )
    }

    pub fn set_telemetry(&self, reply: MockReply) {
        self.state.lock().telemetry = reply;
    }

    pub fn set_unlock(&self, reply: MockReply) {
        self.state.lock().unlock = reply;
    }

    pub fn telemetry_calls(&self) -> usize {
        self.state.lock().telemetry_calls
    }

    pub fn unlock_calls(&self) -> usize {
        self.state.lock().unlock_calls
    }

    /// Headers of the most recent request, keyed by lowercase name
    pub fn last_headers(&self) -> Option<HashMap<String, String>> {
        self.state.lock().last_headers.clone()
    }

    pub fn last_unlock_body(&self) -> Option<Value> {
        self.state.lock().last_unlock_body.clone()
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn telemetry_handler(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let reply = {
        let mut state = state.lock();
        state.telemetry_calls += 1;
        state.last_headers = Some(header_snapshot(&headers));
        state.telemetry.clone()
    };
    respond(reply).await
}

async fn unlock_handler(State(state): State<Shared>, headers: HeaderMap, body: String) -> Response {
    let reply = {
        let mut state = state.lock();
        state.unlock_calls += 1;
        state.last_headers = Some(header_snapshot(&headers));
        state.last_unlock_body = serde_json::from_str(&body).ok();
        state.unlock.clone()
    };
    respond(reply).await
}

async fn respond(reply: MockReply) -> Response {
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
}

fn header_snapshot(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Credentials accepted by the mock
pub fn test_credentials() -> Credentials {
    Credentials::new(
        "Bearer test-token",
        "test-x-sign",
        "test-app",
        "test-nonce",
        "test-signature",
        "ZEEHO-Test/1.0",
    )
}

/// Successful telemetry envelope around the given vehicles
pub fn telemetry_body(vehicles: Vec<Value>) -> Value {
    json!({
        "code": "10000",
        "message": "success",
        "data": vehicles,
    })
}

/// A realistic per-vehicle record
pub fn sample_vehicle() -> Value {
    json!({
        "vehicleName": "AE8",
        "vin": "LCE0000000000001",
        "vehiclePicUrl": "https://example.invalid/ae8.png",
        "bluetoothAddress": "AA:BB:CC:DD:EE:FF",
        "bmssoc": "87",
        "chargeState": "0",
        "fullChargeTime": "0",
        "whetherChargeState": "0",
        "headLockState": "1",
        "rideState": "在线",
        "supportUnlock": true,
        "supportNetworkUnlock": true,
        "totalRideMile": "1234.5",
        "remainMileage": "56",
        "otaVersion": "1.2.3",
        "location": {
            "latitude": "31.2304",
            "longitude": "121.4737",
            "altitude": "4.5",
            "course": "90",
            "locationTime": "2024-05-01 12:00:00"
        }
    })
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
