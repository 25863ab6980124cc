//! Scripted [`VehicleApi`] for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use zeeho_client::{ClientError, TelemetryResponse, UnlockResponse, VehicleApi};

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Step {
    Vehicles(Vec<Value>),
    Code(&'static str, &'static str),
    /// Non-success code alongside a populated `data` array
    CodeWithVehicles(&'static str, Vec<Value>),
    Http(u16),
    Hang,
    Panic,
}

pub struct ScriptedApi {
    telemetry: Mutex<VecDeque<Step>>,
    fallback: Step,
    delay: Duration,
    unlock_code: Mutex<(&'static str, Option<&'static str>)>,
    pub telemetry_calls: AtomicUsize,
    pub unlock_calls: AtomicUsize,
    pub last_secret: Mutex<Option<String>>,
}

impl ScriptedApi {
    /// Always answer with one vehicle
    pub fn healthy() -> Self {
        Self::with_fallback(Step::Vehicles(vec![vehicle("87")]))
    }

    pub fn with_fallback(fallback: Step) -> Self {
        Self {
            telemetry: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            unlock_code: Mutex::new(("10000", Some("success"))),
            telemetry_calls: AtomicUsize::new(0),
            unlock_calls: AtomicUsize::new(0),
            last_secret: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue answers consumed before the fallback
    pub fn then(self, step: Step) -> Self {
        self.telemetry.lock().push_back(step);
        self
    }

    pub fn set_unlock(&self, code: &'static str, message: Option<&'static str>) {
        *self.unlock_code.lock() = (code, message);
    }

    pub fn calls(&self) -> usize {
        self.telemetry_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VehicleApi for ScriptedApi {
    async fn get_telemetry(&self) -> zeeho_client::Result<TelemetryResponse> {
        self.telemetry_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .telemetry
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match step {
            Step::Vehicles(vehicles) => Ok(TelemetryResponse {
                code: "10000".into(),
                message: Some("success".into()),
                data: Some(vehicles),
            }),
            Step::Code(code, message) => Ok(TelemetryResponse {
                code: code.into(),
                message: Some(message.into()),
                data: None,
            }),
            Step::CodeWithVehicles(code, vehicles) => Ok(TelemetryResponse {
                code: code.into(),
                message: None,
                data: Some(vehicles),
            }),
            Step::Http(status) => Err(ClientError::Http {
                status,
                body: String::new(),
            }),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ClientError::Http {
                    status: 504,
                    body: String::new(),
                })
            }
            Step::Panic => panic!("scripted telemetry panic"),
        }
    }

    async fn unlock(&self, secret: &str) -> zeeho_client::Result<UnlockResponse> {
        self.unlock_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_secret.lock() = Some(secret.to_string());
        let (code, message) = *self.unlock_code.lock();
        Ok(UnlockResponse {
            code: code.into(),
            message: message.map(str::to_string),
        })
    }
}

/// Minimal vehicle record with the given battery level
pub fn vehicle(battery: &str) -> Value {
    json!({
        "vehicleName": "AE8",
        "bmssoc": battery,
        "chargeState": "0",
        "headLockState": "1",
        "rideState": "在线",
        "location": {"latitude": "31.2304", "longitude": "121.4737"}
    })
}
