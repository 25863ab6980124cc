//! Polling coordinator
//!
//! Owns the single "last known good snapshot" slot. A refresh either serves
//! a fresh-enough cached snapshot, joins a fetch that is already in flight,
//! or starts a new bounded fetch. Failed fetches leave the previous snapshot
//! in place.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use zeeho_client::VehicleApi;
use zeeho_core::{Normalizer, VehicleSnapshot};

use crate::error::{FailureKind, RefreshError};

/// Upper bound on one telemetry fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub type RefreshResult = Result<Arc<VehicleSnapshot>, RefreshError>;
type RefreshFuture = Shared<BoxFuture<'static, RefreshResult>>;

/// Coordinator settings
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Index of this vehicle in the account's vehicle array
    pub slot_index: usize,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
}

impl CoordinatorConfig {
    pub fn new(slot_index: usize, refresh_interval: Duration) -> Self {
        Self {
            slot_index,
            refresh_interval,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Cached snapshots younger than this are served without a fetch
    pub fn debounce_window(&self) -> Duration {
        self.refresh_interval / 10
    }
}

/// Refresh lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Fetching,
}

/// Point-in-time view of the coordinator
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub phase: Phase,
    /// Capture time of the cached snapshot
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_kind: Option<FailureKind>,
    pub consecutive_failures: u32,
    pub slot_index: usize,
    pub refresh_interval_secs: u64,
}

struct CacheEntry {
    snapshot: Arc<VehicleSnapshot>,
    captured_at: Instant,
}

#[derive(Default)]
struct State {
    cache: Option<CacheEntry>,
    in_flight: Option<RefreshFuture>,
    last_error: Option<RefreshError>,
    consecutive_failures: u32,
}

struct Inner {
    api: Arc<dyn VehicleApi>,
    normalizer: Normalizer,
    config: CoordinatorConfig,
    state: Mutex<State>,
    updates: watch::Sender<Option<Arc<VehicleSnapshot>>>,
}

/// Caching, coalescing front for the telemetry endpoint
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct PollingCoordinator {
    inner: Arc<Inner>,
}

impl PollingCoordinator {
    pub fn new(api: Arc<dyn VehicleApi>, normalizer: Normalizer, config: CoordinatorConfig) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                api,
                normalizer,
                config,
                state: Mutex::new(State::default()),
                updates,
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Refresh, serving the cache if it is younger than the debounce window
    pub async fn refresh(&self) -> RefreshResult {
        let pending = {
            let mut state = self.inner.state.lock();
            if let Some(entry) = &state.cache {
                if entry.captured_at.elapsed() < self.inner.config.debounce_window() {
                    debug!("Serving cached snapshot inside debounce window");
                    return Ok(entry.snapshot.clone());
                }
            }
            self.join_or_start(&mut state)
        };
        pending.await
    }

    /// Refresh ignoring the debounce window, still joining an in-flight fetch
    pub async fn refresh_now(&self) -> RefreshResult {
        let pending = {
            let mut state = self.inner.state.lock();
            self.join_or_start(&mut state)
        };
        pending.await
    }

    /// Last known good snapshot
    pub fn snapshot(&self) -> Option<Arc<VehicleSnapshot>> {
        self.inner
            .state
            .lock()
            .cache
            .as_ref()
            .map(|entry| entry.snapshot.clone())
    }

    pub fn status(&self) -> CoordinatorStatus {
        let state = self.inner.state.lock();
        CoordinatorStatus {
            phase: if state.in_flight.is_some() {
                Phase::Fetching
            } else {
                Phase::Idle
            },
            last_update: state.cache.as_ref().map(|e| e.snapshot.query_time),
            last_error: state.last_error.as_ref().map(|e| e.to_string()),
            last_error_kind: state.last_error.as_ref().map(|e| e.kind()),
            consecutive_failures: state.consecutive_failures,
            slot_index: self.inner.config.slot_index,
            refresh_interval_secs: self.inner.config.refresh_interval.as_secs(),
        }
    }

    /// Receive every newly committed snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<VehicleSnapshot>>> {
        self.inner.updates.subscribe()
    }

    fn join_or_start(&self, state: &mut State) -> RefreshFuture {
        if let Some(pending) = &state.in_flight {
            debug!("Joining in-flight refresh");
            return pending.clone();
        }

        // Run on its own task so the fetch completes even if every caller goes away
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let guard = InFlightGuard::new(&inner);
            let result = inner.run_refresh().await;
            guard.disarm();
            result
        });
        let pending = async move {
            task.await.unwrap_or_else(|e| {
                Err(RefreshError::TransientFetch(format!(
                    "refresh task aborted: {}",
                    e
                )))
            })
        }
        .boxed()
        .shared();

        state.in_flight = Some(pending.clone());
        pending
    }
}

impl Inner {
    async fn run_refresh(&self) -> RefreshResult {
        let result = self.fetch().await;

        let mut state = self.state.lock();
        state.in_flight = None;
        match &result {
            Ok(snapshot) => {
                state.cache = Some(CacheEntry {
                    snapshot: snapshot.clone(),
                    captured_at: Instant::now(),
                });
                state.last_error = None;
                state.consecutive_failures = 0;
                drop(state);

                info!(
                    battery = ?snapshot.battery_percent,
                    lock = snapshot.lock_state.as_str(),
                    online = snapshot.is_online(),
                    "Vehicle snapshot updated"
                );
                self.updates.send_replace(Some(snapshot.clone()));
            }
            Err(e) => {
                state.last_error = Some(e.clone());
                state.consecutive_failures += 1;
                warn!(
                    error = %e,
                    kind = ?e.kind(),
                    failures = state.consecutive_failures,
                    "Refresh failed, keeping previous snapshot"
                );
            }
        }
        result
    }

    async fn fetch(&self) -> RefreshResult {
        let timeout = self.config.fetch_timeout;
        let response = tokio::time::timeout(timeout, self.api.get_telemetry())
            .await
            .map_err(|_| RefreshError::Timeout(timeout))??;

        if !response.is_success() {
            return Err(RefreshError::AuthRequired {
                code: response.code.clone(),
                message: response.message.clone(),
            });
        }

        let slot_index = self.config.slot_index;
        let vehicles = response.vehicles();
        let record = vehicles.get(slot_index).ok_or(RefreshError::SlotOutOfRange {
            slot_index,
            available: vehicles.len(),
        })?;

        if !has_fields(record) {
            return Err(RefreshError::EmptyData { slot_index });
        }

        Ok(Arc::new(self.normalizer.normalize(record)))
    }
}

/// Clears `in_flight` if the refresh task unwinds before its own bookkeeping
struct InFlightGuard<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(inner: &'a Inner) -> Self {
        Self { inner, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.state.lock();
        state.in_flight = None;
        state.last_error = Some(RefreshError::TransientFetch(
            "refresh task aborted".to_string(),
        ));
        state.consecutive_failures += 1;
        warn!(failures = state.consecutive_failures, "Refresh task aborted");
    }
}

fn has_fields(record: &Value) -> bool {
    matches!(record, Value::Object(map) if !map.is_empty())
}
