//! Application state for the ZEEHO API

use std::sync::Arc;

use zeeho_coordinator::{PollingCoordinator, UnlockExecutor};
use zeeho_core::{CoordSystem, VehicleSnapshot};

use crate::error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: PollingCoordinator,
    pub unlock: UnlockExecutor,
    /// Reference system the upstream reports positions in
    pub coordinate_system: CoordSystem,
}

impl AppState {
    pub fn new(coordinator: PollingCoordinator, unlock: UnlockExecutor) -> Self {
        Self {
            coordinator,
            unlock,
            coordinate_system: CoordSystem::default(),
        }
    }

    pub fn with_coordinate_system(mut self, coordinate_system: CoordSystem) -> Self {
        self.coordinate_system = coordinate_system;
        self
    }

    /// Cached snapshot, or 503 before the first successful refresh
    pub fn current_snapshot(&self) -> Result<Arc<VehicleSnapshot>, ApiError> {
        self.coordinator.snapshot().ok_or_else(|| {
            ApiError::ServiceUnavailable("No vehicle snapshot available yet".to_string())
        })
    }
}
