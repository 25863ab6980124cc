//! Command implementations for zeeho-cli

pub mod convert;
pub mod fields;
pub mod status;
pub mod unlock;

pub use convert::convert;
pub use fields::{field, fields};
pub use status::status;
pub use unlock::unlock;

use std::sync::Arc;

use anyhow::{Context, Result};
use zeeho_coordinator::ZeehoConfig;
use zeeho_core::VehicleSnapshot;

/// One-shot fetch through a freshly built coordinator
async fn fetch_snapshot(config: &ZeehoConfig) -> Result<Arc<VehicleSnapshot>> {
    let services = config.build_services()?;
    services
        .coordinator
        .refresh_now()
        .await
        .context("Failed to fetch vehicle telemetry")
}
