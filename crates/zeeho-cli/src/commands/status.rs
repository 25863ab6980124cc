//! Status command - one-shot snapshot

use anyhow::Result;
use colored::Colorize;
use zeeho_coordinator::ZeehoConfig;
use zeeho_core::SnapshotField;

use crate::output::{with_unit, OutputContext};

/// Fetch the current snapshot and show every field
pub async fn status(config: &ZeehoConfig, ctx: &OutputContext) -> Result<()> {
    let snapshot = super::fetch_snapshot(config).await?;

    let mut pairs: Vec<(&str, String)> = vec![("Model", snapshot.device_model.clone())];
    for field in SnapshotField::ALL {
        let value = with_unit(&field.value(&snapshot), field.unit());
        let value = match field {
            SnapshotField::Connectivity if snapshot.is_online() => value.green().to_string(),
            SnapshotField::Connectivity => value.red().to_string(),
            _ => value,
        };
        pairs.push((field.name(), value));
    }

    ctx.print_kv(&pairs, snapshot.as_ref());
    Ok(())
}
