//! Field commands - catalogue and single values

use anyhow::Result;
use serde_json::json;
use zeeho_coordinator::ZeehoConfig;
use zeeho_core::{SnapshotField, VehicleSnapshot};

use crate::output::{format_value, FieldRow, OutputContext};

fn row(field: SnapshotField, snapshot: &VehicleSnapshot) -> FieldRow {
    FieldRow {
        key: field.key().to_string(),
        name: field.name().to_string(),
        value: format_value(&field.value(snapshot)),
        unit: field.unit().unwrap_or_default().to_string(),
    }
}

/// List every field with its current value
pub async fn fields(config: &ZeehoConfig, ctx: &OutputContext) -> Result<()> {
    let snapshot = super::fetch_snapshot(config).await?;

    if ctx.is_json() {
        let items: Vec<serde_json::Value> = SnapshotField::ALL
            .into_iter()
            .map(|f| {
                let mut entry = serde_json::to_value(f.info())?;
                entry["value"] = f.value(&snapshot);
                Ok(entry)
            })
            .collect::<Result<_>>()?;
        ctx.print_json(&items);
    } else {
        let rows: Vec<FieldRow> = SnapshotField::ALL
            .into_iter()
            .map(|f| row(f, &snapshot))
            .collect();
        ctx.print(&rows);
    }
    Ok(())
}

/// Show a single field
pub async fn field(config: &ZeehoConfig, name: &str, ctx: &OutputContext) -> Result<()> {
    // Reject unknown names before touching the network
    let field: SnapshotField = name.parse()?;
    let snapshot = super::fetch_snapshot(config).await?;

    if ctx.is_json() {
        ctx.print_json(&json!({
            "key": field.key(),
            "name": field.name(),
            "unit": field.unit(),
            "value": field.value(&snapshot),
            "query_time": snapshot.query_time,
        }));
    } else if ctx.quiet {
        println!("{}", format_value(&field.value(&snapshot)));
    } else {
        ctx.print_one(&row(field, &snapshot));
    }
    Ok(())
}
