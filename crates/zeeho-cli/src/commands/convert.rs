//! Convert command - WGS84 / GCJ02 / BD09

use anyhow::{bail, Result};
use zeeho_core::{CoordSystem, CoordinatePair, MapPositions};

use crate::output::{OutputContext, PositionRow};

/// Convert one position and print it in the requested system(s)
pub fn convert(
    longitude: f64,
    latitude: f64,
    from: CoordSystem,
    to: Option<CoordSystem>,
    ctx: &OutputContext,
) -> Result<()> {
    if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
        bail!(
            "Position out of range: longitude {}, latitude {}",
            longitude,
            latitude
        );
    }

    let rows = conversion_rows(CoordinatePair::new(longitude, latitude), from, to);
    ctx.print(&rows);
    Ok(())
}

fn conversion_rows(
    position: CoordinatePair,
    from: CoordSystem,
    to: Option<CoordSystem>,
) -> Vec<PositionRow> {
    let positions = MapPositions::from_position(position, from);
    let targets = match to {
        Some(system) => vec![system],
        None => CoordSystem::ALL.to_vec(),
    };

    targets
        .into_iter()
        .map(|system| {
            let pair = positions.get(system);
            PositionRow {
                system: system.to_string(),
                longitude: format!("{:.6}", pair.longitude),
                latitude: format!("{:.6}", pair.latitude),
            }
        })
        .collect()
}
