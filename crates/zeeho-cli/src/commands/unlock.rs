//! Unlock command - network unlock

use anyhow::{Context, Result};
use zeeho_coordinator::ZeehoConfig;

use crate::output::OutputContext;

/// Unlock the vehicle with the given or configured secret
pub async fn unlock(config: &ZeehoConfig, secret: Option<&str>, ctx: &OutputContext) -> Result<()> {
    let services = config.build_services()?;

    if !ctx.is_json() {
        ctx.info("Sending unlock command...");
    }

    let outcome = match secret.filter(|s| !s.is_empty()) {
        Some(secret) => services.unlock.unlock_vehicle(secret).await,
        None => services.unlock.unlock_with_configured_secret().await,
    }
    .context("Unlock failed")?;

    if ctx.is_json() {
        ctx.print_json(&outcome);
        return Ok(());
    }

    ctx.success("Vehicle unlocked");
    if !outcome.refreshed {
        ctx.warn("Unlock succeeded but the follow-up refresh failed");
    }
    Ok(())
}
