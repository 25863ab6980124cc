//! zeehod - ZEEHO telemetry daemon
//!
//! Polls the ZEEHO cloud API on a fixed interval and, when `[server]
//! listen` is configured, serves the latest snapshot over REST.
//!
//! Usage:
//!   zeehod [OPTIONS] [config.toml]
//!
//! Secrets may be supplied through ZEEHO_AUTHORIZATION, ZEEHO_SIGNATURE,
//! ZEEHO_CFMOTO_X_SIGN and ZEEHO_UNLOCK_SECRET instead of the file.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeeho_api::{create_router, AppState};
use zeeho_coordinator::{FailureKind, Poller, PollerExit, ZeehoConfig};

const DEFAULT_CONFIG_PATH: &str = "zeehod.toml";

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: String,
    /// Refresh once, print the snapshot and exit
    once: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args {
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        once: false,
    };

    for arg in &args {
        match arg.as_str() {
            "--once" => result.once = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = arg.to_string();
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"zeehod - ZEEHO telemetry daemon

Usage: zeehod [OPTIONS] [config.toml]

Arguments:
  [config.toml]  Daemon configuration (default: zeehod.toml)

Options:
      --once     Refresh once, print the snapshot as JSON and exit
  -h, --help     Print this help message

Environment:
  ZEEHO_AUTHORIZATION, ZEEHO_SIGNATURE, ZEEHO_CFMOTO_X_SIGN,
  ZEEHO_UNLOCK_SECRET   Override the matching secrets from the file
  RUST_LOG              Log filter (default: info for all zeeho crates)

Examples:
  # Poll and serve with the settings in zeehod.toml
  zeehod

  # One-shot fetch
  zeehod --once /etc/zeeho/zeehod.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "zeehod=info,zeeho_coordinator=info,zeeho_client=info,zeeho_api=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args();

    tracing::info!("Starting zeehod (ZEEHO telemetry daemon)");
    tracing::info!("Loading config from: {}", args.config_path);
    let config = ZeehoConfig::load(&args.config_path)?;
    let services = config.build_services()?;

    tracing::info!(
        slot_index = config.vehicle.slot_index,
        interval_secs = config.polling.interval_secs,
        location_key = %config.vehicle.location_key,
        "Services ready"
    );

    // First refresh up front so configuration mistakes surface immediately
    match services.coordinator.refresh_now().await {
        Ok(snapshot) => {
            tracing::info!(
                vehicle = snapshot.vehicle_name.as_deref().unwrap_or("unknown"),
                battery = ?snapshot.battery_percent,
                online = snapshot.is_online(),
                "Initial snapshot fetched"
            );
            if args.once {
                println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
                return Ok(());
            }
        }
        Err(e) if e.kind() == FailureKind::Misconfiguration || args.once => {
            return Err(e.into());
        }
        Err(e) => {
            tracing::warn!(error = %e, kind = ?e.kind(), "Initial refresh failed, polling continues");
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = match config.server.listen {
        Some(addr) => {
            let state = AppState::new(services.coordinator.clone(), services.unlock.clone())
                .with_coordinate_system(config.vehicle.coordinate_system);
            let app = create_router(state);
            let mut shutdown = shutdown_rx.clone();

            let listener = bind_listener(addr).await?;
            Some(tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.wait_for(|stop| *stop).await;
                    })
                    .await
            }))
        }
        None => {
            tracing::info!("No [server] listen address configured, REST API disabled");
            None
        }
    };

    let poller = Poller::spawn(
        services.coordinator.clone(),
        config.poll_policy(),
        shutdown_rx.clone(),
    );

    let mut poller = std::pin::pin!(poller.join());
    let exit = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
            poller.await
        }
        exit = &mut poller => {
            let _ = shutdown_tx.send(true);
            exit
        }
    };

    if let Some(server) = server {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "REST server failed"),
            Err(e) => tracing::error!(error = %e, "REST server task failed"),
        }
    }

    match exit {
        PollerExit::Shutdown => {
            tracing::info!("zeehod stopped");
            Ok(())
        }
        PollerExit::Halted(e) => Err(anyhow::anyhow!("polling halted: {}", e)),
        PollerExit::Aborted => Err(anyhow::anyhow!("polling task aborted")),
    }
}

/// Bind the REST listener up front so a taken port stops startup
async fn bind_listener(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind REST listener on {}", addr))?;
    tracing::info!("Listening on http://{}", addr);
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_listener_reports_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = bind_listener(addr).await.unwrap_err();
        assert!(format!("{:#}", err).contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn test_bind_listener_free_port() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
