//! ZEEHO CLI - Command-line tool for ZEEHO vehicle telemetry
//!
//! Fetches a snapshot straight from the cloud API using the same TOML
//! configuration as `zeehod`.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zeeho_core::CoordSystem;

use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "zeeho-cli")]
#[command(author, version, about = "ZEEHO Vehicle Telemetry CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path (defaults to <config dir>/zeeho/config.toml)
    #[arg(short, long, env = "ZEEHO_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and show the current vehicle snapshot
    Status,

    /// Show every exposed field with its current value
    Fields,

    /// Show a single field
    Field {
        /// Field key, e.g. battery_percent or lock-state
        name: String,
    },

    /// Unlock the vehicle over the network
    Unlock {
        /// Unlock secret (defaults to vehicle.unlock_secret / ZEEHO_UNLOCK_SECRET)
        #[arg(long)]
        secret: Option<String>,
    },

    /// Convert a position between WGS84, GCJ02 and BD09
    Convert {
        /// Source system: wgs84, gcj02, bd09
        #[arg(long, default_value = "wgs84")]
        from: CoordSystem,

        /// Target system (all three when omitted)
        #[arg(long)]
        to: Option<CoordSystem>,

        /// Longitude in degrees
        #[arg(allow_hyphen_values = true)]
        longitude: f64,

        /// Latitude in degrees
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);

    let result = match &cli.command {
        Commands::Convert {
            from,
            to,
            longitude,
            latitude,
        } => commands::convert(*longitude, *latitude, *from, *to, &ctx),

        Commands::Status => {
            let config = config::load(cli.config.as_deref())?;
            commands::status(&config, &ctx).await
        }

        Commands::Fields => {
            let config = config::load(cli.config.as_deref())?;
            commands::fields(&config, &ctx).await
        }

        Commands::Field { name } => {
            let config = config::load(cli.config.as_deref())?;
            commands::field(&config, name, &ctx).await
        }

        Commands::Unlock { secret } => {
            let config = config::load(cli.config.as_deref())?;
            commands::unlock(&config, secret.as_deref(), &ctx).await
        }
    };

    if let Err(e) = &result {
        ctx.error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
