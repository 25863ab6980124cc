//! zeeho-api - Local REST surface for ZEEHO telemetry
//!
//! Serves the coordinator's cached snapshot, the field catalogue, map
//! positions and the refresh/unlock commands.
//!
//! # Usage
//!
//! ```ignore
//! use zeeho_api::{create_router, AppState};
//!
//! let services = config.build_services()?;
//! let state = AppState::new(services.coordinator, services.unlock);
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the REST router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(handlers::status::get_status))
        // Snapshot reads
        .route("/vehicle", get(handlers::vehicle::get_vehicle))
        .route("/vehicle/fields", get(handlers::vehicle::list_fields))
        .route("/vehicle/fields/{field}", get(handlers::vehicle::get_field))
        .route("/vehicle/map", get(handlers::vehicle::get_map))
        // Commands
        .route("/vehicle/refresh", post(handlers::commands::refresh))
        .route("/vehicle/unlock", post(handlers::commands::unlock))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
