//! ZEEHO Client Library
//!
//! Signed HTTP client for the ZEEHO vehicle cloud.
//!
//! # Example
//!
//! ```rust,no_run
//! use zeeho_client::{Credentials, ZeehoClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = Credentials::new("auth", "x-sign", "app-id", "nonce", "sig", "ua");
//!     let client = ZeehoClient::new(creds)?;
//!
//!     let telemetry = client.get_telemetry().await?;
//!     println!("{} vehicle(s), code {}", telemetry.vehicles().len(), telemetry.code);
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a scripted upstream for integration tests:
//!
//! ```rust,ignore
//! use zeeho_client::testing::MockUpstream;
//!
//! let upstream = MockUpstream::start().await?;
//! let telemetry = upstream.client()?.get_telemetry().await?;
//! ```

mod client;
mod credentials;
mod error;
pub mod testing;
mod types;

pub use client::{
    param_string, VehicleApi, ZeehoClient, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_TIMEOUT,
};
pub use credentials::Credentials;
pub use error::{ClientError, Result};
pub use types::*;
