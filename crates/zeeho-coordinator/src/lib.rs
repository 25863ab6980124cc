//! zeeho-coordinator - Scheduled telemetry refresh and vehicle commands
//!
//! - [`PollingCoordinator`]: cached, coalesced, time-bounded telemetry refresh
//! - [`Poller`]: fixed-interval driver with failure escalation
//! - [`UnlockExecutor`]: network unlock followed by an immediate refresh
//! - [`ZeehoConfig`]: TOML configuration wiring the above together

pub mod config;
pub mod coordinator;
pub mod error;
pub mod poller;
pub mod unlock;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, CredentialsConfig, Services, ZeehoConfig};
pub use coordinator::{
    CoordinatorConfig, CoordinatorStatus, Phase, PollingCoordinator, RefreshResult,
    DEFAULT_FETCH_TIMEOUT,
};
pub use error::{FailureKind, RefreshError, UnlockError};
pub use poller::{PollPolicy, Poller, PollerExit};
pub use unlock::{UnlockExecutor, UnlockOutcome, DEFAULT_UNLOCK_TIMEOUT};
