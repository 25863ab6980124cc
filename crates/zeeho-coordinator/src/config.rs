//! TOML configuration
//!
//! ```toml
//! [credentials]
//! authorization = "Bearer ..."
//! cfmoto_x_sign = "..."
//! app_id = "..."
//! nonce = "..."
//! signature = "..."
//! user_agent = "..."
//!
//! [vehicle]
//! slot_index = 0
//!
//! [polling]
//! interval_secs = 90
//!
//! [server]
//! listen = "127.0.0.1:18090"
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeeho_client::{ClientError, Credentials, ZeehoClient, DEFAULT_BASE_URL};
use zeeho_core::{CoordSystem, Normalizer};

use crate::coordinator::{CoordinatorConfig, PollingCoordinator};
use crate::poller::PollPolicy;
use crate::unlock::UnlockExecutor;

/// Bounds on the refresh interval, seconds
pub const MIN_INTERVAL_SECS: u64 = 10;
pub const MAX_INTERVAL_SECS: u64 = 3600;

pub const ENV_AUTHORIZATION: &str = "ZEEHO_AUTHORIZATION";
pub const ENV_SIGNATURE: &str = "ZEEHO_SIGNATURE";
pub const ENV_CFMOTO_X_SIGN: &str = "ZEEHO_CFMOTO_X_SIGN";
pub const ENV_UNLOCK_SECRET: &str = "ZEEHO_UNLOCK_SECRET";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to build client: {0}")]
    Client(#[from] ClientError),
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZeehoConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[credentials]` as written in the file
///
/// Environment overrides land here; [`CredentialsConfig::build`] produces
/// the read-only [`Credentials`] handed to the client.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default, skip_serializing)]
    pub authorization: String,
    #[serde(default, skip_serializing)]
    pub cfmoto_x_sign: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub nonce: String,
    #[serde(default, skip_serializing)]
    pub signature: String,
    #[serde(default)]
    pub user_agent: String,
}

impl CredentialsConfig {
    pub fn build(&self) -> Credentials {
        Credentials::new(
            self.authorization.clone(),
            self.cfmoto_x_sign.clone(),
            self.app_id.clone(),
            self.nonce.clone(),
            self.signature.clone(),
            self.user_agent.clone(),
        )
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.build(), f)
    }
}

/// Upstream endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// HTTP request timeout, seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Optional `X-App-Info` header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_info: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            app_info: None,
        }
    }
}

/// Which vehicle to track and how to present it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    #[serde(default)]
    pub slot_index: usize,
    /// Stable identifier stamped on every snapshot
    #[serde(default = "default_location_key")]
    pub location_key: String,
    #[serde(default = "default_device_model")]
    pub device_model: String,
    /// Reference system the upstream reports positions in
    #[serde(default)]
    pub coordinate_system: CoordSystem,
    #[serde(default, skip_serializing)]
    pub unlock_secret: Option<String>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            slot_index: 0,
            location_key: default_location_key(),
            device_model: default_device_model(),
            coordinate_system: CoordSystem::default(),
            unlock_secret: None,
        }
    }
}

/// Poll schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_threshold")]
    pub failure_alarm_threshold: u32,
    #[serde(default = "default_threshold")]
    pub max_persistent_failures: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            failure_alarm_threshold: default_threshold(),
            max_persistent_failures: default_threshold(),
        }
    }
}

/// Local HTTP surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to serve on; no server when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<SocketAddr>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_location_key() -> String {
    "zeeho".to_string()
}

fn default_device_model() -> String {
    zeeho_core::normalize::DEFAULT_DEVICE_MODEL.to_string()
}

fn default_interval_secs() -> u64 {
    90
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_threshold() -> u32 {
    3
}

/// Everything built from one configuration
pub struct Services {
    pub client: Arc<ZeehoClient>,
    pub coordinator: PollingCoordinator,
    pub unlock: UnlockExecutor,
}

impl ZeehoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override secrets from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override secrets from an arbitrary lookup; empty values are ignored
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_AUTHORIZATION) {
            self.credentials.authorization = v;
        }
        if let Some(v) = get(ENV_SIGNATURE) {
            self.credentials.signature = v;
        }
        if let Some(v) = get(ENV_CFMOTO_X_SIGN) {
            self.credentials.cfmoto_x_sign = v;
        }
        if let Some(v) = get(ENV_UNLOCK_SECRET) {
            self.vehicle.unlock_secret = Some(v);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.polling.interval_secs;
        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&interval) {
            return Err(ConfigError::Invalid(format!(
                "polling.interval_secs must be between {} and {}, got {}",
                MIN_INTERVAL_SECS, MAX_INTERVAL_SECS, interval
            )));
        }
        if self.api.timeout_secs == 0 || self.polling.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".into()));
        }
        if self.polling.max_persistent_failures == 0 {
            return Err(ConfigError::Invalid(
                "polling.max_persistent_failures must be at least 1".into(),
            ));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::Invalid(format!("api.base_url: {}", e)))?;

        let missing = self.credentials.build().missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::new(self.vehicle.slot_index, self.refresh_interval())
            .with_fetch_timeout(Duration::from_secs(self.polling.fetch_timeout_secs))
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.refresh_interval(),
            failure_alarm_threshold: self.polling.failure_alarm_threshold,
            max_persistent_failures: self.polling.max_persistent_failures,
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.vehicle.location_key.clone())
            .with_device_model(self.vehicle.device_model.clone())
    }

    pub fn build_client(&self) -> Result<ZeehoClient, ConfigError> {
        let client = ZeehoClient::with_config(
            &self.api.base_url,
            self.credentials.build(),
            Duration::from_secs(self.api.timeout_secs),
            Duration::from_secs(self.api.connect_timeout_secs),
        )?;
        Ok(match &self.api.app_info {
            Some(app_info) => client.with_app_info(app_info.clone()),
            None => client,
        })
    }

    /// Build client, coordinator and unlock executor
    pub fn build_services(&self) -> Result<Services, ConfigError> {
        let client = Arc::new(self.build_client()?);
        let coordinator =
            PollingCoordinator::new(client.clone(), self.normalizer(), self.coordinator_config());
        let unlock = UnlockExecutor::new(client.clone())
            .with_coordinator(coordinator.clone())
            .with_secret(self.vehicle.unlock_secret.clone())
            .with_timeout(Duration::from_secs(self.polling.fetch_timeout_secs));

        Ok(Services {
            client,
            coordinator,
            unlock,
        })
    }
}
