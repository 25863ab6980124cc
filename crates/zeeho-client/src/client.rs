//! ZEEHO HTTP client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::credentials::Credentials;
use crate::error::{ClientError, Result};
use crate::types::{TelemetryResponse, UnlockResponse};

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://tapi.zeehoev.com/v1.0/app/cfmotoserverapp";

const TELEMETRY_PATH: &str = "vehicleHomePage";
const UNLOCK_PATH: &str = "vehicleSet/network/unlock";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CFMOTO_X_SIGN: HeaderName = HeaderName::from_static("cfmoto-x-sign");
const CFMOTO_X_SIGN_TYPE: HeaderName = HeaderName::from_static("cfmoto-x-sign-type");
const CFMOTO_X_PARAM: HeaderName = HeaderName::from_static("cfmoto-x-param");
const APPID: HeaderName = HeaderName::from_static("appid");
const NONCE: HeaderName = HeaderName::from_static("nonce");
const SIGNATURE: HeaderName = HeaderName::from_static("signature");
const TIMESTAMP: HeaderName = HeaderName::from_static("timestamp");
const INTERFACE_VERSION: HeaderName = HeaderName::from_static("interfaceversion");
const X_APP_INFO: HeaderName = HeaderName::from_static("x-app-info");

/// Operations the polling and unlock layers need from the vehicle cloud
#[async_trait]
pub trait VehicleApi: Send + Sync {
    /// Fetch telemetry for every vehicle on the account
    async fn get_telemetry(&self) -> Result<TelemetryResponse>;

    /// Send a network unlock command
    async fn unlock(&self, secret: &str) -> Result<UnlockResponse>;
}

/// Per-request parameter string carried in `Cfmoto-X-Param`
pub fn param_string(app_id: &str, nonce: &str, timestamp_ms: i64) -> String {
    format!("appID={}&nonce={}&timestamp={}", app_id, nonce, timestamp_ms)
}

/// Signed client for the ZEEHO cloud API
///
/// Every call is a standalone signed request with a fresh timestamp.
#[derive(Debug, Clone)]
pub struct ZeehoClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    app_info: Option<String>,
}

impl ZeehoClient {
    /// Create a client against the production API
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(
            DEFAULT_BASE_URL,
            credentials,
            DEFAULT_TIMEOUT,
            DEFAULT_CONNECT_TIMEOUT,
        )
    }

    /// Create a client with a custom base URL and timeouts
    pub fn with_config(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        // Relative joins replace the last segment unless the path ends in '/'
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self {
            client,
            base_url,
            credentials,
            app_info: None,
        })
    }

    /// Send an `X-App-Info` header with every request
    pub fn with_app_info(mut self, app_info: impl Into<String>) -> Self {
        self.app_info = Some(app_info.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch telemetry for every vehicle on the account
    #[instrument(skip(self))]
    pub async fn get_telemetry(&self) -> Result<TelemetryResponse> {
        let url = self.base_url.join(TELEMETRY_PATH)?;
        let headers = self.signed_headers(chrono::Utc::now().timestamp_millis())?;
        debug!("Fetching telemetry from {}", url);

        let response = self.client.get(url).headers(headers).send().await?;
        self.handle_response(response).await
    }

    /// Send a network unlock command
    #[instrument(skip(self, secret))]
    pub async fn unlock(&self, secret: &str) -> Result<UnlockResponse> {
        let url = self.base_url.join(UNLOCK_PATH)?;
        let mut headers = self.signed_headers(chrono::Utc::now().timestamp_millis())?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(INTERFACE_VERSION, HeaderValue::from_static("2"));
        debug!("Sending unlock command to {}", url);

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&serde_json::json!({ "secret": secret }))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Build the signed header set for one request
    pub(crate) fn signed_headers(&self, timestamp_ms: i64) -> Result<HeaderMap> {
        let creds = &self.credentials;
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            header_value("Authorization", creds.authorization())?,
        );
        headers.insert(
            CFMOTO_X_SIGN,
            header_value("Cfmoto-X-Sign", creds.cfmoto_x_sign())?,
        );
        headers.insert(CFMOTO_X_SIGN_TYPE, HeaderValue::from_static("0"));
        headers.insert(APPID, header_value("Appid", creds.app_id())?);
        headers.insert(NONCE, header_value("Nonce", creds.nonce())?);
        headers.insert(SIGNATURE, header_value("Signature", creds.signature())?);
        headers.insert(TIMESTAMP, HeaderValue::from(timestamp_ms));
        headers.insert(
            CFMOTO_X_PARAM,
            header_value(
                "Cfmoto-X-Param",
                &param_string(creds.app_id(), creds.nonce(), timestamp_ms),
            )?,
        );
        headers.insert(USER_AGENT, header_value("User-Agent", creds.user_agent())?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN"));
        if let Some(app_info) = &self.app_info {
            headers.insert(X_APP_INFO, header_value("X-App-Info", app_info)?);
        }

        Ok(headers)
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(status = status.as_u16(), "Upstream returned an error status");
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader(name))
}

#[async_trait]
impl VehicleApi for ZeehoClient {
    async fn get_telemetry(&self) -> Result<TelemetryResponse> {
        ZeehoClient::get_telemetry(self).await
    }

    async fn unlock(&self, secret: &str) -> Result<UnlockResponse> {
        ZeehoClient::unlock(self, secret).await
    }
}
