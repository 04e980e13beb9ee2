/*
[INPUT]:  HTTP configuration (login URL, timeouts)
[OUTPUT]: Configured reqwest client for the login exchange
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::{LinkError, Result};
use crate::types::{LoginRequest, LoginResponse};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the session/login backend
#[derive(Debug, Clone)]
pub struct LoginClient {
    http_client: Client,
    login_url: Url,
    timeout: Duration,
}

impl LoginClient {
    /// Create a new client with default configuration
    pub fn new(login_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), login_url)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, login_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            login_url: Url::parse(login_url)?,
            timeout: config.timeout,
        })
    }

    /// Login endpoint
    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Exchange a signed challenge for a session token
    ///
    /// POST {login_url}
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        debug!(address = %request.address, platform = %request.platform, "posting login exchange");
        let builder = self
            .http_client
            .request(Method::POST, self.login_url.clone())
            .json(request);
        self.send_json(builder).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                LinkError::Timeout {
                    duration: self.timeout.as_secs(),
                }
            } else {
                LinkError::Http(err)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LinkError::api_error(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
