/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed configuration plus the registry, store and binder it describes
[POS]:    Configuration layer - process setup
[UPDATE]: When adding new configuration options
*/

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use walletlink_adapter::{
    LocalKeyProvider, LoginClient, MAX_EXPIRES_SECONDS, ProviderError, ScriptStep, ScriptedProvider,
    SessionBinder, SessionSettings,
};

use crate::network::POLYGON;
use crate::registry::{ProviderHandle, ProviderRegistry};
use crate::retry::RetryPolicy;
use crate::state::{ConnectionStore, FileStorage, MemoryStorage};

/// Top-level configuration for the wallet link client
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletLinkConfig {
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Wallet providers available to this client
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Where the last connected wallet is remembered
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON file path; defaults to `<data dir>/walletlink/storage.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Keep everything in memory (nothing survives the process)
    #[serde(default)]
    pub memory: bool,
}

/// Sign-in exchange settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Login endpoint; session binding is disabled when absent
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_statement")]
    pub statement: String,
    #[serde(default = "default_expires_seconds")]
    pub expires_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_url: None,
            platform: default_platform(),
            domain: default_domain(),
            uri: default_uri(),
            statement: default_statement(),
            expires_seconds: default_expires_seconds(),
        }
    }
}

impl SessionConfig {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            domain: self.domain.clone(),
            uri: self.uri.clone(),
            statement: self.statement.clone(),
            platform: self.platform.clone(),
            expires_seconds: self.expires_seconds,
        }
    }
}

fn default_platform() -> String {
    SessionSettings::default().platform
}

fn default_domain() -> String {
    SessionSettings::default().domain
}

fn default_uri() -> String {
    SessionSettings::default().uri
}

fn default_statement() -> String {
    SessionSettings::default().statement
}

fn default_expires_seconds() -> u64 {
    SessionSettings::default().expires_seconds
}

/// One wallet provider.
///
/// With `private_key` set the provider signs locally; otherwise it replays
/// `connect_failures` in order and then connects as `address`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub id: String,
    /// Display name; drives wallet type detection
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Hex secp256k1 key for a local signer
    #[serde(default)]
    pub private_key: Option<String>,
    /// Raw EIP-1193 style error objects, replayed in order
    #[serde(default, deserialize_with = "raw_provider_errors")]
    pub connect_failures: Vec<ProviderError>,
    #[serde(default)]
    pub connect_delay_ms: u64,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default, deserialize_with = "raw_provider_error")]
    pub sign_error: Option<ProviderError>,
}

fn default_chain_id() -> u64 {
    POLYGON.id
}

fn raw_provider_errors<'de, D>(deserializer: D) -> Result<Vec<ProviderError>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.iter().map(ProviderError::from_json).collect())
}

fn raw_provider_error<'de, D>(deserializer: D) -> Result<Option<ProviderError>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().map(ProviderError::from_json))
}

impl ProviderConfig {
    fn build(&self) -> Result<ProviderHandle> {
        if let Some(private_key) = &self.private_key {
            let provider = LocalKeyProvider::new(&self.id, &self.name, private_key, self.chain_id)
                .with_context(|| format!("provider '{}': invalid private key", self.id))?;
            return Ok(ProviderHandle::new(provider));
        }

        let address = self
            .address
            .as_deref()
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(|| anyhow!("provider '{}' needs either an address or a private_key", self.id))?;

        let mut provider = ScriptedProvider::new(&self.id, &self.name, address)
            .with_chain_id(self.chain_id)
            .with_script(self.connect_failures.iter().cloned().map(ScriptStep::Fail))
            .with_connect_delay(Duration::from_millis(self.connect_delay_ms));
        if let Some(signature) = &self.signature {
            provider = provider.with_signature(signature);
        }
        if let Some(error) = &self.sign_error {
            provider = provider.with_sign_error(error.clone());
        }
        Ok(ProviderHandle::new(provider))
    }
}

impl WalletLinkConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.base_delay_ms == 0 {
            return Err(anyhow!("retry.base_delay_ms must be greater than zero"));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(anyhow!("retry.max_delay_ms must not be below retry.base_delay_ms"));
        }
        if self.session.expires_seconds == 0 || self.session.expires_seconds > MAX_EXPIRES_SECONDS {
            return Err(anyhow!(
                "session.expires_seconds must be between 1 and {MAX_EXPIRES_SECONDS}"
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(anyhow!("provider id cannot be empty"));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(anyhow!("duplicate provider id '{}'", provider.id));
            }
        }
        Ok(())
    }

    pub fn build_registry(&self) -> Result<ProviderRegistry> {
        let handles = self
            .providers
            .iter()
            .map(ProviderConfig::build)
            .collect::<Result<Vec<_>>>()?;
        Ok(ProviderRegistry::new(handles))
    }

    /// Falls back to a detached store when no data directory exists
    pub fn build_store(&self) -> ConnectionStore {
        if self.storage.memory {
            return ConnectionStore::new(Arc::new(MemoryStorage::new()));
        }

        let path = match &self.storage.path {
            Some(path) => path.clone(),
            None => match FileStorage::default_path() {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Persistence disabled");
                    return ConnectionStore::detached();
                }
            },
        };
        ConnectionStore::new(Arc::new(FileStorage::new(path)))
    }

    pub fn build_session_binder(&self) -> Result<Option<SessionBinder>> {
        let Some(login_url) = &self.session.login_url else {
            return Ok(None);
        };
        let client = LoginClient::new(login_url).context("create login client")?;
        Ok(Some(SessionBinder::new(client, self.session.settings())))
    }
}
