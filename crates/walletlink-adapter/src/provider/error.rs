/*
[INPUT]:  Raw failures raised by wallet provider SDKs (EIP-1193 style)
[OUTPUT]: Uniform provider error value with optional code, name and message
[POS]:    Provider layer - the failure type every provider returns
[UPDATE]: When providers surface new error shapes
*/

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure raised by a wallet provider.
///
/// Every field is optional because providers disagree on what they fill in.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", self.describe())]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProviderError {
    /// EIP-1193 "user rejected request"
    pub const USER_REJECTED_CODE: i64 = 4001;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn user_rejected() -> Self {
        Self::new()
            .with_code(Self::USER_REJECTED_CODE)
            .with_name("UserRejectedRequestError")
            .with_message("User rejected the request.")
    }

    pub fn connector_not_found() -> Self {
        Self::new()
            .with_name("ConnectorNotFoundError")
            .with_message("Connector not found")
    }

    /// Build from a raw JSON error object.
    ///
    /// The code is read from `code`, falling back to `data.code`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let code = value
            .get("code")
            .and_then(serde_json::Value::as_i64)
            .or_else(|| {
                value
                    .get("data")
                    .and_then(|data| data.get("code"))
                    .and_then(serde_json::Value::as_i64)
            });
        let text = |key: &str| {
            value
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        Self {
            code,
            name: text("name"),
            message: text("message"),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(Self::USER_REJECTED_CODE) || self.name() == "UserRejectedRequestError"
    }

    /// True when nothing identifies the failure
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.name().is_empty() && self.message().is_empty()
    }

    fn describe(&self) -> String {
        let text = match (self.name.as_deref(), self.message.as_deref()) {
            (Some(name), Some(message)) => format!("{name}: {message}"),
            (Some(name), None) => name.to_string(),
            (None, Some(message)) => message.to_string(),
            (None, None) => "unknown provider error".to_string(),
        };
        match self.code {
            Some(code) => format!("{text} (code {code})"),
            None => text,
        }
    }
}
