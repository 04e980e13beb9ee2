/*
[INPUT]:  Login backend JSON responses
[OUTPUT]: Typed login envelope with access token and profile
[POS]:    Data layer - response types for the login backend
[UPDATE]: When the login response schema changes
*/

use serde::{Deserialize, Serialize};

/// Envelope code signalling a successful login
pub const LOGIN_SUCCESS_CODE: i64 = 200;

/// Login exchange response envelope: `{code, data: {accessToken, ...profile}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<LoginData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(rename = "accessToken", default)]
    pub access_token: String,
    /// Remaining profile fields, kept verbatim
    #[serde(flatten)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

impl LoginResponse {
    /// Access token when the envelope reports success and carries one
    pub fn access_token(&self) -> Option<&str> {
        if self.code != LOGIN_SUCCESS_CODE {
            return None;
        }
        self.data
            .as_ref()
            .map(|data| data.access_token.as_str())
            .filter(|token| !token.is_empty())
    }
}
