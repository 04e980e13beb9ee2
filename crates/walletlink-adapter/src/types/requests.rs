/*
[INPUT]:  Signed sign-in credential and platform tag
[OUTPUT]: Serializable login exchange request body
[POS]:    Data layer - request types for the login backend
[UPDATE]: When the login request schema changes
*/

use serde::{Deserialize, Serialize};

/// Body posted to the login exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub address: String,
    pub message: String,
    pub signature: String,
    pub platform: String,
}
