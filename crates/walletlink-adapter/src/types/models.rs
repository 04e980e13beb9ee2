/*
[INPUT]:  Provider SDK connect results
[OUTPUT]: Typed account snapshot returned by a wallet provider
[POS]:    Data layer - provider-facing models
[UPDATE]: When providers expose more account metadata
*/

use serde::{Deserialize, Serialize};

/// Account exposed by a provider after a successful connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub address: String,
    #[serde(rename = "chainId", default)]
    pub chain_id: Option<u64>,
}

impl ProviderAccount {
    pub fn new(address: impl Into<String>, chain_id: Option<u64>) -> Self {
        Self {
            address: address.into(),
            chain_id,
        }
    }
}
