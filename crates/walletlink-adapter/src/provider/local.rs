/*
[INPUT]:  EVM private key (hex string) and a starting chain id
[OUTPUT]: WalletProvider that connects instantly and signs with a local key
[POS]:    Provider layer - in-process EVM key implementation
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::http::{LinkError, Result};
use crate::provider::{ProviderError, WalletProvider};
use crate::types::ProviderAccount;

/// Provider backed by an in-process secp256k1 key
pub struct LocalKeyProvider {
    id: String,
    name: String,
    signer: PrivateKeySigner,
    address: String,
    chain_id: AtomicU64,
}

impl LocalKeyProvider {
    /// Create a provider from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(id: &str, name: &str, private_key_hex: &str, chain_id: u64) -> Result<Self> {
        let private_key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| LinkError::Config(format!("Invalid EVM private key: {}", e)))?;

        let address = signer.address().to_checksum(None);

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            signer,
            address,
            chain_id: AtomicU64::new(chain_id),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Debug for LocalKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyProvider")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletProvider for LocalKeyProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> std::result::Result<ProviderAccount, ProviderError> {
        Ok(ProviderAccount::new(
            self.address.clone(),
            Some(self.chain_id.load(Ordering::SeqCst)),
        ))
    }

    async fn disconnect(&self) -> std::result::Result<(), ProviderError> {
        Ok(())
    }

    async fn switch_chain(&self, chain_id: u64) -> std::result::Result<u64, ProviderError> {
        self.chain_id.store(chain_id, Ordering::SeqCst);
        Ok(chain_id)
    }

    async fn sign_message(
        &self,
        address: &str,
        message: &str,
    ) -> std::result::Result<String, ProviderError> {
        if !address.eq_ignore_ascii_case(&self.address) {
            return Err(ProviderError::new()
                .with_name("AccountMismatchError")
                .with_message(format!("account {address} is not managed by this provider")));
        }

        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| {
                ProviderError::new()
                    .with_name("SigningError")
                    .with_message(format!("Failed to sign EVM message: {}", e))
            })?;

        // as_bytes() returns [r, s, v]
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}
