/*
[INPUT]:  Message to sign and the connected account
[OUTPUT]: Signature string for authentication
[POS]:    Auth layer - wallet signing abstraction
[UPDATE]: When adding new signer kinds or changing signature format
*/

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::Result;
use crate::provider::WalletProvider;

/// Trait for wallet signing operations
///
/// The trait is async to support extension popups and remote signers.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Chain the account is currently on
    fn chain_id(&self) -> u64;

    /// Get the wallet address
    fn address(&self) -> &str;

    /// Sign a message and return the hex-encoded signature (0x...)
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// Signs through a connected wallet provider
#[derive(Clone)]
pub struct ProviderSigner {
    provider: Arc<dyn WalletProvider>,
    address: String,
    chain_id: u64,
}

impl ProviderSigner {
    pub fn new(provider: Arc<dyn WalletProvider>, address: &str, chain_id: u64) -> Self {
        Self {
            provider,
            address: address.to_string(),
            chain_id,
        }
    }
}

#[async_trait]
impl WalletSigner for ProviderSigner {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        Ok(self.provider.sign_message(&self.address, message).await?)
    }
}

/// Mock wallet signer for testing
#[derive(Debug, Clone)]
pub struct MockWalletSigner {
    chain_id: u64,
    address: String,
    signature: String,
}

impl MockWalletSigner {
    /// Create a new mock signer with predetermined signature
    pub fn new(chain_id: u64, address: &str, signature: &str) -> Self {
        Self {
            chain_id,
            address: address.to_string(),
            signature: signature.to_string(),
        }
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, _message: &str) -> Result<String> {
        Ok(self.signature.clone())
    }
}
