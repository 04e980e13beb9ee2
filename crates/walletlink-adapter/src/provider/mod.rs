/*
[INPUT]:  Wallet provider SDK primitives (connect, disconnect, switch, sign)
[OUTPUT]: Provider trait plus scripted and local-key implementations
[POS]:    Provider layer - boundary to the wallet SDK
[UPDATE]: When the SDK surface grows or a new provider kind is added
*/

pub mod error;
pub mod local;
pub mod scripted;

use async_trait::async_trait;

use crate::types::ProviderAccount;

pub use error::ProviderError;
pub use local::LocalKeyProvider;
pub use scripted::{ScriptStep, ScriptedProvider};

/// A wallet provider as exposed by the SDK.
///
/// Implementations must be cheap to share; the registry hands out
/// `Arc<dyn WalletProvider>` handles and never mutates them.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Stable identifier, used when the display name is unavailable
    fn id(&self) -> &str;

    /// Human-readable display name (e.g. "MetaMask")
    fn name(&self) -> &str;

    /// Request account access
    async fn connect(&self) -> Result<ProviderAccount, ProviderError>;

    /// Drop the provider-side session
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Ask the wallet to change the active chain, returning the new chain id
    async fn switch_chain(&self, chain_id: u64) -> Result<u64, ProviderError>;

    /// Personal-sign a message with the given account
    async fn sign_message(&self, address: &str, message: &str) -> Result<String, ProviderError>;
}
