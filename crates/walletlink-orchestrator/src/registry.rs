/*
[INPUT]:  Wallet providers registered at startup
[OUTPUT]: Provider handles resolved by wallet type or persisted name
[POS]:    Registry layer - maps logical wallet identities to concrete providers
[UPDATE]: When the brand name-matching table changes
*/

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use walletlink_adapter::{WalletProvider, WalletType};

/// Ordered substring rules from lowercase display name to wallet type.
///
/// The first matching rule wins; unmatched names fall back to WalletConnect.
const NAME_RULES: &[(&str, WalletType)] = &[
    ("metamask", WalletType::MetaMask),
    ("token", WalletType::TokenPocket),
    ("bitget", WalletType::BitgetWallet),
    ("bitkeep", WalletType::BitgetWallet),
    ("particle", WalletType::ParticleNetwork),
    ("walletconnect", WalletType::WalletConnect),
];

/// Derive the wallet type from a provider display name
pub fn wallet_type_for_name(name: &str) -> WalletType {
    let lower = name.to_lowercase();
    NAME_RULES
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map(|(_, wallet_type)| *wallet_type)
        .unwrap_or(WalletType::WalletConnect)
}

/// Whether a display name identifies the given wallet type.
///
/// Unlike [`wallet_type_for_name`] there is no fallback: WalletConnect only
/// matches names that actually contain "walletconnect".
pub fn name_matches(wallet_type: WalletType, name: &str) -> bool {
    let lower = name.to_lowercase();
    NAME_RULES
        .iter()
        .any(|(fragment, rule_type)| *rule_type == wallet_type && lower.contains(fragment))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no provider registered for {0}")]
    NotFound(WalletType),
}

/// Shared reference to a registered provider
#[derive(Clone)]
pub struct ProviderHandle {
    provider: Arc<dyn WalletProvider>,
}

impl ProviderHandle {
    pub fn new<P: WalletProvider + 'static>(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    pub fn from_arc(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    pub fn id(&self) -> &str {
        self.provider.id()
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Display name, or the identifier when the name is blank
    pub fn display_name(&self) -> &str {
        let name = self.name();
        if name.trim().is_empty() { self.id() } else { name }
    }

    pub fn wallet_type(&self) -> WalletType {
        wallet_type_for_name(self.display_name())
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    /// Whether two handles point at the same provider instance
    pub fn same_provider(&self, other: &ProviderHandle) -> bool {
        Arc::ptr_eq(&self.provider, &other.provider)
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// Immutable list of providers known to this client session
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderHandle>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderHandle>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[ProviderHandle] {
        &self.providers
    }

    /// First provider whose display name identifies the wallet type
    pub fn resolve(&self, wallet_type: WalletType) -> Result<ProviderHandle, RegistryError> {
        self.providers
            .iter()
            .find(|handle| name_matches(wallet_type, handle.display_name()))
            .cloned()
            .ok_or(RegistryError::NotFound(wallet_type))
    }

    /// First provider whose display name contains `fragment`, case-insensitively
    pub fn find_by_name(&self, fragment: &str) -> Option<ProviderHandle> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.providers
            .iter()
            .find(|handle| handle.display_name().to_lowercase().contains(&needle))
            .cloned()
    }
}
