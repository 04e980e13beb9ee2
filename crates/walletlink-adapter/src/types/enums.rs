/*
[INPUT]:  Wallet brand identities and serde requirements
[OUTPUT]: Typed wallet identity enum with stable string keys
[POS]:    Data layer - logical wallet identities shared across crates
[UPDATE]: When a wallet brand is added or its display label changes
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical wallet identity.
///
/// Stable across provider SDK versions. Used as the retry-counter key and in
/// user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    MetaMask,
    TokenPocket,
    BitgetWallet,
    ParticleNetwork,
    WalletConnect,
}

impl WalletType {
    pub const ALL: [WalletType; 5] = [
        WalletType::MetaMask,
        WalletType::TokenPocket,
        WalletType::BitgetWallet,
        WalletType::ParticleNetwork,
        WalletType::WalletConnect,
    ];

    /// Stable snake_case key
    pub fn as_str(self) -> &'static str {
        match self {
            WalletType::MetaMask => "meta_mask",
            WalletType::TokenPocket => "token_pocket",
            WalletType::BitgetWallet => "bitget_wallet",
            WalletType::ParticleNetwork => "particle_network",
            WalletType::WalletConnect => "wallet_connect",
        }
    }

    /// Human-readable brand label
    pub fn label(self) -> &'static str {
        match self {
            WalletType::MetaMask => "MetaMask",
            WalletType::TokenPocket => "TokenPocket",
            WalletType::BitgetWallet => "Bitget Wallet",
            WalletType::ParticleNetwork => "Particle Network",
            WalletType::WalletConnect => "WalletConnect",
        }
    }

    /// Install page opened when the browser extension is missing.
    ///
    /// Only the primary browser-extension wallet has one.
    pub fn install_url(self) -> Option<&'static str> {
        match self {
            WalletType::MetaMask => Some("https://metamask.io"),
            _ => None,
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wallet type: {0}")]
pub struct UnknownWalletType(pub String);

impl FromStr for WalletType {
    type Err = UnknownWalletType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        WalletType::ALL
            .into_iter()
            .find(|wallet_type| wallet_type.as_str() == key)
            .ok_or_else(|| UnknownWalletType(s.to_string()))
    }
}
