/*
[INPUT]:  Provider errors raised by connection attempts
[OUTPUT]: Retry eligibility, failure category and user-facing hints
[POS]:    Error layer - failure classification for the orchestrator
[UPDATE]: When providers surface new error shapes or hint copy changes
*/

use std::fmt;

use serde::Serialize;
use walletlink_adapter::{ProviderError, WalletType};

use crate::event::Notice;

/// Failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    UserRejected,
    ProviderMissing,
    /// Post-connection advisory, never produced by [`classify`]
    NetworkMismatch,
    Transient,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCategory::UserRejected => "user_rejected",
            ErrorCategory::ProviderMissing => "provider_missing",
            ErrorCategory::NetworkMismatch => "network_mismatch",
            ErrorCategory::Transient => "transient",
            ErrorCategory::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub retryable: bool,
    pub category: ErrorCategory,
}

/// Classify a connection failure.
///
/// Rules are evaluated in order: rejection, missing connector, then
/// everything else is retryable.
pub fn classify(error: &ProviderError) -> Classification {
    let name = error.name().to_lowercase();
    let message = error.message().to_lowercase();

    if error.code == Some(ProviderError::USER_REJECTED_CODE)
        || name.contains("rejected")
        || message.contains("rejected")
    {
        return Classification {
            retryable: false,
            category: ErrorCategory::UserRejected,
        };
    }

    if name.contains("notfound") {
        return Classification {
            retryable: false,
            category: ErrorCategory::ProviderMissing,
        };
    }

    let category = if error.is_empty() {
        ErrorCategory::Unknown
    } else {
        ErrorCategory::Transient
    };
    Classification {
        retryable: true,
        category,
    }
}

pub const HINT_REJECTED: &str = "Request was rejected. Please approve in your wallet to continue.";
pub const HINT_NETWORK: &str =
    "Unsupported network. Please switch to the correct network in your wallet.";
pub const HINT_PENDING: &str =
    "There is a pending request in your wallet. Please complete or cancel it first.";
pub const HINT_TIMEOUT: &str =
    "The request timed out. Please ensure your wallet is open and unlocked, then retry.";
pub const HINT_WALLET_CONNECT: &str = "Open your wallet app to approve the session. If it fails, disconnect the old session and try again.";

const NETWORK_PHRASES: &[&str] = &["unsupported chain", "chain not configured", "switch chain"];
const PENDING_PHRASES: &[&str] = &["already pending"];
const TIMEOUT_PHRASES: &[&str] = &["timeout", "timed out", "deadline"];

/// Advisory hint for a failure, independent of retry eligibility.
///
/// Returns `None` when nothing specific applies; callers substitute the
/// wallet's default tip.
pub fn friendly_hint(error: &ProviderError, wallet_type: WalletType) -> Option<&'static str> {
    let name = error.name().to_lowercase();
    let message = error.message().to_lowercase();
    let mentions = |phrases: &[&str]| phrases.iter().any(|phrase| message.contains(phrase));

    if error.code == Some(ProviderError::USER_REJECTED_CODE)
        || name.contains("rejected")
        || message.contains("rejected")
    {
        return Some(HINT_REJECTED);
    }
    if mentions(NETWORK_PHRASES) {
        return Some(HINT_NETWORK);
    }
    if mentions(PENDING_PHRASES) {
        return Some(HINT_PENDING);
    }
    if mentions(TIMEOUT_PHRASES) {
        return Some(HINT_TIMEOUT);
    }
    if wallet_type == WalletType::WalletConnect {
        return Some(HINT_WALLET_CONNECT);
    }
    None
}

/// Terminal-error title and default tip for a wallet type
pub fn failure_copy(wallet_type: WalletType) -> (&'static str, &'static str) {
    match wallet_type {
        WalletType::MetaMask => (
            "MetaMask connection failed",
            "Open MetaMask, ensure it's unlocked, then try again.",
        ),
        WalletType::TokenPocket => (
            "TokenPocket connection failed",
            "Open TokenPocket and unlock. Ensure the DApp browser/extension is allowed.",
        ),
        WalletType::BitgetWallet => (
            "Bitget Wallet connection failed",
            "Open Bitget Wallet and unlock. Ensure the extension is enabled on this site.",
        ),
        WalletType::ParticleNetwork => (
            "Particle Network connection failed",
            "Make sure popups are not blocked and retry.",
        ),
        WalletType::WalletConnect => (
            "WalletConnect session failed",
            "Approve the session in your wallet app. If it persists, disconnect in your wallet and try again.",
        ),
    }
}

/// User-visible notice for a terminal connection failure
pub fn failure_notice(error: &ProviderError, wallet_type: WalletType) -> Notice {
    let (title, tip) = failure_copy(wallet_type);
    let message = friendly_hint(error, wallet_type).unwrap_or(tip);
    Notice::new(title, message)
}
