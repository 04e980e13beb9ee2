/*
[INPUT]:  Orchestrator transitions, retries, failures and session results
[OUTPUT]: Cloneable events and notices for the presentation layer
[POS]:    Event layer - everything observers can react to
[UPDATE]: When a new observable transition or notice is added
*/

use std::time::Duration;

use serde::Serialize;
use walletlink_adapter::{ProviderError, WalletType};

use crate::classifier::ErrorCategory;

/// Title/message pair shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Announcement of a scheduled retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryNotice {
    pub wallet_type: WalletType,
    pub attempt: u32,
    pub max: u32,
    pub delay: Duration,
}

impl RetryNotice {
    pub fn label(&self) -> &'static str {
        self.wallet_type.label()
    }

    pub fn notice(&self) -> Notice {
        Notice::new(
            format!("Retrying {}...", self.label()),
            format!("Attempt {} of {}", self.attempt, self.max),
        )
    }
}

/// One in-flight connection attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionAttempt {
    pub wallet_type: WalletType,
    pub provider_name: String,
    pub attempt_number: u32,
}

/// The wallet connection currently established
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveConnection {
    pub address: String,
    pub provider_name: String,
    pub wallet_type: WalletType,
    pub chain_id: Option<u64>,
}

/// Terminal, user-visible connection failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectFailure {
    pub wallet_type: WalletType,
    pub category: ErrorCategory,
    pub notice: Notice,
    #[serde(skip)]
    pub error: Option<ProviderError>,
    /// The failure was retryable but the retry budget ran out
    pub retries_exhausted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorEvent {
    Connecting(ConnectionAttempt),
    Retrying(RetryNotice),
    Connected(ActiveConnection),
    Failed(ConnectFailure),
    OpenInstallPage {
        wallet_type: WalletType,
        url: &'static str,
    },
    Disconnected {
        address: String,
        provider_name: String,
    },
    SessionEstablished {
        address: String,
    },
    SessionFailed {
        address: String,
        notice: Notice,
    },
}

impl OrchestratorEvent {
    /// Wallet type the event concerns, when it concerns one
    pub fn wallet_type(&self) -> Option<WalletType> {
        match self {
            OrchestratorEvent::Connecting(attempt) => Some(attempt.wallet_type),
            OrchestratorEvent::Retrying(notice) => Some(notice.wallet_type),
            OrchestratorEvent::Connected(connection) => Some(connection.wallet_type),
            OrchestratorEvent::Failed(failure) => Some(failure.wallet_type),
            OrchestratorEvent::OpenInstallPage { wallet_type, .. } => Some(*wallet_type),
            _ => None,
        }
    }

    /// Notice the presentation layer should surface, if any
    pub fn notice(&self) -> Option<Notice> {
        match self {
            OrchestratorEvent::Retrying(retry) => Some(retry.notice()),
            OrchestratorEvent::Failed(failure) => Some(failure.notice.clone()),
            OrchestratorEvent::SessionFailed { notice, .. } => Some(notice.clone()),
            _ => None,
        }
    }
}
