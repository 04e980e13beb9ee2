/*
[INPUT]:  Persisted provider name, orchestrator connection state
[OUTPUT]: One silent reconnect attempt at startup
[POS]:    Recovery layer - restores the last wallet across restarts
[UPDATE]: When startup reconnect rules change
*/

use tracing::{debug, info};

use crate::orchestrator::{ConnectOutcome, ConnectionOrchestrator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectOutcome {
    AlreadyConnected,
    NothingPersisted,
    /// A name was persisted but no registered provider matches it
    ProviderUnavailable { provider_name: String },
    Attempted {
        provider_name: String,
        outcome: ConnectOutcome,
    },
}

/// Best-effort startup reconnect.
///
/// Never escalates: failures of the attempt itself travel through the
/// orchestrator's usual events and are only logged here.
#[derive(Debug, Clone)]
pub struct AutoReconnect {
    orchestrator: ConnectionOrchestrator,
}

impl AutoReconnect {
    pub fn new(orchestrator: ConnectionOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn run(&self) -> ReconnectOutcome {
        if self.orchestrator.is_connected() {
            debug!("Wallet already connected, skipping auto-reconnect");
            return ReconnectOutcome::AlreadyConnected;
        }

        let Some(provider_name) = self.orchestrator.store().read() else {
            debug!("No persisted wallet to reconnect");
            return ReconnectOutcome::NothingPersisted;
        };

        let Some(handle) = self.orchestrator.registry().find_by_name(&provider_name) else {
            info!(provider = %provider_name, "Persisted wallet is no longer available");
            return ReconnectOutcome::ProviderUnavailable { provider_name };
        };

        info!(provider = %provider_name, "Reconnecting last used wallet");
        let outcome = self.orchestrator.connect_provider(handle).await;
        debug!(provider = %provider_name, ?outcome, "Auto-reconnect attempt finished");

        ReconnectOutcome::Attempted {
            provider_name,
            outcome,
        }
    }
}
