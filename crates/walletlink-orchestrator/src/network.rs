/*
[INPUT]:  Active chain id reported by the connected provider
[OUTPUT]: Supported-network checks, switch requests, derived NetworkStatus
[POS]:    Network layer - post-connection chain validation
[UPDATE]: When the supported network set or status derivation changes
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use walletlink_adapter::{ProviderError, WalletProvider};

use crate::classifier::HINT_NETWORK;
use crate::event::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Network {
    pub id: u64,
    pub name: &'static str,
}

pub const POLYGON: Network = Network {
    id: 137,
    name: "Polygon",
};
pub const LINEA: Network = Network {
    id: 59144,
    name: "Linea",
};
pub const BSC: Network = Network {
    id: 56,
    name: "BNB Smart Chain",
};

/// Fixed, ordered set of networks the app operates on
pub const SUPPORTED_NETWORKS: [Network; 3] = [POLYGON, LINEA, BSC];

pub fn is_supported(chain_id: u64) -> bool {
    SUPPORTED_NETWORKS.iter().any(|network| network.id == chain_id)
}

pub fn network(chain_id: u64) -> Option<Network> {
    SUPPORTED_NETWORKS
        .iter()
        .copied()
        .find(|network| network.id == chain_id)
}

/// Supported network name, else the provider-reported name, else "Unknown"
pub fn chain_name(chain_id: u64, reported: Option<&str>) -> &str {
    match network(chain_id) {
        Some(network) => network.name,
        None => reported.filter(|name| !name.trim().is_empty()).unwrap_or("Unknown"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSeverity {
    Alarm,
    Caution,
    Normal,
}

/// One entry of the network switch menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkOption {
    pub network: Network,
    pub label: String,
    pub disabled: bool,
}

/// Derived network state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    pub current_chain_id: Option<u64>,
    pub is_supported: bool,
    pub switching: bool,
    pub pending_chain_id: Option<u64>,
}

impl NetworkStatus {
    pub fn derive(current_chain_id: Option<u64>, in_flight: usize, pending_chain_id: Option<u64>) -> Self {
        Self {
            current_chain_id,
            is_supported: current_chain_id.is_some_and(is_supported),
            switching: in_flight > 0,
            pending_chain_id,
        }
    }

    pub fn severity(&self) -> StatusSeverity {
        if !self.is_supported {
            StatusSeverity::Alarm
        } else if self.switching {
            StatusSeverity::Caution
        } else {
            StatusSeverity::Normal
        }
    }

    pub fn options(&self) -> Vec<NetworkOption> {
        SUPPORTED_NETWORKS
            .iter()
            .map(|network| {
                let pending = self.pending_chain_id == Some(network.id);
                let label = if pending {
                    format!("Switching to {}...", network.name)
                } else {
                    format!("Switch to {}", network.name)
                };
                NetworkOption {
                    network: *network,
                    label,
                    disabled: pending,
                }
            })
            .collect()
    }

    /// Remediation notice while connected to an unsupported chain
    pub fn advisory(&self) -> Option<Notice> {
        (self.current_chain_id.is_some() && !self.is_supported)
            .then(|| Notice::new("Unsupported network", HINT_NETWORK))
    }
}

#[derive(Debug, Default)]
struct GuardState {
    current: Option<u64>,
    in_flight: usize,
    pending: Option<u64>,
}

impl GuardState {
    fn status(&self) -> NetworkStatus {
        NetworkStatus::derive(self.current, self.in_flight, self.pending)
    }
}

/// Tracks the connected chain and drives switch requests
pub struct NetworkGuard {
    provider: Arc<dyn WalletProvider>,
    state: Mutex<GuardState>,
    status_tx: watch::Sender<NetworkStatus>,
}

impl NetworkGuard {
    pub fn new(provider: Arc<dyn WalletProvider>, current_chain_id: Option<u64>) -> Self {
        let state = GuardState {
            current: current_chain_id,
            ..GuardState::default()
        };
        let (status_tx, _) = watch::channel(state.status());
        Self {
            provider,
            state: Mutex::new(state),
            status_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, status: NetworkStatus) {
        self.status_tx.send_replace(status);
    }

    pub fn status(&self) -> NetworkStatus {
        self.lock().status()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status_tx.subscribe()
    }

    /// Record a chain change reported by the provider
    pub fn set_chain(&self, chain_id: Option<u64>) {
        let status = {
            let mut state = self.lock();
            state.current = chain_id;
            state.status()
        };
        self.publish(status);
    }

    /// Ask the provider to switch chains.
    ///
    /// Concurrent requests are all forwarded; `pending_chain_id` only tracks
    /// the newest one and clears once nothing is in flight.
    pub async fn switch_to(&self, chain_id: u64) -> Result<u64, ProviderError> {
        let status = {
            let mut state = self.lock();
            state.in_flight += 1;
            state.pending = Some(chain_id);
            state.status()
        };
        self.publish(status);
        info!(chain_id, name = chain_name(chain_id, None), "Switching network");

        let result = self.provider.switch_chain(chain_id).await;

        let status = {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.in_flight == 0 {
                state.pending = None;
            }
            if let Ok(settled) = &result {
                state.current = Some(*settled);
            }
            state.status()
        };
        self.publish(status);

        if let Err(e) = &result {
            warn!(chain_id, error = %e, "Network switch failed");
        }
        result
    }
}

impl std::fmt::Debug for NetworkGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkGuard")
            .field("provider", &self.provider.id())
            .field("status", &self.status())
            .finish()
    }
}
