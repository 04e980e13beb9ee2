/*
[INPUT]:  Provider display names from successful connections
[OUTPUT]: Best-effort save/read/clear of the last connected wallet
[POS]:    State layer - reconnect hint persistence
[UPDATE]: When the persisted key or its failure policy changes
*/

use std::sync::Arc;

use tracing::{debug, warn};

use super::storage::KeyValueStorage;

pub const LAST_CONNECTED_WALLET_KEY: &str = "lastConnectedWallet";

/// Remembers which provider connected last.
///
/// Storage failures never escape: writes are dropped with a warning and
/// reads degrade to "nothing persisted".
#[derive(Clone, Default)]
pub struct ConnectionStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
}

impl ConnectionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Store without a backend; every read is empty
    pub fn detached() -> Self {
        Self { storage: None }
    }

    pub fn is_attached(&self) -> bool {
        self.storage.is_some()
    }

    pub fn save(&self, provider_name: &str) {
        let Some(storage) = &self.storage else {
            debug!("No storage backend, skipping save of last connected wallet");
            return;
        };
        if let Err(e) = storage.set(LAST_CONNECTED_WALLET_KEY, provider_name) {
            warn!("Failed to persist last connected wallet: {}", e);
        }
    }

    pub fn read(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(LAST_CONNECTED_WALLET_KEY) {
            Ok(Some(value)) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read last connected wallet: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.remove(LAST_CONNECTED_WALLET_KEY) {
            warn!("Failed to clear last connected wallet: {}", e);
        }
    }
}

impl std::fmt::Debug for ConnectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionStore")
            .field("attached", &self.is_attached())
            .finish()
    }
}
