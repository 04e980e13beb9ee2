/*
[INPUT]:  Scripted providers and storage doubles
[OUTPUT]: Shared orchestrator fixtures for integration tests
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for walletlink-orchestrator tests

use std::sync::Arc;

use tokio::sync::broadcast;
use walletlink_adapter::{ProviderError, ScriptedProvider};
use walletlink_orchestrator::state::StorageError;
use walletlink_orchestrator::{
    ConnectionOrchestrator, ConnectionStore, KeyValueStorage, MemoryStorage, OrchestratorEvent,
    ProviderHandle, ProviderRegistry, RetryPolicy,
};

#[allow(dead_code)]
pub const ADDRESS: &str = "0x1111111111111111111111111111111111111111";
#[allow(dead_code)]
pub const OTHER_ADDRESS: &str = "0x2222222222222222222222222222222222222222";

/// Orchestrator plus direct handles to its providers and storage
#[allow(dead_code)]
pub struct Harness {
    pub orchestrator: ConnectionOrchestrator,
    pub providers: Vec<Arc<ScriptedProvider>>,
    pub storage: Arc<MemoryStorage>,
}

#[allow(dead_code)]
pub fn harness(providers: Vec<ScriptedProvider>) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    harness_with_storage(providers, storage.clone(), storage)
}

#[allow(dead_code)]
pub fn harness_with_storage(
    providers: Vec<ScriptedProvider>,
    backend: Arc<dyn KeyValueStorage>,
    storage: Arc<MemoryStorage>,
) -> Harness {
    let providers: Vec<Arc<ScriptedProvider>> = providers.into_iter().map(Arc::new).collect();
    let registry = ProviderRegistry::new(
        providers
            .iter()
            .map(|provider| ProviderHandle::from_arc(provider.clone()))
            .collect(),
    );
    let orchestrator =
        ConnectionOrchestrator::new(registry, ConnectionStore::new(backend), RetryPolicy::default());
    Harness {
        orchestrator,
        providers,
        storage,
    }
}

/// Retryable provider failure
#[allow(dead_code)]
pub fn transient() -> ProviderError {
    ProviderError::new().with_message("Request timed out")
}

/// Every event already queued on the receiver
#[allow(dead_code)]
pub fn drain(events: &mut broadcast::Receiver<OrchestratorEvent>) -> Vec<OrchestratorEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[allow(dead_code)]
pub fn retry_count(events: &[OrchestratorEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, OrchestratorEvent::Retrying(_)))
        .count()
}

/// Storage whose every operation fails
#[allow(dead_code)]
pub struct FailingStorage;

impl KeyValueStorage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }
}
