/*
[INPUT]:  Public API exports for walletlink-orchestrator crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod classifier;
pub mod config;
pub mod event;
pub mod machine;
pub mod network;
pub mod orchestrator;
pub mod reconnect;
pub mod registry;
pub mod retry;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use classifier::{Classification, ErrorCategory, classify, failure_notice, friendly_hint};
pub use config::WalletLinkConfig;
pub use event::{ActiveConnection, ConnectFailure, Notice, OrchestratorEvent, RetryNotice};
pub use machine::{ConnectionAction, ConnectionMachine, ConnectionStatus};
pub use network::{NetworkGuard, NetworkStatus, SUPPORTED_NETWORKS, StatusSeverity};
pub use orchestrator::{ConnectOutcome, ConnectionOrchestrator};
pub use reconnect::{AutoReconnect, ReconnectOutcome};
pub use registry::{ProviderHandle, ProviderRegistry, RegistryError};
pub use retry::{MAX_RETRIES, RetryPolicy, RetryScheduler, RetryTicket};
pub use session::SessionAgent;
pub use state::{ConnectionStore, FileStorage, KeyValueStorage, MemoryStorage};
