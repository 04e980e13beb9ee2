/*
[INPUT]:  Provider registry, connection store, retry policy
[OUTPUT]: Connection attempts driven to Connected or a classified terminal failure
[POS]:    Core layer - per-wallet-type connection state machine with retry
[UPDATE]: When connection transitions, retry handling or emitted events change
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use walletlink_adapter::{ProviderAccount, ProviderError, WalletType};

use crate::classifier::{ErrorCategory, classify, failure_notice};
use crate::event::{ActiveConnection, ConnectFailure, ConnectionAttempt, OrchestratorEvent, RetryNotice};
use crate::machine::{ConnectionAction, ConnectionMachine, ConnectionStatus};
use crate::registry::{ProviderHandle, ProviderRegistry};
use crate::retry::{RetryPolicy, RetryScheduler, RetryTicket};
use crate::state::ConnectionStore;

const EVENT_CAPACITY: usize = 64;

/// Result of one connection attempt as seen by its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(ActiveConnection),
    /// Failed, a retry is armed and will run in the background
    Retrying(RetryTicket),
    Failed(ConnectFailure),
    /// A newer attempt or a disconnect took over while this one was in flight
    Superseded,
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected(_))
    }
}

#[derive(Debug, Default)]
struct KeyState {
    machine: ConnectionMachine,
    /// Bumped by every explicit attempt and by disconnect; retry timers and
    /// late provider responses carrying an older value are ignored.
    generation: u64,
    last_failure: Option<ConnectFailure>,
}

impl KeyState {
    fn apply(&mut self, wallet_type: WalletType, action: ConnectionAction) {
        if let Err(e) = self.machine.transition(action) {
            warn!(%wallet_type, error = %e, "Unexpected connection transition");
        }
    }
}

#[derive(Debug)]
struct CoreState {
    retry: RetryScheduler,
    keys: HashMap<WalletType, KeyState>,
    active: Option<(ActiveConnection, ProviderHandle)>,
}

impl CoreState {
    fn key(&mut self, wallet_type: WalletType) -> &mut KeyState {
        self.keys.entry(wallet_type).or_default()
    }

    fn is_current(&self, wallet_type: WalletType, generation: u64) -> bool {
        self.keys
            .get(&wallet_type)
            .is_some_and(|key| key.generation == generation)
    }
}

struct Inner {
    registry: ProviderRegistry,
    store: ConnectionStore,
    state: Mutex<CoreState>,
    active_tx: watch::Sender<Option<ActiveConnection>>,
    events_tx: broadcast::Sender<OrchestratorEvent>,
}

/// Owns every piece of mutable connection state for one client session.
///
/// Cloning is cheap and all clones share the same state.
#[derive(Clone)]
pub struct ConnectionOrchestrator {
    inner: Arc<Inner>,
}

impl ConnectionOrchestrator {
    pub fn new(registry: ProviderRegistry, store: ConnectionStore, policy: RetryPolicy) -> Self {
        let (active_tx, _) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                registry,
                store,
                state: Mutex::new(CoreState {
                    retry: RetryScheduler::new(policy),
                    keys: HashMap::new(),
                    active: None,
                }),
                active_tx,
                events_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn emit(&self, event: OrchestratorEvent) {
        // No subscribers is fine
        let _ = self.inner.events_tx.send(event);
    }

    /// Resolve `wallet_type` through the registry and attempt a connection.
    ///
    /// A registry miss is terminal and never retried.
    pub async fn connect(&self, wallet_type: WalletType) -> ConnectOutcome {
        match self.inner.registry.resolve(wallet_type) {
            Ok(handle) => self.start_attempt(handle, wallet_type).await,
            Err(e) => {
                info!(%wallet_type, error = %e, "Wallet provider not registered");
                self.fail_unresolved(wallet_type)
            }
        }
    }

    /// Attempt a connection to a specific provider, keyed by its derived wallet type
    pub async fn connect_provider(&self, handle: ProviderHandle) -> ConnectOutcome {
        let wallet_type = handle.wallet_type();
        self.start_attempt(handle, wallet_type).await
    }

    /// Like [`connect`](Self::connect), but waits through scheduled retries
    /// until the wallet type connects or fails terminally.
    pub async fn connect_and_wait(&self, wallet_type: WalletType) -> ConnectOutcome {
        let events = self.subscribe();
        let outcome = self.connect(wallet_type).await;
        Self::settle(events, wallet_type, outcome).await
    }

    /// Follow `events` until a retrying outcome for `wallet_type` settles.
    ///
    /// `events` must be subscribed before the attempt started.
    pub async fn settle(
        mut events: broadcast::Receiver<OrchestratorEvent>,
        wallet_type: WalletType,
        outcome: ConnectOutcome,
    ) -> ConnectOutcome {
        if !matches!(outcome, ConnectOutcome::Retrying(_)) {
            return outcome;
        }

        loop {
            match events.recv().await {
                Ok(OrchestratorEvent::Connected(connection)) => {
                    if connection.wallet_type == wallet_type {
                        return ConnectOutcome::Connected(connection);
                    }
                    return ConnectOutcome::Superseded;
                }
                Ok(OrchestratorEvent::Failed(failure)) if failure.wallet_type == wallet_type => {
                    return ConnectOutcome::Failed(failure);
                }
                Ok(OrchestratorEvent::Disconnected { .. }) => return ConnectOutcome::Superseded,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event receiver lagged while waiting for connection");
                }
                Err(broadcast::error::RecvError::Closed) => return ConnectOutcome::Superseded,
            }
        }
    }

    async fn start_attempt(&self, handle: ProviderHandle, wallet_type: WalletType) -> ConnectOutcome {
        let (generation, attempt_number) = {
            let mut state = self.lock();
            let attempt_number = state.retry.count(wallet_type) + 1;
            let key = state.key(wallet_type);
            key.generation += 1;
            key.apply(wallet_type, ConnectionAction::Connect);
            (key.generation, attempt_number)
        };

        info!(%wallet_type, provider = handle.display_name(), "Connecting wallet");
        self.emit(OrchestratorEvent::Connecting(ConnectionAttempt {
            wallet_type,
            provider_name: handle.display_name().to_string(),
            attempt_number,
        }));

        self.run_attempt(handle, wallet_type, generation).await
    }

    fn run_attempt(
        &self,
        handle: ProviderHandle,
        wallet_type: WalletType,
        generation: u64,
    ) -> BoxFuture<'static, ConnectOutcome> {
        let this = self.clone();
        async move {
            match handle.provider().connect().await {
                Ok(account) => this.complete_success(handle, wallet_type, generation, account).await,
                Err(error) => this.complete_failure(handle, wallet_type, generation, error),
            }
        }
        .boxed()
    }

    async fn complete_success(
        &self,
        handle: ProviderHandle,
        wallet_type: WalletType,
        generation: u64,
        account: ProviderAccount,
    ) -> ConnectOutcome {
        let connection = ActiveConnection {
            address: account.address,
            provider_name: handle.display_name().to_string(),
            wallet_type,
            chain_id: account.chain_id,
        };

        let replaced = {
            let mut state = self.lock();
            if !state.is_current(wallet_type, generation) {
                debug!(%wallet_type, "Ignoring stale connection success");
                return ConnectOutcome::Superseded;
            }

            state.retry.reset(wallet_type);
            let key = state.key(wallet_type);
            key.apply(wallet_type, ConnectionAction::Succeed);
            key.last_failure = None;

            // Pending retries for other wallets no longer apply
            for (other, key) in state.keys.iter_mut() {
                if *other != wallet_type && key.machine.state() == ConnectionStatus::Retrying {
                    key.generation += 1;
                    key.apply(*other, ConnectionAction::Cancel);
                }
            }

            let previous = state.active.replace((connection.clone(), handle.clone()));
            match previous {
                Some((prev, prev_handle)) if prev.wallet_type != wallet_type => {
                    state.key(prev.wallet_type).apply(prev.wallet_type, ConnectionAction::Disconnect);
                    (!prev_handle.same_provider(&handle)).then_some(prev_handle)
                }
                _ => None,
            }
        };

        if let Some(prev_handle) = replaced {
            if let Err(e) = prev_handle.provider().disconnect().await {
                warn!(provider = prev_handle.display_name(), error = %e, "Failed to disconnect replaced provider");
            }
        }

        self.inner.store.save(&connection.provider_name);
        self.inner.active_tx.send_replace(Some(connection.clone()));

        info!(
            %wallet_type,
            address = %connection.address,
            provider = %connection.provider_name,
            "Wallet connected"
        );
        self.emit(OrchestratorEvent::Connected(connection.clone()));
        ConnectOutcome::Connected(connection)
    }

    fn complete_failure(
        &self,
        handle: ProviderHandle,
        wallet_type: WalletType,
        generation: u64,
        error: ProviderError,
    ) -> ConnectOutcome {
        let classification = classify(&error);

        let mut state = self.lock();
        if !state.is_current(wallet_type, generation) {
            debug!(%wallet_type, error = %error, "Ignoring stale connection failure");
            return ConnectOutcome::Superseded;
        }
        state.key(wallet_type).apply(wallet_type, ConnectionAction::Fail);

        let mut retries_exhausted = false;
        if classification.retryable {
            match state.retry.schedule(wallet_type) {
                Ok(ticket) => {
                    state.key(wallet_type).apply(wallet_type, ConnectionAction::ScheduleRetry);
                    drop(state);

                    warn!(
                        %wallet_type,
                        attempt = ticket.attempt,
                        max = ticket.max,
                        delay = ?ticket.delay,
                        error = %error,
                        "Wallet connect failed; retrying with backoff"
                    );
                    self.emit(OrchestratorEvent::Retrying(RetryNotice {
                        wallet_type,
                        attempt: ticket.attempt,
                        max: ticket.max,
                        delay: ticket.delay,
                    }));
                    self.arm_retry(handle, ticket, generation);
                    return ConnectOutcome::Retrying(ticket);
                }
                Err(denied) => {
                    warn!(%wallet_type, attempts = denied.attempts, "Wallet connect gave up retrying");
                    retries_exhausted = true;
                }
            }
        }

        let failure = ConnectFailure {
            wallet_type,
            category: classification.category,
            notice: failure_notice(&error, wallet_type),
            error: Some(error),
            retries_exhausted,
        };
        let key = state.key(wallet_type);
        key.apply(wallet_type, ConnectionAction::Report);
        key.last_failure = Some(failure.clone());
        drop(state);

        self.report_failure(failure)
    }

    fn fail_unresolved(&self, wallet_type: WalletType) -> ConnectOutcome {
        let error = ProviderError::connector_not_found();
        let failure = ConnectFailure {
            wallet_type,
            category: ErrorCategory::ProviderMissing,
            notice: failure_notice(&error, wallet_type),
            error: Some(error),
            retries_exhausted: false,
        };

        {
            let mut state = self.lock();
            let key = state.key(wallet_type);
            key.generation += 1;
            key.apply(wallet_type, ConnectionAction::Connect);
            key.apply(wallet_type, ConnectionAction::Fail);
            key.apply(wallet_type, ConnectionAction::Report);
            key.last_failure = Some(failure.clone());
        }

        self.report_failure(failure)
    }

    fn report_failure(&self, failure: ConnectFailure) -> ConnectOutcome {
        let wallet_type = failure.wallet_type;
        if failure.category == ErrorCategory::ProviderMissing {
            if let Some(url) = wallet_type.install_url() {
                info!(%wallet_type, url, "Wallet not installed; opening install page");
                self.emit(OrchestratorEvent::OpenInstallPage { wallet_type, url });
            }
        }

        warn!(
            %wallet_type,
            category = %failure.category,
            retries_exhausted = failure.retries_exhausted,
            "Wallet connection failed"
        );
        self.emit(OrchestratorEvent::Failed(failure.clone()));
        ConnectOutcome::Failed(failure)
    }

    fn arm_retry(&self, handle: ProviderHandle, ticket: RetryTicket, generation: u64) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ticket.delay).await;
            if this.claim_retry(&handle, ticket.wallet_type, generation) {
                this.run_attempt(handle, ticket.wallet_type, generation).await;
            }
        });
    }

    /// Decide at fire time whether the armed retry is still the live attempt
    fn claim_retry(&self, handle: &ProviderHandle, wallet_type: WalletType, generation: u64) -> bool {
        let attempt_number = {
            let mut state = self.lock();
            if !state.is_current(wallet_type, generation) {
                debug!(%wallet_type, "Discarding superseded retry");
                return false;
            }
            if state.key(wallet_type).machine.state() != ConnectionStatus::Retrying {
                return false;
            }

            let attempt_number = state.retry.count(wallet_type) + 1;
            state.key(wallet_type).apply(wallet_type, ConnectionAction::RetryFired);
            attempt_number
        };

        self.emit(OrchestratorEvent::Connecting(ConnectionAttempt {
            wallet_type,
            provider_name: handle.display_name().to_string(),
            attempt_number,
        }));
        true
    }

    /// Tear down the active connection.
    ///
    /// Clears the persisted record and invalidates every armed retry. Retry
    /// counters are kept.
    pub async fn disconnect(&self) -> Option<ActiveConnection> {
        let active = {
            let mut state = self.lock();
            for (wallet_type, key) in state.keys.iter_mut() {
                key.generation += 1;
                key.apply(*wallet_type, ConnectionAction::Disconnect);
            }
            state.active.take()
        };

        self.inner.store.clear();
        self.inner.active_tx.send_replace(None);

        let (connection, handle) = active?;
        if let Err(e) = handle.provider().disconnect().await {
            warn!(provider = handle.display_name(), error = %e, "Provider disconnect failed");
        }

        info!(address = %connection.address, provider = %connection.provider_name, "Wallet disconnected");
        self.emit(OrchestratorEvent::Disconnected {
            address: connection.address.clone(),
            provider_name: connection.provider_name.clone(),
        });
        Some(connection)
    }

    pub fn is_connected(&self) -> bool {
        self.lock().active.is_some()
    }

    pub fn active_connection(&self) -> Option<ActiveConnection> {
        self.lock().active.as_ref().map(|(connection, _)| connection.clone())
    }

    pub fn active_provider(&self) -> Option<ProviderHandle> {
        self.lock().active.as_ref().map(|(_, handle)| handle.clone())
    }

    pub fn status(&self, wallet_type: WalletType) -> ConnectionStatus {
        self.lock()
            .keys
            .get(&wallet_type)
            .map(|key| key.machine.state())
            .unwrap_or_default()
    }

    pub fn retry_count(&self, wallet_type: WalletType) -> u32 {
        self.lock().retry.count(wallet_type)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.lock().retry.policy()
    }

    /// Most recent terminal failure for the wallet type, cleared on success
    pub fn last_failure(&self, wallet_type: WalletType) -> Option<ConnectFailure> {
        self.lock()
            .keys
            .get(&wallet_type)
            .and_then(|key| key.last_failure.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.inner.events_tx.subscribe()
    }

    pub fn watch_connection(&self) -> watch::Receiver<Option<ActiveConnection>> {
        self.inner.active_tx.subscribe()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.inner.registry
    }

    pub fn store(&self) -> &ConnectionStore {
        &self.inner.store
    }
}

impl std::fmt::Debug for ConnectionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionOrchestrator")
            .field("providers", &self.inner.registry.providers().len())
            .field("active", &self.active_connection())
            .finish()
    }
}
