/*
[INPUT]:  Active connection changes, SessionBinder from the adapter
[OUTPUT]: Session tokens bound to newly connected addresses
[POS]:    Session layer - hands connected wallets to the sign-in exchange
[UPDATE]: When sign-in triggering or session failure reporting changes
*/

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walletlink_adapter::{
    LinkError, ProviderError, ProviderSigner, SessionBinder, SignInOutcome, WalletType,
};

use crate::classifier::friendly_hint;
use crate::event::{ActiveConnection, Notice, OrchestratorEvent};
use crate::network::POLYGON;
use crate::orchestrator::ConnectionOrchestrator;

const SIGN_IN_FAILED: &str = "Sign-in failed";
const HINT_SIGN_IN_REFUSED: &str = "The server refused the sign-in. Please reconnect your wallet and try again.";
const HINT_SIGN_IN_UNREACHABLE: &str = "The sign-in service did not respond. Please try again shortly.";

/// Glue between the orchestrator and the session binder.
///
/// Session failures are surfaced as events and never touch the wallet
/// connection itself.
#[derive(Debug, Clone)]
pub struct SessionAgent {
    binder: Arc<SessionBinder>,
    orchestrator: ConnectionOrchestrator,
}

impl SessionAgent {
    pub fn new(binder: Arc<SessionBinder>, orchestrator: ConnectionOrchestrator) -> Self {
        Self {
            binder,
            orchestrator,
        }
    }

    pub fn binder(&self) -> &SessionBinder {
        &self.binder
    }

    /// Run the sign-in exchange for a freshly connected address
    pub async fn on_connected(&self, connection: &ActiveConnection) -> Result<SignInOutcome, LinkError> {
        let result = self.bind(connection).await;

        match &result {
            Ok(SignInOutcome::Established { address, .. }) => {
                self.orchestrator.emit(OrchestratorEvent::SessionEstablished {
                    address: address.clone(),
                });
            }
            Ok(SignInOutcome::AlreadyBound) => {
                debug!(address = %connection.address, "Session already valid");
            }
            Ok(SignInOutcome::Rejected { code, message }) => {
                let message = message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("Login was not accepted (code {code})"));
                self.orchestrator.emit(OrchestratorEvent::SessionFailed {
                    address: connection.address.clone(),
                    notice: Notice::new(SIGN_IN_FAILED, message),
                });
            }
            Err(e) => {
                warn!(
                    address = %connection.address,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Sign-in exchange failed"
                );
                self.orchestrator.emit(OrchestratorEvent::SessionFailed {
                    address: connection.address.clone(),
                    notice: session_failure_notice(e, connection.wallet_type),
                });
            }
        }

        result
    }

    async fn bind(&self, connection: &ActiveConnection) -> Result<SignInOutcome, LinkError> {
        let handle = self
            .orchestrator
            .active_provider()
            .filter(|_| {
                self.orchestrator
                    .active_connection()
                    .is_some_and(|active| active.address == connection.address)
            })
            .ok_or_else(|| {
                LinkError::Provider(
                    ProviderError::new()
                        .with_name("ProviderDisconnectedError")
                        .with_message("wallet disconnected before sign-in"),
                )
            })?;

        let chain_id = connection.chain_id.unwrap_or(POLYGON.id);
        let signer = ProviderSigner::new(handle.provider().clone(), &connection.address, chain_id);
        self.binder.bind(&signer).await
    }

    /// Follow the active connection until cancelled.
    ///
    /// Each newly connected address is bound once; a disconnect clears the
    /// session of the address that went away.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut connection_rx = self.orchestrator.watch_connection();
        let mut bound: Option<String> = None;

        loop {
            let current = connection_rx.borrow_and_update().clone();
            match current {
                Some(connection) => {
                    let is_new = bound
                        .as_deref()
                        .is_none_or(|prev| !prev.eq_ignore_ascii_case(&connection.address));
                    if is_new {
                        bound = Some(connection.address.clone());
                        // Errors are already surfaced as events
                        let _ = self.on_connected(&connection).await;
                    }
                }
                None => {
                    if let Some(prev) = bound.take() {
                        self.binder.sign_out(&prev);
                    }
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session agent shutdown requested");
                    return;
                }
                changed = connection_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

fn session_failure_notice(error: &LinkError, wallet_type: WalletType) -> Notice {
    match error {
        LinkError::Provider(provider_error) => {
            let message = friendly_hint(provider_error, wallet_type)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Could not sign in with {}. Please try again.", wallet_type.label()));
            Notice::new(SIGN_IN_FAILED, message)
        }
        other if other.is_auth_error() => Notice::new(SIGN_IN_FAILED, HINT_SIGN_IN_REFUSED),
        other if other.is_retryable() => Notice::new(SIGN_IN_FAILED, HINT_SIGN_IN_UNREACHABLE),
        other => Notice::new(SIGN_IN_FAILED, other.to_string()),
    }
}
