/*
[INPUT]:  Scripted providers with failure scripts, paused tokio clock
[OUTPUT]: Test results for connect, retry, supersede and disconnect flows
[POS]:    Integration tests - connection orchestrator
[UPDATE]: When connection transitions or retry behavior change
*/

mod common;

use std::time::Duration;

use common::{ADDRESS, OTHER_ADDRESS, drain, harness, retry_count, transient};
use rstest::rstest;
use walletlink_adapter::{ProviderError, ScriptStep, ScriptedProvider, WalletType};
use walletlink_orchestrator::classifier::HINT_REJECTED;
use walletlink_orchestrator::{
    ConnectOutcome, ConnectionStatus, ErrorCategory, MAX_RETRIES, OrchestratorEvent,
};

fn provider_for(wallet_type: WalletType) -> ScriptedProvider {
    ScriptedProvider::new(wallet_type.as_str(), wallet_type.label(), ADDRESS)
}

#[rstest]
#[case(WalletType::MetaMask)]
#[case(WalletType::TokenPocket)]
#[case(WalletType::BitgetWallet)]
#[case(WalletType::ParticleNetwork)]
#[case(WalletType::WalletConnect)]
#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhaustion_is_terminal(#[case] wallet_type: WalletType) {
    let h = harness(vec![
        provider_for(wallet_type).with_script((0..=MAX_RETRIES).map(|_| ScriptStep::Fail(transient()))),
    ]);
    let mut events = h.orchestrator.subscribe();

    let outcome = h.orchestrator.connect_and_wait(wallet_type).await;

    let ConnectOutcome::Failed(failure) = outcome else {
        panic!("expected terminal failure, got {outcome:?}");
    };
    assert!(failure.retries_exhausted);
    assert_eq!(failure.category, ErrorCategory::Transient);
    assert_eq!(h.orchestrator.retry_count(wallet_type), MAX_RETRIES);
    assert_eq!(h.orchestrator.status(wallet_type), ConnectionStatus::Idle);
    assert_eq!(h.providers[0].connect_calls(), MAX_RETRIES as usize + 1);
    assert_eq!(retry_count(&drain(&mut events)), MAX_RETRIES as usize);
    assert!(h.orchestrator.last_failure(wallet_type).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_carries_into_manual_retry() {
    let h = harness(vec![
        provider_for(WalletType::BitgetWallet)
            .with_script((0..=MAX_RETRIES + 1).map(|_| ScriptStep::Fail(transient()))),
    ]);
    h.orchestrator.connect_and_wait(WalletType::BitgetWallet).await;

    let mut events = h.orchestrator.subscribe();
    let outcome = h.orchestrator.connect(WalletType::BitgetWallet).await;

    // Counter is only reset by a success, so the next failure is terminal at once
    assert!(matches!(outcome, ConnectOutcome::Failed(ref f) if f.retries_exhausted));
    assert_eq!(retry_count(&drain(&mut events)), 0);
    assert_eq!(h.orchestrator.retry_count(WalletType::BitgetWallet), MAX_RETRIES);
}

#[tokio::test(start_paused = true)]
async fn test_success_resets_retry_counter() {
    let h = harness(vec![
        provider_for(WalletType::TokenPocket)
            .with_script((0..=MAX_RETRIES).map(|_| ScriptStep::Fail(transient()))),
    ]);
    h.orchestrator.connect_and_wait(WalletType::TokenPocket).await;
    assert_eq!(h.orchestrator.retry_count(WalletType::TokenPocket), MAX_RETRIES);

    let outcome = h.orchestrator.connect(WalletType::TokenPocket).await;

    assert!(outcome.is_connected());
    assert_eq!(h.orchestrator.retry_count(WalletType::TokenPocket), 0);
    assert!(h.orchestrator.last_failure(WalletType::TokenPocket).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_wallet_connect_recovers_after_two_transient_failures() {
    let h = harness(vec![
        ScriptedProvider::new("walletConnect", "WalletConnect", ADDRESS)
            .with_script([ScriptStep::Fail(transient()), ScriptStep::Fail(transient())]),
    ]);
    let mut events = h.orchestrator.subscribe();

    let outcome = h.orchestrator.connect_and_wait(WalletType::WalletConnect).await;

    let ConnectOutcome::Connected(connection) = outcome else {
        panic!("expected connection, got {outcome:?}");
    };
    assert_eq!(connection.address, ADDRESS);

    let events = drain(&mut events);
    assert_eq!(retry_count(&events), 2);
    let notices: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            OrchestratorEvent::Retrying(retry) => Some(retry.notice().message),
            _ => None,
        })
        .collect();
    assert_eq!(notices, vec!["Attempt 1 of 3", "Attempt 2 of 3"]);

    assert_eq!(h.orchestrator.status(WalletType::WalletConnect), ConnectionStatus::Connected);
    assert_eq!(h.orchestrator.retry_count(WalletType::WalletConnect), 0);
    assert_eq!(h.orchestrator.store().read().as_deref(), Some("WalletConnect"));
    assert_eq!(h.providers[0].connect_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_delays_follow_backoff() {
    let h = harness(vec![
        provider_for(WalletType::ParticleNetwork)
            .with_script([ScriptStep::Fail(transient()), ScriptStep::Fail(transient())]),
    ]);
    let mut events = h.orchestrator.subscribe();
    let started = tokio::time::Instant::now();

    h.orchestrator.connect_and_wait(WalletType::ParticleNetwork).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1500 + 3000), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500 + 3000 + 100), "elapsed {elapsed:?}");
    let delays: Vec<Duration> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            OrchestratorEvent::Retrying(retry) => Some(retry.delay),
            _ => None,
        })
        .collect();
    assert_eq!(delays, vec![Duration::from_millis(1500), Duration::from_millis(3000)]);
}

#[tokio::test]
async fn test_user_rejection_is_not_retried() {
    let h = harness(vec![
        provider_for(WalletType::TokenPocket).with_script([ScriptStep::Fail(ProviderError::user_rejected())]),
    ]);
    let mut events = h.orchestrator.subscribe();

    let outcome = h.orchestrator.connect(WalletType::TokenPocket).await;

    let ConnectOutcome::Failed(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.category, ErrorCategory::UserRejected);
    assert_eq!(failure.notice.message, HINT_REJECTED);
    assert_eq!(h.orchestrator.retry_count(WalletType::TokenPocket), 0);

    let events = drain(&mut events);
    assert_eq!(retry_count(&events), 0);
    assert!(!events
        .iter()
        .any(|event| matches!(event, OrchestratorEvent::OpenInstallPage { .. })));
}

#[tokio::test]
async fn test_missing_metamask_opens_install_page_once() {
    let h = harness(vec![
        provider_for(WalletType::MetaMask)
            .with_script([ScriptStep::Fail(ProviderError::connector_not_found())]),
    ]);
    let mut events = h.orchestrator.subscribe();

    let outcome = h.orchestrator.connect(WalletType::MetaMask).await;

    assert!(matches!(
        outcome,
        ConnectOutcome::Failed(ref f) if f.category == ErrorCategory::ProviderMissing
    ));
    let installs: Vec<&'static str> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            OrchestratorEvent::OpenInstallPage { url, .. } => Some(url),
            _ => None,
        })
        .collect();
    assert_eq!(installs, vec!["https://metamask.io"]);
    assert_eq!(h.providers[0].connect_calls(), 1);
}

#[tokio::test]
async fn test_missing_connector_for_other_wallets_has_no_install_page() {
    let h = harness(vec![
        provider_for(WalletType::BitgetWallet)
            .with_script([ScriptStep::Fail(ProviderError::connector_not_found())]),
    ]);
    let mut events = h.orchestrator.subscribe();

    h.orchestrator.connect(WalletType::BitgetWallet).await;

    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, OrchestratorEvent::OpenInstallPage { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_stale_retry_timer_is_discarded() {
    let h = harness(vec![
        provider_for(WalletType::MetaMask).with_script([ScriptStep::Fail(transient())]),
    ]);

    let first = h.orchestrator.connect(WalletType::MetaMask).await;
    assert!(matches!(first, ConnectOutcome::Retrying(_)));

    let second = h.orchestrator.connect(WalletType::MetaMask).await;
    assert!(second.is_connected());

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.providers[0].connect_calls(), 2);
    assert_eq!(h.orchestrator.status(WalletType::MetaMask), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_from_superseded_attempt_is_ignored() {
    let h = harness(vec![
        provider_for(WalletType::MetaMask)
            .with_connect_delay(Duration::from_millis(1000))
            .with_script([ScriptStep::Fail(ProviderError::user_rejected())]),
    ]);
    let mut events = h.orchestrator.subscribe();

    let orchestrator = h.orchestrator.clone();
    let stale = tokio::spawn(async move { orchestrator.connect(WalletType::MetaMask).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let current = h.orchestrator.connect(WalletType::MetaMask).await;

    assert_eq!(stale.await.unwrap(), ConnectOutcome::Superseded);
    assert!(current.is_connected());
    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, OrchestratorEvent::Failed(_))));
    assert!(h.orchestrator.last_failure(WalletType::MetaMask).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_invalidates_pending_retry() {
    let h = harness(vec![
        provider_for(WalletType::WalletConnect).with_script([ScriptStep::Fail(transient())]),
    ]);

    let outcome = h.orchestrator.connect(WalletType::WalletConnect).await;
    assert!(matches!(outcome, ConnectOutcome::Retrying(_)));

    assert_eq!(h.orchestrator.disconnect().await, None);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.providers[0].connect_calls(), 1);
    assert_eq!(h.orchestrator.status(WalletType::WalletConnect), ConnectionStatus::Idle);
    // Disconnect keeps the failure budget
    assert_eq!(h.orchestrator.retry_count(WalletType::WalletConnect), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_dropped_when_other_wallet_connects() {
    let h = harness(vec![
        provider_for(WalletType::WalletConnect).with_script([ScriptStep::Fail(transient())]),
        ScriptedProvider::new("io.metamask", "MetaMask", OTHER_ADDRESS),
    ]);

    h.orchestrator.connect(WalletType::WalletConnect).await;
    let outcome = h.orchestrator.connect(WalletType::MetaMask).await;
    assert!(outcome.is_connected());

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.providers[0].connect_calls(), 1);
    assert_eq!(h.orchestrator.status(WalletType::WalletConnect), ConnectionStatus::Idle);
    assert_eq!(
        h.orchestrator.active_connection().map(|c| c.address).as_deref(),
        Some(OTHER_ADDRESS)
    );
}

#[tokio::test]
async fn test_switching_wallets_disconnects_previous_provider() {
    let h = harness(vec![
        ScriptedProvider::new("io.metamask", "MetaMask", ADDRESS),
        ScriptedProvider::new("tp", "TokenPocket", OTHER_ADDRESS),
    ]);

    h.orchestrator.connect(WalletType::MetaMask).await;
    h.orchestrator.connect(WalletType::TokenPocket).await;

    assert_eq!(h.providers[0].disconnect_calls(), 1);
    assert_eq!(h.orchestrator.status(WalletType::MetaMask), ConnectionStatus::Idle);
    assert_eq!(h.orchestrator.status(WalletType::TokenPocket), ConnectionStatus::Connected);
    assert_eq!(h.orchestrator.store().read().as_deref(), Some("TokenPocket"));
}

#[tokio::test]
async fn test_connection_watch_tracks_connect_and_disconnect() {
    let h = harness(vec![ScriptedProvider::new("io.metamask", "MetaMask", ADDRESS)]);
    let mut connection_rx = h.orchestrator.watch_connection();
    assert!(connection_rx.borrow().is_none());

    h.orchestrator.connect(WalletType::MetaMask).await;
    connection_rx.changed().await.unwrap();
    assert_eq!(
        connection_rx.borrow_and_update().as_ref().map(|c| c.provider_name.clone()),
        Some("MetaMask".to_string())
    );

    h.orchestrator.disconnect().await;
    connection_rx.changed().await.unwrap();
    assert!(connection_rx.borrow().is_none());
}
