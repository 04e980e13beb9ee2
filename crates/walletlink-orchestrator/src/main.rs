/*
[INPUT]:  CLI arguments, YAML configuration file
[OUTPUT]: Wallet connect / reconnect / disconnect runs with user-facing notices
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, flags, or startup flow
*/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use walletlink_adapter::WalletType;
use walletlink_orchestrator::network::{NetworkGuard, NetworkStatus, chain_name};
use walletlink_orchestrator::registry::wallet_type_for_name;
use walletlink_orchestrator::{
    ActiveConnection, AutoReconnect, ConnectOutcome, ConnectionOrchestrator, OrchestratorEvent,
    ReconnectOutcome, SUPPORTED_NETWORKS, SessionAgent, WalletLinkConfig,
};

#[derive(Parser, Debug)]
#[command(name = "walletlink", version, about = "Wallet connection orchestrator")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect a wallet type, retrying transient failures
    Connect {
        /// meta_mask, token_pocket, bitget_wallet, particle_network or wallet_connect
        wallet_type: WalletType,
        /// Switch to this chain after connecting
        #[arg(long = "switch-to", value_name = "CHAIN_ID")]
        switch_to: Option<u64>,
    },
    /// Restore the last connected wallet, as on a page reload
    Reconnect,
    /// Forget the last connected wallet
    Disconnect,
    /// Show registered providers and the remembered wallet
    Status,
    /// List supported networks
    Networks {
        /// Evaluate the status of this chain id
        #[arg(long = "chain", value_name = "CHAIN_ID")]
        chain_id: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(args.config_path.as_deref())?;
    info!(provider_count = config.providers.len(), "configuration loaded");

    let registry = config.build_registry().context("build provider registry")?;
    let orchestrator = ConnectionOrchestrator::new(registry, config.build_store(), config.retry);
    let agent = config
        .build_session_binder()?
        .map(|binder| SessionAgent::new(Arc::new(binder), orchestrator.clone()));

    let shutdown = CancellationToken::new();
    let printer = tokio::spawn(print_events(orchestrator.subscribe(), shutdown.clone()));

    let result = match args.command {
        Command::Connect {
            wallet_type,
            switch_to,
        } => connect(&orchestrator, agent.as_ref(), wallet_type, switch_to).await,
        Command::Reconnect => reconnect(&orchestrator, agent.as_ref()).await,
        Command::Disconnect => disconnect(&orchestrator).await,
        Command::Status => {
            status(&orchestrator);
            Ok(())
        }
        Command::Networks { chain_id } => {
            networks(chain_id);
            Ok(())
        }
    };

    shutdown.cancel();
    if let Err(err) = printer.await {
        debug!(error = %err, "event printer stopped abnormally");
    }
    result
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<WalletLinkConfig> {
    match path {
        Some(path) => WalletLinkConfig::from_file(path).context("load config"),
        None => {
            info!("no config given; running without providers");
            Ok(WalletLinkConfig::default())
        }
    }
}

async fn connect(
    orchestrator: &ConnectionOrchestrator,
    agent: Option<&SessionAgent>,
    wallet_type: WalletType,
    switch_to: Option<u64>,
) -> Result<()> {
    let outcome = orchestrator.connect_and_wait(wallet_type).await;
    let connection = settled_connection(outcome)?;
    after_connect(orchestrator, agent, &connection, switch_to).await
}

async fn reconnect(orchestrator: &ConnectionOrchestrator, agent: Option<&SessionAgent>) -> Result<()> {
    let events = orchestrator.subscribe();
    match AutoReconnect::new(orchestrator.clone()).run().await {
        ReconnectOutcome::AlreadyConnected => println!("Already connected"),
        ReconnectOutcome::NothingPersisted => println!("No remembered wallet"),
        ReconnectOutcome::ProviderUnavailable { provider_name } => {
            println!("Remembered wallet '{provider_name}' is not available");
        }
        ReconnectOutcome::Attempted {
            provider_name,
            outcome,
        } => {
            let wallet_type = wallet_type_for_name(&provider_name);
            let outcome = ConnectionOrchestrator::settle(events, wallet_type, outcome).await;
            // Auto-reconnect is silent: failures are only reported as notices
            if let ConnectOutcome::Connected(connection) = outcome {
                after_connect(orchestrator, agent, &connection, None).await?;
            }
        }
    }
    Ok(())
}

async fn disconnect(orchestrator: &ConnectionOrchestrator) -> Result<()> {
    match orchestrator.disconnect().await {
        Some(connection) => println!("Disconnected {}", connection.address),
        None => println!("Forgot remembered wallet"),
    }
    Ok(())
}

fn status(orchestrator: &ConnectionOrchestrator) {
    let policy = orchestrator.retry_policy();
    println!(
        "Retry policy: {} retries, {}ms base delay, {}ms cap",
        policy.max_retries, policy.base_delay_ms, policy.max_delay_ms
    );

    match orchestrator.store().read() {
        Some(name) => println!("Remembered wallet: {name}"),
        None => println!("Remembered wallet: none"),
    }

    let providers = orchestrator.registry().providers();
    if providers.is_empty() {
        println!("No providers registered");
    }
    for handle in providers {
        println!(
            "  {:<20} {:<18} {}",
            handle.id(),
            handle.wallet_type().as_str(),
            handle.display_name()
        );
    }
}

fn networks(chain_id: Option<u64>) {
    for network in SUPPORTED_NETWORKS {
        println!("  {:<8} {}", network.id, network.name);
    }
    if let Some(chain_id) = chain_id {
        print_network_status(&NetworkStatus::derive(Some(chain_id), 0, None));
    }
}

fn settled_connection(outcome: ConnectOutcome) -> Result<ActiveConnection> {
    match outcome {
        ConnectOutcome::Connected(connection) => Ok(connection),
        ConnectOutcome::Failed(failure) => Err(anyhow!(
            "{}: {}",
            failure.notice.title,
            failure.notice.message
        )),
        ConnectOutcome::Retrying(_) | ConnectOutcome::Superseded => {
            Err(anyhow!("connection attempt was superseded"))
        }
    }
}

async fn after_connect(
    orchestrator: &ConnectionOrchestrator,
    agent: Option<&SessionAgent>,
    connection: &ActiveConnection,
    switch_to: Option<u64>,
) -> Result<()> {
    println!(
        "Connected {} via {} ({})",
        connection.address, connection.provider_name, connection.wallet_type
    );

    if let Some(agent) = agent {
        // Session failures are reported as notices; the wallet stays connected
        let _ = agent.on_connected(connection).await;
    }

    let provider = orchestrator
        .active_provider()
        .context("active provider missing after connect")?;
    let guard = NetworkGuard::new(provider.provider().clone(), connection.chain_id);

    if let Some(chain_id) = switch_to {
        guard
            .switch_to(chain_id)
            .await
            .map_err(|err| anyhow!("switch to {}: {}", chain_name(chain_id, None), err))?;
    }

    print_network_status(&guard.status());
    Ok(())
}

fn print_network_status(status: &NetworkStatus) {
    let name = status
        .current_chain_id
        .map(|id| chain_name(id, None))
        .unwrap_or("Unknown");
    println!("Network: {} ({:?})", name, status.severity());
    if let Some(notice) = status.advisory() {
        println!("{}: {}", notice.title, notice.message);
        for option in status.options() {
            println!("  - {}", option.label);
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<OrchestratorEvent>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(OrchestratorEvent::OpenInstallPage { url, .. }) => {
                    println!("Install the wallet extension: {url}");
                }
                Ok(OrchestratorEvent::SessionEstablished { address }) => {
                    println!("Signed in as {address}");
                }
                Ok(event) => {
                    if let Some(notice) = event.notice() {
                        println!("{}: {}", notice.title, notice.message);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
            _ = shutdown.cancelled() => return,
        }
    }
}
