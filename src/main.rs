// src/main.rs
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

mod account;
mod api;
mod chain;
mod config;
mod error;
mod gas;
mod hash;
mod paymaster;
mod rpc;
mod types;
mod userop;
mod validate;

use crate::account::AddressSource;
use crate::api::AppState;
use crate::chain::{ChainClient, EthersChainClient};
use crate::config::Args;
use crate::paymaster::Paymaster;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // A missing or malformed signer key stops the process here
    let paymaster = Arc::new(Paymaster::new(
        args.signer_key()?,
        args.chain_id,
        args.paymaster_address,
    )?);

    let chain: Arc<dyn ChainClient> = Arc::new(EthersChainClient::new(&args.eth_rpc_url)?);

    let source = args.address_source();
    match source {
        AddressSource::OnChainFactory(factory) => info!("Account factory: {:?}", factory),
        AddressSource::DeterministicFallback => {
            warn!("No account factory configured, running in demo mode")
        }
    }
    match &args.bundler_url {
        Some(url) => info!("Bundler URL {} configured, submissions stay in local mode", url),
        None => info!("No bundler configured, submissions run in local mode"),
    }

    let rpc_handle = match args.rpc_server_addr {
        Some(addr) => Some(rpc::start_server(addr, paymaster.clone()).await?),
        None => None,
    };

    let state = Arc::new(AppState::new(chain, paymaster, source));
    let app = api::router(state, api::cors_layer(&args.cors_origin));

    let listener = tokio::net::TcpListener::bind(args.http_addr).await?;
    info!(
        "Starting paymaster API on {} (chain id {})",
        args.http_addr, args.chain_id
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = rpc_handle {
        handle.stop()?;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
