//! Operator CLI for the order-book.
//!
//! Creates, fulfills and cancels listings and offers with the key and
//! node configured in the environment, logging each step as it progresses.

mod config;
mod error;
mod runner;

use std::{process::exit, sync::Arc};

use clap::Parser;
use orderbook_sdk::{client::OrderbookClient, config::EnvConfig, wallet::AlloyWallet};
use tracing::error;

use config::CliConfig;
use runner::Runner;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let cli_config = CliConfig::parse();

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client_config = match env_config.client_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    let node_url = match env_config.node_url() {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Invalid RPC URL: {}", e);
            exit(1);
        }
    };

    let signer = match env_config.signer() {
        Ok(signer) => signer,
        Err(e) => {
            eprintln!("Invalid private key: {}", e);
            exit(1);
        }
    };

    let chain = match client_config.chain(env_config.chain_id) {
        Some(chain) => chain.clone(),
        None => {
            eprintln!("Chain {} is not configured", env_config.chain_id);
            exit(1);
        }
    };

    let client = match OrderbookClient::new(client_config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create order-book client: {}", e);
            exit(1);
        }
    };

    let wallet = Arc::new(AlloyWallet::new(node_url, signer));
    let runner = Runner::new(client, wallet, chain, cli_config.orderbook.into());

    if let Err(e) = runner.run(cli_config.command).await {
        error!(%e, "Command failed");
        exit(1);
    }
}
