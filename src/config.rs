//! Client configuration.
//!
//! Configuration comes from two sources:
//! - [`ClientConfig`] built in code by the embedding application
//! - [`EnvConfig`] loaded from environment variables (via .env file or shell)

use std::time::Duration;

use alloy::{
    primitives::{Address, hex::FromHexError},
    signers::local::{LocalSignerError, PrivateKeySigner},
};
use url::Url;

use crate::{Chain, api::ApiClientOptions};

/// Source reported with orders when none is configured.
pub const DEFAULT_SOURCE: &str = "orderbook-sdk";

/// Shared configuration of [`crate::client::OrderbookClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Application the orders originate from.
    pub source: String,
    /// Chains intents may target.
    pub chains: Vec<Chain>,
    pub api: ApiClientOptions,
}

impl ClientConfig {
    pub fn new(source: impl Into<String>, api: ApiClientOptions) -> Self {
        Self {
            source: source.into(),
            chains: Vec::new(),
            api,
        }
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chains.retain(|c| c.chain_id() != chain.chain_id());
        self.chains.push(chain);
        self
    }

    pub fn chain(&self, chain_id: u64) -> Option<&Chain> {
        self.chains.iter().find(|c| c.chain_id() == chain_id)
    }
}

/// Environment configuration (connection details, credentials).
#[derive(derive_more::Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Base URL of the order-book service
    pub orderbook_api_url: String,

    /// Key sent in the `Api-Key` header
    #[debug(skip)]
    pub orderbook_api_key: Option<String>,

    /// Application name reported with orders
    pub source: Option<String>,

    /// Chain ID (e.g., 97476 for Doma testnet)
    pub chain_id: u64,

    /// Display name of the chain
    pub chain_name: Option<String>,

    /// RPC URL for the node
    pub node_rpc_url: String,

    /// Private key for signing orders and transactions
    #[debug(skip)]
    pub private_key: String,

    /// Exchange contract address, canonical Seaport 1.6 if not set
    pub seaport_address: Option<String>,

    /// Wrapped native currency address, chain default if not set
    pub wrapped_native_address: Option<String>,

    /// Optional timeout for order-book requests
    pub request_timeout_seconds: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn chain(&self) -> Result<Chain, ConfigError> {
        let exchange = match &self.seaport_address {
            Some(address) => address.parse::<Address>()?,
            None => crate::chain::SEAPORT_V1_6,
        };
        let wrapped_native = self
            .wrapped_native_address
            .as_deref()
            .map(str::parse::<Address>)
            .transpose()?;
        let name = self
            .chain_name
            .clone()
            .unwrap_or_else(|| format!("eip155:{}", self.chain_id));
        Ok(Chain::custom(self.chain_id, name, exchange, wrapped_native))
    }

    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut api = ApiClientOptions::new(Url::parse(&self.orderbook_api_url)?)
            .with_api_key(self.orderbook_api_key.clone());
        if let Some(seconds) = self.request_timeout_seconds {
            api = api.with_timeout(Duration::from_secs(seconds));
        }
        let source = self.source.as_deref().unwrap_or(DEFAULT_SOURCE);
        Ok(ClientConfig::new(source, api).with_chain(self.chain()?))
    }

    pub fn node_url(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.node_rpc_url)?)
    }

    pub fn signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        Ok(self.private_key.parse::<PrivateKeySigner>()?)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(#[from] LocalSignerError),
}
