//! Order-book SDK.
//!
//! # Overview
//!
//! Turns trading intents on domain-name tokens (create/buy/cancel a listing,
//! create/accept/cancel an offer) into the sequence of approvals, signatures
//! and transactions against the Seaport exchange they require, executes it
//! with observable progress and publishes the resulting orders to the
//! order-book service.
//!
//! Use [`client::OrderbookClient`] as the single entry point. It is built once
//! from a [`client::ClientConfig`] and passed to call sites; every intent takes
//! the [`wallet::Wallet`] to act with and an optional
//! [`progress::OnProgress`] observer.
//!
//! Lower-level building blocks are public as well: [`seaport`] for order
//! construction and hashing, [`action`] and [`pipeline`] for executing custom
//! action lists, [`api`] for direct access to the order-book service.
//!
//! # Errors
//!
//! Every public operation fails with [`error::OrderbookError`]. Its
//! [`error::ErrorCode`] names the failed intent, while
//! [`error::OrderbookError::step_error`] exposes the pipeline step that broke.
//!
//! # Limitations/follow-ups
//!
//! * Orders carry a single item, multi-item listings and offers are rejected.
//!
//! * Bulk orders are signed one by one instead of with a single bulk
//!   (Merkle tree) signature.
//!
//! # Testing
//!
//! [`testing`] module provides an in-memory wallet and order-book service.
//!

pub mod abi;
pub mod action;
pub mod api;
pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod num;
pub mod pipeline;
pub mod progress;
pub mod seaport;
pub mod testing;
pub mod types;
pub mod wallet;

use alloy::primitives::Address;

use crate::chain::Caip2ChainId;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Chain the order-book is operating on.
pub struct Chain {
    chain_id: u64,
    name: String,
    exchange: Address,
    wrapped_native: Option<Address>,
}

impl Chain {
    pub fn doma_testnet() -> Self {
        Self::new(chain::DOMA_TESTNET, "Doma Testnet")
    }

    pub fn base_sepolia() -> Self {
        Self::new(chain::BASE_SEPOLIA, "Base Sepolia")
    }

    pub fn sepolia() -> Self {
        Self::new(chain::ETHEREUM_SEPOLIA, "Sepolia")
    }

    /// Chain with the canonical Seaport 1.6 deployment.
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
            exchange: chain::SEAPORT_V1_6,
            wrapped_native: None,
        }
    }

    pub fn custom(
        chain_id: u64,
        name: impl Into<String>,
        exchange: Address,
        wrapped_native: Option<Address>,
    ) -> Self {
        Self {
            chain_id,
            name: name.into(),
            exchange,
            wrapped_native,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn caip2(&self) -> Caip2ChainId {
        Caip2ChainId::new(self.chain_id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exchange(&self) -> Address {
        self.exchange
    }

    /// Wrapped native currency, the configured override or the canonical
    /// one of the chain.
    pub fn wrapped_native(&self) -> Option<Address> {
        self.wrapped_native
            .or_else(|| chain::wrapped_native_address(self.chain_id))
    }
}
