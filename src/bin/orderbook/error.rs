//! Error types for the order-book CLI.

use orderbook_sdk::{error::OrderbookError, num::AmountError};

/// Main error type for the order-book CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Order-book error: {0}")]
    Orderbook(#[from] OrderbookError),

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("Invalid token id: {0}")]
    InvalidTokenId(String),

    #[error("Currency {0} is not supported for this collection")]
    UnsupportedCurrency(String),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
