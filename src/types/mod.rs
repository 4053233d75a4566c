//! Trading intent parameters and results.

mod listing;
mod offer;

use std::fmt;

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};

pub use listing::*;
pub use offer::*;

use crate::{
    seaport::{ItemType, OrderWithCounter},
    wallet::TxReceipt,
};

/// Order-book the order is published to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderbookType {
    Doma,
    Opensea,
}

impl fmt::Display for OrderbookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderbookType::Doma => "DOMA",
            OrderbookType::Opensea => "OPENSEA",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeeType {
    Doma,
    Opensea,
    Royalty,
}

/// Marketplace fee applied to an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderbookFee {
    pub recipient: Address,
    pub basis_points: u32,
    pub fee_type: FeeType,
}

/// Currency accepted by the order-book for a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyToken {
    /// Zero address stands for the native currency.
    pub contract_address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CancellationType {
    #[default]
    OnChain,
    OffChain,
}

/// Token standard of the traded asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenStandard {
    #[default]
    Erc721,
    Erc1155,
}

impl From<TokenStandard> for ItemType {
    fn from(value: TokenStandard) -> Self {
        match value {
            TokenStandard::Erc721 => ItemType::Erc721,
            TokenStandard::Erc1155 => ItemType::Erc1155,
        }
    }
}

/// Order published to the order-book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: String,
    pub order_data: OrderWithCounter,
}

/// Result of creating a listing or an offer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub orders: Vec<CreatedOrder>,
}

pub type CreateListingResult = CreateOrderResult;
pub type CreateOfferResult = CreateOrderResult;

/// Trading outcome of a mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Reverted,
}

impl TxStatus {
    pub fn from_receipt_status(status: bool) -> Self {
        if status {
            TxStatus::Success
        } else {
            TxStatus::Reverted
        }
    }
}

/// Result of fulfilling or cancelling an order.
///
/// `transaction_hash` is `None` for off-chain cancellations, which also
/// report zero gas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub transaction_hash: Option<TxHash>,
    pub status: TxStatus,
    pub gas_used: u64,
    pub gas_price: u128,
}

impl TransactionResult {
    pub fn off_chain() -> Self {
        Self {
            transaction_hash: None,
            status: TxStatus::Success,
            gas_used: 0,
            gas_price: 0,
        }
    }
}

impl From<TxReceipt> for TransactionResult {
    fn from(receipt: TxReceipt) -> Self {
        Self {
            transaction_hash: Some(receipt.transaction_hash),
            status: TxStatus::from_receipt_status(receipt.status),
            gas_used: receipt.gas_used,
            gas_price: receipt.effective_gas_price,
        }
    }
}

pub type BuyListingResult = TransactionResult;
pub type AcceptOfferResult = TransactionResult;
pub type CancelListingResult = TransactionResult;
pub type CancelOfferResult = TransactionResult;
