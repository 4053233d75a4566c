use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::{CancellationType, OrderbookFee, OrderbookType, TokenStandard};
use crate::seaport::u256_string;

/// Asset put up for sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    pub contract: Address,
    #[serde(with = "u256_string")]
    pub token_id: U256,
    /// Price in base units of the currency.
    #[serde(with = "u256_string")]
    pub price: U256,
    /// `None` or zero address for the native currency.
    #[serde(default)]
    pub currency_contract_address: Option<Address>,
    /// Defaults to 24 hours.
    #[serde(default)]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub item_type: TokenStandard,
}

impl ListingItem {
    pub fn new(contract: Address, token_id: U256, price: U256) -> Self {
        Self {
            contract,
            token_id,
            price,
            currency_contract_address: None,
            duration: None,
            item_type: TokenStandard::default(),
        }
    }

    pub fn with_currency(mut self, currency: Address) -> Self {
        self.currency_contract_address = Some(currency);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_item_type(mut self, item_type: TokenStandard) -> Self {
        self.item_type = item_type;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingParams {
    pub items: Vec<ListingItem>,
    pub source: String,
    pub orderbook: OrderbookType,
    /// Used verbatim when present, otherwise fetched from the order-book.
    #[serde(default)]
    pub marketplace_fees: Option<Vec<OrderbookFee>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyListingParams {
    pub order_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelListingParams {
    pub order_id: String,
    #[serde(default)]
    pub cancellation_type: CancellationType,
}
