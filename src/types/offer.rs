use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::{CancellationType, OrderbookFee, OrderbookType, TokenStandard};
use crate::seaport::u256_string;

/// Asset bid on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    pub contract: Address,
    #[serde(with = "u256_string")]
    pub token_id: U256,
    /// Price in base units of `currency_contract_address`.
    #[serde(with = "u256_string")]
    pub price: U256,
    /// ERC-20 the bid is paid in, offers can't be made in the native currency.
    pub currency_contract_address: Address,
    #[serde(default)]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub item_type: TokenStandard,
}

impl OfferItem {
    pub fn new(contract: Address, token_id: U256, price: U256, currency: Address) -> Self {
        Self {
            contract,
            token_id,
            price,
            currency_contract_address: currency,
            duration: None,
            item_type: TokenStandard::default(),
        }
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
pub struct CreateOfferParams {
    pub items: Vec<OfferItem>,
    pub source: String,
    pub orderbook: OrderbookType,
    #[serde(default)]
    pub marketplace_fees: Option<Vec<OrderbookFee>>,
    /// Creates a `FULL_RESTRICTED` order that only `zone` can authorize.
    #[serde(default)]
    pub restricted_by_zone: bool,
    #[serde(default)]
    pub zone: Option<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOfferParams {
    pub order_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOfferParams {
    pub order_id: String,
    #[serde(default)]
    pub cancellation_type: CancellationType,
}
