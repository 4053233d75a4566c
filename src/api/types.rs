use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::{
    chain::Caip2ChainId,
    seaport::OrderComponents,
    types::{CurrencyToken, OrderbookFee, OrderbookType},
};

/// Signed order submitted to the order-book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub signature: Bytes,
    pub orderbook: OrderbookType,
    pub chain_id: Caip2ChainId,
    pub parameters: OrderComponents,
}

pub type CreateListingRequest = CreateOrderRequest;
pub type CreateOfferRequest = CreateOrderRequest;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingResponse {
    pub order_id: String,
    #[serde(rename = "fulFillerAddress", default)]
    pub fulfiller_address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferResponse {
    pub order_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderRequest {
    pub order_id: String,
    #[serde(rename = "fulFillerAddress")]
    pub fulfiller_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOrderResponse {
    pub signature: Bytes,
    pub parameters: OrderComponents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderbookFeeRequest {
    pub contract_address: Address,
    pub orderbook: OrderbookType,
    pub chain_id: Caip2ChainId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderbookFeeResponse {
    #[serde(default)]
    pub marketplace_fees: Vec<OrderbookFee>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSupportedCurrenciesRequest {
    pub chain_id: Caip2ChainId,
    pub orderbook: OrderbookType,
    pub contract_address: Address,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSupportedCurrenciesResponse {
    #[serde(default)]
    pub currencies: Vec<CurrencyToken>,
}

/// Off-chain cancellation, `signature` signs the `OrderHash` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub order_id: String,
    pub signature: Bytes,
}

pub type CancelListingRequest = CancelOrderRequest;
pub type CancelOfferRequest = CancelOrderRequest;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderResponse {
    pub order_id: String,
}
