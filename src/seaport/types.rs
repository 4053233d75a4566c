use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::abi::seaport as sol;

/// Seaport item type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ItemType {
    Native,
    Erc20,
    Erc721,
    Erc1155,
    Erc721WithCriteria,
    Erc1155WithCriteria,
}

impl ItemType {
    /// Item carries a non-fungible token.
    pub fn is_nft(&self) -> bool {
        matches!(
            self,
            ItemType::Erc721
                | ItemType::Erc1155
                | ItemType::Erc721WithCriteria
                | ItemType::Erc1155WithCriteria
        )
    }
}

impl From<ItemType> for u8 {
    fn from(value: ItemType) -> Self {
        match value {
            ItemType::Native => 0,
            ItemType::Erc20 => 1,
            ItemType::Erc721 => 2,
            ItemType::Erc1155 => 3,
            ItemType::Erc721WithCriteria => 4,
            ItemType::Erc1155WithCriteria => 5,
        }
    }
}

impl TryFrom<u8> for ItemType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => ItemType::Native,
            1 => ItemType::Erc20,
            2 => ItemType::Erc721,
            3 => ItemType::Erc1155,
            4 => ItemType::Erc721WithCriteria,
            5 => ItemType::Erc1155WithCriteria,
            _ => return Err(format!("unknown item type: {value}")),
        })
    }
}

/// Seaport order type.
///
/// * `Full*` orders can only be filled completely, `Partial*` allow fractions.
/// * `*Restricted` orders can only be fulfilled through or validated by the zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OrderType {
    #[default]
    FullOpen,
    PartialOpen,
    FullRestricted,
    PartialRestricted,
    Contract,
}

impl From<OrderType> for u8 {
    fn from(value: OrderType) -> Self {
        match value {
            OrderType::FullOpen => 0,
            OrderType::PartialOpen => 1,
            OrderType::FullRestricted => 2,
            OrderType::PartialRestricted => 3,
            OrderType::Contract => 4,
        }
    }
}

impl TryFrom<u8> for OrderType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => OrderType::FullOpen,
            1 => OrderType::PartialOpen,
            2 => OrderType::FullRestricted,
            3 => OrderType::PartialRestricted,
            4 => OrderType::Contract,
            _ => return Err(format!("unknown order type: {value}")),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    pub item_type: ItemType,
    pub token: Address,
    #[serde(with = "u256_string")]
    pub identifier_or_criteria: U256,
    #[serde(with = "u256_string")]
    pub start_amount: U256,
    #[serde(with = "u256_string")]
    pub end_amount: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsiderationItem {
    pub item_type: ItemType,
    pub token: Address,
    #[serde(with = "u256_string")]
    pub identifier_or_criteria: U256,
    #[serde(with = "u256_string")]
    pub start_amount: U256,
    #[serde(with = "u256_string")]
    pub end_amount: U256,
    pub recipient: Address,
}

/// Signed order payload as exchanged with the order-book service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderComponents {
    pub offerer: Address,
    pub zone: Address,
    pub offer: Vec<OfferItem>,
    pub consideration: Vec<ConsiderationItem>,
    pub order_type: OrderType,
    #[serde(with = "u256_string")]
    pub start_time: U256,
    #[serde(with = "u256_string")]
    pub end_time: U256,
    pub zone_hash: B256,
    #[serde(with = "u256_string")]
    pub salt: U256,
    pub conduit_key: B256,
    #[serde(with = "u256_string")]
    pub counter: U256,
}

/// Order components together with the offerer's signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithCounter {
    pub parameters: OrderComponents,
    pub signature: Bytes,
}

impl From<&OfferItem> for sol::OfferItem {
    fn from(value: &OfferItem) -> Self {
        Self {
            itemType: value.item_type.into(),
            token: value.token,
            identifierOrCriteria: value.identifier_or_criteria,
            startAmount: value.start_amount,
            endAmount: value.end_amount,
        }
    }
}

impl From<&ConsiderationItem> for sol::ConsiderationItem {
    fn from(value: &ConsiderationItem) -> Self {
        Self {
            itemType: value.item_type.into(),
            token: value.token,
            identifierOrCriteria: value.identifier_or_criteria,
            startAmount: value.start_amount,
            endAmount: value.end_amount,
            recipient: value.recipient,
        }
    }
}

impl From<&OrderComponents> for sol::OrderComponents {
    fn from(value: &OrderComponents) -> Self {
        Self {
            offerer: value.offerer,
            zone: value.zone,
            offer: value.offer.iter().map(Into::into).collect(),
            consideration: value.consideration.iter().map(Into::into).collect(),
            orderType: value.order_type.into(),
            startTime: value.start_time,
            endTime: value.end_time,
            zoneHash: value.zone_hash,
            salt: value.salt,
            conduitKey: value.conduit_key,
            counter: value.counter,
        }
    }
}

impl From<&OrderComponents> for sol::OrderParameters {
    fn from(value: &OrderComponents) -> Self {
        Self {
            offerer: value.offerer,
            zone: value.zone,
            offer: value.offer.iter().map(Into::into).collect(),
            consideration: value.consideration.iter().map(Into::into).collect(),
            orderType: value.order_type.into(),
            startTime: value.start_time,
            endTime: value.end_time,
            zoneHash: value.zone_hash,
            salt: value.salt,
            conduitKey: value.conduit_key,
            totalOriginalConsiderationItems: U256::from(value.consideration.len()),
        }
    }
}

impl From<&OrderWithCounter> for sol::Order {
    fn from(value: &OrderWithCounter) -> Self {
        Self {
            parameters: (&value.parameters).into(),
            signature: value.signature.clone(),
        }
    }
}

/// Amounts as decimal strings, accepting hex (`0x`-prefixed) strings and
/// plain JSON numbers on input.
pub mod u256_string {
    use std::str::FromStr;

    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            Num(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => U256::from_str(s.trim())
                .map_err(|e| de::Error::custom(format!("invalid uint256 {s:?}: {e}"))),
            Repr::Num(n) => Ok(U256::from(n)),
        }
    }
}
