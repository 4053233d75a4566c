use std::{
    collections::BTreeMap,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use alloy::primitives::{Address, B256, U256};

use super::types::{ConsiderationItem, ItemType, OfferItem, OrderComponents, OrderType};
use crate::types::{self, OrderbookFee};

/// Validity window of orders created without an explicit duration.
pub const DEFAULT_ORDER_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

pub const BASIS_POINTS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderBuildError {
    #[error("total fees of {0} basis points exceed the order price")]
    FeesExceedPrice(u64),

    #[error("fee amount overflows for price {0}")]
    FeeOverflow(U256),

    #[error("order duration of {0:?} is out of range")]
    DurationOutOfRange(Duration),

    #[error("restricted order requires a zone")]
    MissingZone,

    #[error("offer currency must be an ERC-20 token")]
    NativeOfferCurrency,
}

/// Order-wide terms shared by listings and offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderTerms {
    pub offerer: Address,
    pub zone: Address,
    pub order_type: OrderType,
    pub start_time: u64,
    pub end_time: u64,
    pub salt: U256,
    pub counter: U256,
}

impl OrderTerms {
    /// Open order valid from now for `duration`, with a random salt.
    pub fn new(
        offerer: Address,
        counter: U256,
        duration: Duration,
    ) -> Result<Self, OrderBuildError> {
        let start_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let end_time = start_time
            .checked_add(duration.as_secs())
            .ok_or(OrderBuildError::DurationOutOfRange(duration))?;
        Ok(Self {
            offerer,
            zone: Address::ZERO,
            order_type: OrderType::FullOpen,
            start_time,
            end_time,
            salt: U256::from(rand::random::<u64>()),
            counter,
        })
    }

    /// Makes the order fulfillable only through `zone`.
    pub fn restricted(mut self, zone: Address) -> Self {
        self.zone = zone;
        self.order_type = OrderType::FullRestricted;
        self
    }
}

/// Fee amount of `price` for the given basis points, rounded down.
pub fn fee_amount(price: U256, basis_points: u32) -> Result<U256, OrderBuildError> {
    price
        .checked_mul(U256::from(basis_points))
        .map(|v| v / U256::from(BASIS_POINTS))
        .ok_or(OrderBuildError::FeeOverflow(price))
}

fn currency_item_type(currency: Address) -> ItemType {
    if currency.is_zero() {
        ItemType::Native
    } else {
        ItemType::Erc20
    }
}

fn fee_items(
    fees: &[OrderbookFee],
    currency: Address,
    price: U256,
) -> Result<Vec<ConsiderationItem>, OrderBuildError> {
    let total_bps: u64 = fees.iter().map(|f| u64::from(f.basis_points)).sum();
    if total_bps > u64::from(BASIS_POINTS) {
        return Err(OrderBuildError::FeesExceedPrice(total_bps));
    }
    let mut items = Vec::with_capacity(fees.len());
    for fee in fees {
        let amount = fee_amount(price, fee.basis_points)?;
        if amount.is_zero() {
            continue;
        }
        items.push(ConsiderationItem {
            item_type: currency_item_type(currency),
            token: currency,
            identifier_or_criteria: U256::ZERO,
            start_amount: amount,
            end_amount: amount,
            recipient: fee.recipient,
        });
    }
    Ok(items)
}

fn components(
    terms: &OrderTerms,
    offer: Vec<OfferItem>,
    consideration: Vec<ConsiderationItem>,
) -> OrderComponents {
    OrderComponents {
        offerer: terms.offerer,
        zone: terms.zone,
        offer,
        consideration,
        order_type: terms.order_type,
        start_time: U256::from(terms.start_time),
        end_time: U256::from(terms.end_time),
        zone_hash: B256::ZERO,
        salt: terms.salt,
        conduit_key: B256::ZERO,
        counter: terms.counter,
    }
}

/// Builds sell order: the NFT is offered, the seller receives the price
/// minus marketplace fees, fee recipients receive the rest.
pub fn build_listing(
    item: &types::ListingItem,
    fees: &[OrderbookFee],
    terms: &OrderTerms,
) -> Result<OrderComponents, OrderBuildError> {
    let currency = item.currency_contract_address.unwrap_or(Address::ZERO);
    let fee_items = fee_items(fees, currency, item.price)?;
    let fees_total = fee_items
        .iter()
        .fold(U256::ZERO, |acc, f| acc + f.start_amount);
    let proceeds = item
        .price
        .checked_sub(fees_total)
        .ok_or(OrderBuildError::FeeOverflow(item.price))?;

    let offer = vec![OfferItem {
        item_type: item.item_type.into(),
        token: item.contract,
        identifier_or_criteria: item.token_id,
        start_amount: U256::from(1),
        end_amount: U256::from(1),
    }];

    let mut consideration = vec![ConsiderationItem {
        item_type: currency_item_type(currency),
        token: currency,
        identifier_or_criteria: U256::ZERO,
        start_amount: proceeds,
        end_amount: proceeds,
        recipient: terms.offerer,
    }];
    consideration.extend(fee_items);

    Ok(components(terms, offer, consideration))
}

/// Builds buy order: the currency amount is offered in exchange for the NFT,
/// marketplace fees are paid in the same currency by the fulfiller.
pub fn build_offer(
    item: &types::OfferItem,
    fees: &[OrderbookFee],
    terms: &OrderTerms,
) -> Result<OrderComponents, OrderBuildError> {
    let currency = item.currency_contract_address;
    if currency.is_zero() {
        return Err(OrderBuildError::NativeOfferCurrency);
    }
    if terms.order_type == OrderType::FullRestricted && terms.zone.is_zero() {
        return Err(OrderBuildError::MissingZone);
    }

    let offer = vec![OfferItem {
        item_type: ItemType::Erc20,
        token: currency,
        identifier_or_criteria: U256::ZERO,
        start_amount: item.price,
        end_amount: item.price,
    }];

    let mut consideration = vec![ConsiderationItem {
        item_type: item.item_type.into(),
        token: item.contract,
        identifier_or_criteria: item.token_id,
        start_amount: U256::from(1),
        end_amount: U256::from(1),
        recipient: terms.offerer,
    }];
    consideration.extend(fee_items(fees, currency, item.price)?);

    Ok(components(terms, offer, consideration))
}

/// Approval the fulfiller of an order needs before the exchange can move
/// its tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalRequirement {
    Erc20 { token: Address, amount: U256 },
    Operator { token: Address },
}

/// Native currency the fulfiller has to attach to the fulfillment.
pub fn native_payment(order: &OrderComponents) -> U256 {
    order
        .consideration
        .iter()
        .filter(|c| c.item_type == ItemType::Native)
        .fold(U256::ZERO, |acc, c| acc + c.start_amount)
}

/// Approvals the fulfiller needs to provide every non-native consideration
/// item of `order`.
pub fn fulfillment_requirements(order: &OrderComponents) -> Vec<ApprovalRequirement> {
    let mut erc20 = BTreeMap::<Address, U256>::new();
    let mut operators = Vec::<Address>::new();
    for item in &order.consideration {
        if item.item_type == ItemType::Erc20 {
            *erc20.entry(item.token).or_default() += item.start_amount;
        } else if item.item_type.is_nft() && !operators.contains(&item.token) {
            operators.push(item.token);
        }
    }
    erc20
        .into_iter()
        .map(|(token, amount)| ApprovalRequirement::Erc20 { token, amount })
        .chain(
            operators
                .into_iter()
                .map(|token| ApprovalRequirement::Operator { token }),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::types::{FeeType, ListingItem, OfferItem as OfferRequest, TokenStandard};

    const SELLER: Address = address!("0x1111111111111111111111111111111111111111");
    const NFT: Address = address!("0x2222222222222222222222222222222222222222");
    const FEE_RECIPIENT: Address = address!("0x3333333333333333333333333333333333333333");
    const WETH: Address = address!("0x4444444444444444444444444444444444444444");

    fn terms() -> OrderTerms {
        OrderTerms::new(SELLER, U256::from(7), DEFAULT_ORDER_DURATION).unwrap()
    }

    fn fee(bps: u32) -> OrderbookFee {
        OrderbookFee {
            recipient: FEE_RECIPIENT,
            basis_points: bps,
            fee_type: FeeType::Doma,
        }
    }

    #[test]
    fn test_listing_deducts_fees_from_proceeds() {
        let item = ListingItem::new(NFT, U256::from(42), U256::from(1_000_000));
        let order = build_listing(&item, &[fee(250)], &terms()).unwrap();

        assert_eq!(order.offer.len(), 1);
        assert_eq!(order.offer[0].item_type, ItemType::Erc721);
        assert_eq!(order.offer[0].identifier_or_criteria, U256::from(42));

        assert_eq!(order.consideration.len(), 2);
        assert_eq!(order.consideration[0].recipient, SELLER);
        assert_eq!(order.consideration[0].item_type, ItemType::Native);
        assert_eq!(order.consideration[0].start_amount, U256::from(975_000));
        assert_eq!(order.consideration[1].recipient, FEE_RECIPIENT);
        assert_eq!(order.consideration[1].start_amount, U256::from(25_000));
        assert_eq!(native_payment(&order), U256::from(1_000_000));
        assert_eq!(order.counter, U256::from(7));
        assert_eq!(
            order.end_time - order.start_time,
            U256::from(DEFAULT_ORDER_DURATION.as_secs())
        );
    }

    #[test]
    fn test_listing_rejects_excessive_fees() {
        let item = ListingItem::new(NFT, U256::from(1), U256::from(100));
        assert_eq!(
            build_listing(&item, &[fee(6_000), fee(5_000)], &terms()),
            Err(OrderBuildError::FeesExceedPrice(11_000))
        );
    }

    #[test]
    fn test_offer_pays_fees_in_offer_currency() {
        let item = OfferRequest::new(NFT, U256::from(5), U256::from(2_000), WETH)
            .with_item_type(TokenStandard::Erc1155);
        let order = build_offer(&item, &[fee(500)], &terms()).unwrap();

        assert_eq!(order.offer[0].item_type, ItemType::Erc20);
        assert_eq!(order.offer[0].start_amount, U256::from(2_000));
        assert_eq!(order.consideration[0].item_type, ItemType::Erc1155);
        assert_eq!(order.consideration[0].recipient, SELLER);
        assert_eq!(order.consideration[1].token, WETH);
        assert_eq!(order.consideration[1].start_amount, U256::from(100));
        assert_eq!(order.order_type, OrderType::FullOpen);

        assert_eq!(
            fulfillment_requirements(&order),
            vec![
                ApprovalRequirement::Erc20 {
                    token: WETH,
                    amount: U256::from(100)
                },
                ApprovalRequirement::Operator { token: NFT },
            ]
        );
    }

    #[test]
    fn test_restricted_offer() {
        let zone = address!("0x5555555555555555555555555555555555555555");
        let item = OfferRequest::new(NFT, U256::from(5), U256::from(2_000), WETH);

        let order = build_offer(&item, &[], &terms().restricted(zone)).unwrap();
        assert_eq!(order.order_type, OrderType::FullRestricted);
        assert_eq!(order.zone, zone);

        assert_eq!(
            build_offer(&item, &[], &terms().restricted(Address::ZERO)),
            Err(OrderBuildError::MissingZone)
        );
    }

    #[test]
    fn test_fee_amount_rounds_down() {
        assert_eq!(fee_amount(U256::from(999), 250), Ok(U256::from(24)));
        assert_eq!(fee_amount(U256::ZERO, 250), Ok(U256::ZERO));
    }

    #[test]
    fn test_fee_schedule_overflow() {
        let item = ListingItem::new(NFT, U256::from(1), U256::from(100));
        assert_eq!(
            build_listing(&item, &[fee(u32::MAX), fee(10)], &terms()),
            Err(OrderBuildError::FeesExceedPrice(u64::from(u32::MAX) + 10))
        );

        let item = ListingItem::new(NFT, U256::from(1), U256::MAX);
        assert_eq!(
            build_listing(&item, &[fee(250)], &terms()),
            Err(OrderBuildError::FeeOverflow(U256::MAX))
        );
    }

    #[test]
    fn test_duration_out_of_range() {
        assert_eq!(
            OrderTerms::new(SELLER, U256::ZERO, Duration::MAX),
            Err(OrderBuildError::DurationOutOfRange(Duration::MAX))
        );
    }
}
