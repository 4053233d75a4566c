use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use orderbook_sdk::{
    Chain,
    chain::Caip2ChainId,
    client::{IntentRequest, OrderbookClient},
    num::Converter,
    progress::{OnProgress, ProgressState, ProgressStep, StepStatus},
    types::{
        AcceptOfferParams, BuyListingParams, CancelListingParams, CancelOfferParams,
        CreateListingParams, CreateOfferParams, ListingItem, OfferItem, OrderbookType,
    },
    wallet::Wallet,
};
use serde::Serialize;
use tracing::info;

use crate::{
    config::{Command, ItemArgs, cancellation_type},
    error::{Error, Result},
};

/// Executes one CLI command against the order-book.
pub struct Runner {
    client: OrderbookClient,
    wallet: Arc<dyn Wallet>,
    chain: Chain,
    orderbook: OrderbookType,
}

impl Runner {
    pub fn new(
        client: OrderbookClient,
        wallet: Arc<dyn Wallet>,
        chain: Chain,
        orderbook: OrderbookType,
    ) -> Self {
        Self {
            client,
            wallet,
            chain,
            orderbook,
        }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::List { item, currency } => {
                let converter = self.converter(item.contract, currency).await?;
                let mut listing =
                    ListingItem::new(item.contract, item.token_id()?, converter.parse(&item.price)?)
                        .with_item_type(item.standard());
                if let Some(currency) = currency {
                    listing = listing.with_currency(currency);
                }
                if let Some(duration) = item.duration() {
                    listing = listing.with_duration(duration);
                }
                let params = CreateListingParams {
                    items: vec![listing],
                    source: self.client.config().source.clone(),
                    orderbook: self.orderbook,
                    marketplace_fees: None,
                };
                let result = self.client.create_listing(self.request(params)).await?;
                print(&result)
            }
            Command::Buy { order_id } => {
                let result = self
                    .client
                    .buy_listing(self.request(BuyListingParams { order_id }))
                    .await?;
                print(&result)
            }
            Command::Offer {
                item,
                currency,
                zone,
            } => {
                let currency = match currency.or(self.chain.wrapped_native()) {
                    Some(currency) => currency,
                    None => return Err(Error::UnsupportedCurrency("native".to_string())),
                };
                let params = self.offer_params(&item, currency, zone).await?;
                let result = self.client.create_offer(self.request(params)).await?;
                print(&result)
            }
            Command::Accept { order_id } => {
                let result = self
                    .client
                    .accept_offer(self.request(AcceptOfferParams { order_id }))
                    .await?;
                print(&result)
            }
            Command::CancelListing {
                order_id,
                off_chain,
            } => {
                let params = CancelListingParams {
                    order_id,
                    cancellation_type: cancellation_type(off_chain),
                };
                let result = self.client.cancel_listing(self.request(params)).await?;
                print(&result)
            }
            Command::CancelOffer {
                order_id,
                off_chain,
            } => {
                let params = CancelOfferParams {
                    order_id,
                    cancellation_type: cancellation_type(off_chain),
                };
                let result = self.client.cancel_offer(self.request(params)).await?;
                print(&result)
            }
            Command::Fees { contract } => {
                let fees = self
                    .client
                    .get_orderbook_fee(contract, self.orderbook, self.chain_id())
                    .await?;
                print(&fees)
            }
            Command::Currencies { contract } => {
                let currencies = self
                    .client
                    .get_supported_currencies(contract, self.orderbook, self.chain_id())
                    .await?;
                print(&currencies)
            }
        }
    }

    async fn offer_params(
        &self,
        item: &ItemArgs,
        currency: Address,
        zone: Option<Address>,
    ) -> Result<CreateOfferParams> {
        let converter = self.converter(item.contract, Some(currency)).await?;
        let mut offer = OfferItem::new(
            item.contract,
            item.token_id()?,
            converter.parse(&item.price)?,
            currency,
        )
        .with_item_type(item.standard());
        if let Some(duration) = item.duration() {
            offer = offer.with_duration(duration);
        }
        Ok(CreateOfferParams {
            items: vec![offer],
            source: self.client.config().source.clone(),
            orderbook: self.orderbook,
            marketplace_fees: None,
            restricted_by_zone: zone.is_some(),
            zone,
        })
    }

    /// Amount converter of `currency`, with decimals reported by the
    /// order-book for ERC-20 currencies.
    async fn converter(&self, contract: Address, currency: Option<Address>) -> Result<Converter> {
        let currency = match currency {
            Some(currency) if currency != Address::ZERO => currency,
            _ => return Ok(Converter::native()),
        };
        let currencies = self
            .client
            .get_supported_currencies(contract, self.orderbook, self.chain_id())
            .await?;
        currencies
            .iter()
            .find(|c| c.contract_address == currency)
            .map(|c| Converter::new(c.decimals))
            .ok_or_else(|| Error::UnsupportedCurrency(currency.to_string()))
    }

    fn chain_id(&self) -> Caip2ChainId {
        self.chain.caip2()
    }

    fn request<P>(&self, params: P) -> IntentRequest<P> {
        IntentRequest::new(params, self.wallet.clone(), self.chain_id())
            .with_progress(progress_logger())
    }
}

/// Logs every step whose state changed since the previous notification.
fn progress_logger() -> OnProgress {
    let seen = Mutex::new(Vec::<(StepStatus, Option<ProgressState>)>::new());
    Arc::new(move |steps: &[ProgressStep]| {
        let Ok(mut seen) = seen.lock() else {
            return;
        };
        seen.resize(steps.len(), (StepStatus::Incomplete, None));
        for (index, step) in steps.iter().enumerate() {
            let state = (step.status, step.progress_state);
            if seen[index] == state {
                continue;
            }
            seen[index] = state;
            info!(
                step = index + 1,
                of = steps.len(),
                action = step.action.as_str(),
                status = ?step.status,
                state = ?step.progress_state,
                tx_hashes = ?step.tx_hashes.iter().map(|t| t.tx_hash).collect::<Vec<_>>(),
                "{}",
                step.description
            );
        }
    })
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
