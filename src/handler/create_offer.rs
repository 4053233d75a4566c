use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    Handler, HandlerContext, Stage, api_error, build_error, fees::resolve_fees, invalid,
    single_item,
};
use crate::{
    abi::tokens::{IERC20, IWETH},
    action::{Action, CreateOrderAction},
    api::CreateOfferRequest,
    error::{ErrorCode, OrderbookError, Result},
    seaport::{
        OrderWithCounter,
        order::{DEFAULT_ORDER_DURATION, OrderTerms, build_offer},
    },
    types::{CreateOfferParams, CreateOfferResult, CreatedOrder},
    wallet::contract_call,
};

/// Signs a buy order for a single NFT and publishes it to the order-book.
///
/// Before signing, the exchange gets an unlimited allowance over the offer
/// currency if the current one does not cover the price. Offers in the
/// chain's wrapped native currency top up the wrapped balance from the
/// native one when it falls short of the price.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateOffer;

#[async_trait]
impl Handler for CreateOffer {
    type Params = CreateOfferParams;
    type Output = CreateOfferResult;

    const INTENT: &'static str = "create_offer";
    const ERROR_CODE: ErrorCode = ErrorCode::OfferCreationFailed;

    async fn handle(
        &self,
        ctx: &mut HandlerContext,
        params: &CreateOfferParams,
    ) -> Result<CreateOfferResult> {
        let item = single_item(&params.items, "offer")?;
        if item.price.is_zero() {
            return Err(invalid("Offer price must be greater than zero"));
        }
        if item.currency_contract_address.is_zero() {
            return Err(invalid("Offer currency must be an ERC-20 token"));
        }
        let zone = match (params.restricted_by_zone, params.zone) {
            (false, _) => None,
            (true, Some(zone)) if !zone.is_zero() => Some(zone),
            (true, _) => return Err(invalid("Zone is required for restricted offers")),
        };
        let offerer = ctx.wallet_address().await?;
        let fees = resolve_fees(
            ctx,
            params.marketplace_fees.as_deref(),
            item.contract,
            params.orderbook,
        )
        .await?;

        ctx.enter(Stage::BuildingActions);
        let currency = item.currency_contract_address;
        let mut actions = Vec::new();
        actions.extend(ctx.erc20_approval(offerer, currency, item.price).await?);
        actions.extend(wrap_shortfall(ctx, offerer, currency, item.price).await?);

        let counter = ctx.counter(offerer).await?;
        let mut terms = OrderTerms::new(
            offerer,
            counter,
            item.duration.unwrap_or(DEFAULT_ORDER_DURATION),
        )
        .map_err(build_error)?;
        if let Some(zone) = zone {
            terms = terms.restricted(zone);
        }
        let components = build_offer(item, &fees, &terms).map_err(build_error)?;
        actions.push(Action::Create(CreateOrderAction::new(
            ctx.wallet(),
            components,
            ctx.domain(),
        )));

        let order: OrderWithCounter = ctx.run_actions(actions).await?;

        ctx.enter(Stage::Persisting);
        let request = CreateOfferRequest {
            signature: order.signature.clone(),
            orderbook: params.orderbook,
            chain_id: ctx.chain().caip2(),
            parameters: order.parameters.clone(),
        };
        let response = ctx.api().create_offer(&request).await.map_err(api_error)?;
        info!(order_id = %response.order_id, source = %params.source, "offer created");

        Ok(CreateOfferResult {
            orders: vec![CreatedOrder {
                order_id: response.order_id,
                order_data: order,
            }],
        })
    }
}

/// Conversion of native currency covering the gap between the wrapped
/// balance of `owner` and `price`, `None` if the currency is not the
/// chain's wrapped native one or the balance suffices.
async fn wrap_shortfall(
    ctx: &HandlerContext,
    owner: Address,
    currency: Address,
    price: U256,
) -> Result<Option<Action>> {
    if ctx.chain().wrapped_native() != Some(currency) {
        return Ok(None);
    }
    let balance = ctx.read(currency, IERC20::balanceOfCall { owner }).await?;
    if balance >= price {
        return Ok(None);
    }

    let shortfall = price - balance;
    let native = ctx.native_balance(owner).await?;
    if native < shortfall {
        return Err(OrderbookError::new(
            ErrorCode::InsufficientEthBalance,
            "Insufficient funds to cover WETH conversion",
        ));
    }
    debug!(%shortfall, "wrapping native currency");
    let call = IWETH::depositCall {};
    Ok(Some(Action::Conversion(
        ctx.transaction(contract_call(currency, &call, shortfall)),
    )))
}
