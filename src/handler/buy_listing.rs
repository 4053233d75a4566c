use alloy::primitives::B256;
use async_trait::async_trait;
use tracing::info;

use super::{Handler, HandlerContext, OrderSide, Stage, invalid};
use crate::{
    abi::seaport::{self as sol, Seaport},
    action::Action,
    error::{ErrorCode, Result},
    seaport::order::native_payment,
    types::{BuyListingParams, BuyListingResult, TransactionResult},
    wallet::{TxReceipt, contract_call},
};

/// Fulfills a listing stored in the order-book.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuyListing;

#[async_trait]
impl Handler for BuyListing {
    type Params = BuyListingParams;
    type Output = BuyListingResult;

    const INTENT: &'static str = "buy_listing";
    const ERROR_CODE: ErrorCode = ErrorCode::BuyListingFailed;

    async fn handle(
        &self,
        ctx: &mut HandlerContext,
        params: &BuyListingParams,
    ) -> Result<BuyListingResult> {
        fulfill(ctx, OrderSide::Listing, &params.order_id).await
    }
}

/// Fulfills the stored order as the wallet, preceded by the approvals the
/// wallet lacks to pay the consideration.
///
/// A reverted fulfillment completes with [`crate::types::TxStatus::Reverted`].
pub(super) async fn fulfill(
    ctx: &mut HandlerContext,
    side: OrderSide,
    order_id: &str,
) -> Result<TransactionResult> {
    if order_id.trim().is_empty() {
        return Err(invalid("Order id is required"));
    }
    let fulfiller = ctx.wallet_address().await?;
    let order = ctx.fetch_order(side, order_id, fulfiller).await?;

    ctx.enter(Stage::BuildingActions);
    let mut actions = ctx
        .fulfillment_approvals(fulfiller, &order.parameters)
        .await?;
    let call = Seaport::fulfillOrderCall {
        order: sol::Order::from(&order),
        fulfillerConduitKey: B256::ZERO,
    };
    let value = native_payment(&order.parameters);
    actions.push(Action::Exchange(ctx.transaction(contract_call(
        ctx.chain().exchange(),
        &call,
        value,
    ))));

    let receipt: TxReceipt = ctx.run_actions(actions).await?;
    let result = TransactionResult::from(receipt);
    info!(
        order_id,
        hash = ?result.transaction_hash,
        status = ?result.status,
        "order fulfilled"
    );
    Ok(result)
}
