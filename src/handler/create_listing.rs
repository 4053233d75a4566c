use async_trait::async_trait;
use tracing::info;

use super::{
    Handler, HandlerContext, Stage, api_error, build_error, fees::resolve_fees, invalid,
    single_item,
};
use crate::{
    action::{Action, CreateOrderAction},
    api::CreateListingRequest,
    error::{ErrorCode, Result},
    seaport::{
        OrderWithCounter,
        order::{DEFAULT_ORDER_DURATION, OrderTerms, build_listing},
    },
    types::{CreateListingParams, CreateListingResult, CreatedOrder},
};

/// Signs a sell order for a single NFT and publishes it to the order-book.
///
/// The exchange is granted operator approval over the collection first if
/// it does not have it yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateListing;

#[async_trait]
impl Handler for CreateListing {
    type Params = CreateListingParams;
    type Output = CreateListingResult;

    const INTENT: &'static str = "create_listing";
    const ERROR_CODE: ErrorCode = ErrorCode::ListingCreationFailed;

    async fn handle(
        &self,
        ctx: &mut HandlerContext,
        params: &CreateListingParams,
    ) -> Result<CreateListingResult> {
        let item = single_item(&params.items, "listing")?;
        if item.price.is_zero() {
            return Err(invalid("Listing price must be greater than zero"));
        }
        let offerer = ctx.wallet_address().await?;
        let fees = resolve_fees(
            ctx,
            params.marketplace_fees.as_deref(),
            item.contract,
            params.orderbook,
        )
        .await?;

        ctx.enter(Stage::BuildingActions);
        let counter = ctx.counter(offerer).await?;
        let terms = OrderTerms::new(
            offerer,
            counter,
            item.duration.unwrap_or(DEFAULT_ORDER_DURATION),
        )
        .map_err(build_error)?;
        let components = build_listing(item, &fees, &terms).map_err(build_error)?;

        let mut actions = Vec::new();
        actions.extend(ctx.operator_approval(offerer, item.contract).await?);
        actions.push(Action::Create(CreateOrderAction::new(
            ctx.wallet(),
            components,
            ctx.domain(),
        )));

        let order: OrderWithCounter = ctx.run_actions(actions).await?;

        ctx.enter(Stage::Persisting);
        let request = CreateListingRequest {
            signature: order.signature.clone(),
            orderbook: params.orderbook,
            chain_id: ctx.chain().caip2(),
            parameters: order.parameters.clone(),
        };
        let response = ctx
            .api()
            .create_listing(&request)
            .await
            .map_err(api_error)?;
        info!(order_id = %response.order_id, source = %params.source, "listing created");

        Ok(CreateListingResult {
            orders: vec![CreatedOrder {
                order_id: response.order_id,
                order_data: order,
            }],
        })
    }
}
