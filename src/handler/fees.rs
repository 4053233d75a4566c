use alloy::primitives::Address;
use tracing::debug;

use super::HandlerContext;
use crate::{
    api::GetOrderbookFeeRequest,
    error::{ErrorCode, OrderbookError, Result},
    types::{OrderbookFee, OrderbookType},
};

/// Marketplace fees of an order on `contract`.
///
/// Caller-supplied fees are used verbatim. Otherwise the order-book fee
/// schedule is queried: no schedule (HTTP 404) means no fees, any other
/// failure aborts with [`ErrorCode::FetchFeesFailed`].
pub(crate) async fn resolve_fees(
    ctx: &HandlerContext,
    supplied: Option<&[OrderbookFee]>,
    contract: Address,
    orderbook: OrderbookType,
) -> Result<Vec<OrderbookFee>> {
    if let Some(fees) = supplied {
        return Ok(fees.to_vec());
    }

    let request = GetOrderbookFeeRequest {
        contract_address: contract,
        orderbook,
        chain_id: ctx.chain().caip2(),
    };
    match ctx.api().get_orderbook_fee(&request).await {
        Ok(response) => {
            debug!(fees = response.marketplace_fees.len(), "fee schedule fetched");
            Ok(response.marketplace_fees)
        }
        Err(err) if err.is_not_found() => {
            debug!(%contract, "no fee schedule");
            Ok(Vec::new())
        }
        Err(err) => Err(OrderbookError::new(
            ErrorCode::FetchFeesFailed,
            format!("Failed to fetch orderbook fees: {err}"),
        )
        .with_details(err)),
    }
}
