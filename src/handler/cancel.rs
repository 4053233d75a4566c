use alloy::primitives::{B256, U256};
use async_trait::async_trait;
use tracing::info;

use super::{Handler, HandlerContext, OrderSide, Stage, api_error, invalid};
use crate::{
    abi::seaport::{self as sol, Seaport},
    action::{Action, OffChainCancel, OffChainCancelAction},
    api::CancelOrderRequest,
    error::{ErrorCode, Result},
    seaport::eip712,
    types::{
        CancelListingParams, CancelListingResult, CancelOfferParams, CancelOfferResult,
        CancellationType, TransactionResult,
    },
    wallet::{TxReceipt, contract_call},
};

/// Cancels a listing, on-chain by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct CancelListing;

#[async_trait]
impl Handler for CancelListing {
    type Params = CancelListingParams;
    type Output = CancelListingResult;

    const INTENT: &'static str = "cancel_listing";
    const ERROR_CODE: ErrorCode = ErrorCode::ListingCancellationFailed;

    async fn handle(
        &self,
        ctx: &mut HandlerContext,
        params: &CancelListingParams,
    ) -> Result<CancelListingResult> {
        cancel(
            ctx,
            OrderSide::Listing,
            &params.order_id,
            params.cancellation_type,
        )
        .await
    }
}

/// Cancels an offer, on-chain by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct CancelOffer;

#[async_trait]
impl Handler for CancelOffer {
    type Params = CancelOfferParams;
    type Output = CancelOfferResult;

    const INTENT: &'static str = "cancel_offer";
    const ERROR_CODE: ErrorCode = ErrorCode::OfferCancellationFailed;

    async fn handle(
        &self,
        ctx: &mut HandlerContext,
        params: &CancelOfferParams,
    ) -> Result<CancelOfferResult> {
        cancel(
            ctx,
            OrderSide::Offer,
            &params.order_id,
            params.cancellation_type,
        )
        .await
    }
}

async fn cancel(
    ctx: &mut HandlerContext,
    side: OrderSide,
    order_id: &str,
    cancellation_type: CancellationType,
) -> Result<TransactionResult> {
    if order_id.trim().is_empty() {
        return Err(invalid("Order id is required"));
    }
    let owner = ctx.wallet_address().await?;
    let order = ctx.fetch_order(side, order_id, owner).await?;
    if order.parameters.offerer != owner {
        return Err(invalid("Only the offerer can cancel the order"));
    }

    ctx.enter(Stage::BuildingActions);
    match cancellation_type {
        CancellationType::OffChain => {
            // Order ids are order hashes, recompute if the id is opaque.
            let order_hash = order_id
                .parse::<B256>()
                .unwrap_or_else(|_| eip712::order_hash(&order.parameters));
            let action = OffChainCancelAction::new(ctx.wallet(), order_hash, ctx.domain());
            let cancel: OffChainCancel = ctx
                .run_actions(vec![Action::OffChainCancel(action)])
                .await?;

            ctx.enter(Stage::Persisting);
            let request = CancelOrderRequest {
                order_id: order_id.to_string(),
                signature: cancel.signature,
            };
            match side {
                OrderSide::Listing => ctx.api().cancel_listing(&request).await,
                OrderSide::Offer => ctx.api().cancel_offer(&request).await,
            }
            .map_err(api_error)?;
            info!(order_id, %order_hash, "order cancelled off-chain");
            Ok(TransactionResult::off_chain())
        }
        CancellationType::OnChain => {
            let call = Seaport::cancelCall {
                orders: vec![sol::OrderComponents::from(&order.parameters)],
            };
            let action = ctx.transaction(contract_call(ctx.chain().exchange(), &call, U256::ZERO));
            let receipt: TxReceipt = ctx.run_actions(vec![Action::CancelOrder(action)]).await?;
            let result = TransactionResult::from(receipt);
            info!(
                order_id,
                hash = ?result.transaction_hash,
                status = ?result.status,
                "order cancelled on-chain"
            );
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::{
        primitives::{Address, Bytes, Signature, address},
        sol_types::SolCall,
    };

    use super::*;
    use crate::{
        Chain,
        api::{ApiError, OrderbookApi},
        handler::execute,
        progress::{OnProgress, ProgressStep, StepKind},
        seaport::{
            OrderWithCounter,
            order::{DEFAULT_ORDER_DURATION, OrderTerms, build_listing},
        },
        testing::{TestOrderbook, TestWallet},
        types::{ListingItem, TxStatus},
    };

    const NFT: Address = address!("0x2222222222222222222222222222222222222222");

    fn setup(
        on_progress: Option<OnProgress>,
    ) -> (Arc<TestOrderbook>, Arc<TestWallet>, HandlerContext, String) {
        let chain = Chain::doma_testnet();
        let api = Arc::new(TestOrderbook::new());
        let wallet = Arc::new(TestWallet::new(chain.chain_id()));

        let terms =
            OrderTerms::new(wallet.signer_address(), U256::ZERO, DEFAULT_ORDER_DURATION).unwrap();
        let parameters = build_listing(
            &ListingItem::new(NFT, U256::from(3), U256::from(1000)),
            &[],
            &terms,
        )
        .unwrap();
        let order_id = eip712::order_hash(&parameters).to_string();
        let order = OrderWithCounter {
            parameters,
            signature: Bytes::from(vec![3u8; 65]),
        };
        api.insert_listing(order_id.clone(), order.clone());
        api.insert_offer(order_id.clone(), order);

        let ctx = HandlerContext::new(api.clone(), wallet.clone(), chain, on_progress);
        (api, wallet, ctx, order_id)
    }

    #[tokio::test]
    async fn test_off_chain_cancel_listing() {
        let steps = Arc::new(std::sync::Mutex::new(Vec::<ProgressStep>::new()));
        let sink = steps.clone();
        let on_progress: OnProgress =
            Arc::new(move |s: &[ProgressStep]| *sink.lock().unwrap() = s.to_vec());
        let (api, wallet, ctx, order_id) = setup(Some(on_progress));

        let result = execute(
            &CancelListing,
            ctx,
            &CancelListingParams {
                order_id: order_id.clone(),
                cancellation_type: CancellationType::OffChain,
            },
        )
        .await
        .unwrap();

        assert_eq!(result, TransactionResult::off_chain());
        assert_eq!(result.transaction_hash, None);
        assert_eq!(result.gas_used, 0);
        assert!(wallet.sent_transactions().is_empty());

        let signed = wallet.signed_messages();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].primary_type, "OrderHash");
        assert_eq!(
            signed[0].message["orderHash"],
            serde_json::Value::String(order_id.clone())
        );

        let requests = api.cancel_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].order_id, order_id);
        assert!(api.listing(&order_id).is_none());

        let steps = steps.lock().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].kind, StepKind::Signature);
    }

    #[tokio::test]
    async fn test_cancel_signature_is_deterministic() {
        let (_, wallet, ctx, order_id) = setup(None);
        let order_hash = order_id.parse::<B256>().unwrap();
        let action = OffChainCancelAction::new(ctx.wallet(), order_hash, ctx.domain());

        let first = action.create_cancel_signature().await.unwrap();
        let second = action.create_cancel_signature().await.unwrap();
        assert_eq!(first, second);

        let hash = eip712::cancel_typed_data(order_hash, ctx.domain())
            .eip712_signing_hash()
            .unwrap();
        let signer = Signature::try_from(first.signature.as_ref())
            .unwrap()
            .recover_address_from_prehash(&hash)
            .unwrap();
        assert_eq!(signer, wallet.signer_address());
    }

    #[tokio::test]
    async fn test_cancel_signed_by_other_key_refused() {
        let (api, _, ctx, order_id) = setup(None);
        let other = Arc::new(TestWallet::new(ctx.chain().chain_id()));
        let forged = OffChainCancelAction::new(
            other,
            order_id.parse::<B256>().unwrap(),
            ctx.domain(),
        )
        .create_cancel_signature()
        .await
        .unwrap();

        let err = api
            .cancel_listing(&CancelOrderRequest {
                order_id: order_id.clone(),
                signature: forged.signature,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));

        let err = api
            .cancel_listing(&CancelOrderRequest {
                order_id: order_id.clone(),
                signature: Bytes::from(vec![7u8; 65]),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert!(api.listing(&order_id).is_some());
        assert!(api.cancel_requests().is_empty());
    }

    #[tokio::test]
    async fn test_on_chain_cancel_offer() {
        let (_, wallet, ctx, order_id) = setup(None);

        let result = execute(
            &CancelOffer,
            ctx,
            &CancelOfferParams {
                order_id,
                cancellation_type: CancellationType::OnChain,
            },
        )
        .await
        .unwrap();

        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].selector, Seaport::cancelCall::SELECTOR);
        assert_eq!(result.transaction_hash, Some(sent[0].hash));
        assert_eq!(result.status, TxStatus::Success);
    }

    #[tokio::test]
    async fn test_missing_order() {
        let (_, wallet, ctx, _) = setup(None);
        let err = execute(
            &CancelOffer,
            ctx,
            &CancelOfferParams {
                order_id: "0x1234".to_string(),
                cancellation_type: CancellationType::OffChain,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OrderNotFound);
        assert!(wallet.untouched());
    }

    #[tokio::test]
    async fn test_rejected_cancel_signature() {
        let (api, wallet, ctx, order_id) = setup(None);
        wallet.reject_signatures();

        let err = execute(
            &CancelListing,
            ctx,
            &CancelListingParams {
                order_id,
                cancellation_type: CancellationType::OffChain,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ListingCancellationFailed);
        assert_eq!(
            err.step_error().code(),
            ErrorCode::OffchainCancelOrderFailed
        );
        assert!(api.cancel_requests().is_empty());
    }
}
