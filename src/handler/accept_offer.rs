use async_trait::async_trait;

use super::{Handler, HandlerContext, OrderSide, buy_listing::fulfill};
use crate::{
    error::{ErrorCode, Result},
    types::{AcceptOfferParams, AcceptOfferResult},
};

/// Fulfills an offer stored in the order-book, selling the NFT it bids on.
///
/// The exchange needs operator approval over the collection and, when
/// marketplace fees are due, an allowance over the offer currency.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptOffer;

#[async_trait]
impl Handler for AcceptOffer {
    type Params = AcceptOfferParams;
    type Output = AcceptOfferResult;

    const INTENT: &'static str = "accept_offer";
    const ERROR_CODE: ErrorCode = ErrorCode::AcceptOfferFailed;

    async fn handle(
        &self,
        ctx: &mut HandlerContext,
        params: &AcceptOfferParams,
    ) -> Result<AcceptOfferResult> {
        fulfill(ctx, OrderSide::Offer, &params.order_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::{
        primitives::{Address, Bytes, U256, address},
        sol_types::SolCall,
    };

    use super::*;
    use crate::{
        Chain,
        abi::{
            seaport::Seaport,
            tokens::{IApprovalForAll, IERC20},
        },
        handler::execute,
        seaport::{
            OrderWithCounter,
            order::{DEFAULT_ORDER_DURATION, OrderTerms, build_offer},
        },
        testing::{TestOrderbook, TestWallet},
        types::{FeeType, OfferItem, OrderbookFee, TxStatus},
    };

    const BIDDER: Address = address!("0x1111111111111111111111111111111111111111");
    const NFT: Address = address!("0x2222222222222222222222222222222222222222");
    const FEE_RECIPIENT: Address = address!("0x3333333333333333333333333333333333333333");

    fn stored_offer(api: &TestOrderbook, fees: &[OrderbookFee]) {
        let weth = Chain::doma_testnet().wrapped_native().unwrap();
        let terms = OrderTerms::new(BIDDER, U256::ZERO, DEFAULT_ORDER_DURATION).unwrap();
        let item = OfferItem::new(NFT, U256::from(9), U256::from(10_000), weth);
        api.insert_offer(
            "offer-1",
            OrderWithCounter {
                parameters: build_offer(&item, fees, &terms).unwrap(),
                signature: Bytes::from(vec![2u8; 65]),
            },
        );
    }

    fn setup() -> (Arc<TestOrderbook>, Arc<TestWallet>, HandlerContext) {
        let chain = Chain::doma_testnet();
        let api = Arc::new(TestOrderbook::new());
        let wallet = Arc::new(TestWallet::new(chain.chain_id()));
        let ctx = HandlerContext::new(api.clone(), wallet.clone(), chain, None);
        (api, wallet, ctx)
    }

    fn params() -> AcceptOfferParams {
        AcceptOfferParams {
            order_id: "offer-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_offer() {
        let (_, wallet, ctx) = setup();
        let err = execute(&AcceptOffer, ctx, &params()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::OrderNotFound);
        assert_eq!(err.message(), "Offer not found");
        assert!(wallet.untouched());
    }

    #[tokio::test]
    async fn test_approves_collection_and_fee_currency() {
        let (api, wallet, ctx) = setup();
        stored_offer(
            &api,
            &[OrderbookFee {
                recipient: FEE_RECIPIENT,
                basis_points: 250,
                fee_type: FeeType::Doma,
            }],
        );

        let result = execute(&AcceptOffer, ctx, &params()).await.unwrap();

        let selectors: Vec<_> = wallet
            .sent_transactions()
            .iter()
            .map(|tx| tx.selector)
            .collect();
        assert_eq!(
            selectors,
            vec![
                IERC20::approveCall::SELECTOR,
                IApprovalForAll::setApprovalForAllCall::SELECTOR,
                Seaport::fulfillOrderCall::SELECTOR,
            ]
        );
        assert_eq!(result.status, TxStatus::Success);
    }

    #[tokio::test]
    async fn test_approved_seller_only_fulfills() {
        let (api, wallet, ctx) = setup();
        stored_offer(&api, &[]);
        wallet.approve_operator(
            NFT,
            wallet.signer_address(),
            Chain::doma_testnet().exchange(),
        );

        execute(&AcceptOffer, ctx, &params()).await.unwrap();

        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value, U256::ZERO);
    }

    #[tokio::test]
    async fn test_failed_approval_names_step() {
        let (api, wallet, ctx) = setup();
        stored_offer(&api, &[]);
        wallet.fail_selector(IApprovalForAll::setApprovalForAllCall::SELECTOR);

        let err = execute(&AcceptOffer, ctx, &params()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AcceptOfferFailed);
        assert_eq!(err.step_error().code(), ErrorCode::SeaportApprovalFailed);
        let progress = err.step_error().context().unwrap().progress.clone().unwrap();
        assert_eq!(progress.len(), 2);
    }
}
