//! Single entry point of the SDK.
//!
//! [`OrderbookClient`] is constructed once by the embedding application and
//! passed to call sites. It owns the order-book gateway and the chain list,
//! and dispatches each trading intent to its handler together with the
//! wallet and progress observer of the call.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::Serialize;
use tracing::instrument;

use crate::{
    Chain,
    api::{
        ApiClient, GetOrderbookFeeRequest, GetSupportedCurrenciesRequest, OrderbookApi,
    },
    chain::Caip2ChainId,
    error::{ErrorCode, ErrorContext, OrderbookError, Result},
    handler::{
        self, AcceptOffer, BuyListing, CancelListing, CancelOffer, CreateListing, CreateOffer,
        Handler, HandlerContext, api_error, chain_error,
    },
    progress::OnProgress,
    types::{
        AcceptOfferParams, AcceptOfferResult, BuyListingParams, BuyListingResult,
        CancelListingParams, CancelListingResult, CancelOfferParams, CancelOfferResult,
        CreateListingParams, CreateListingResult, CreateOfferParams, CreateOfferResult,
        CurrencyToken, OrderbookFee, OrderbookType,
    },
    wallet::Wallet,
};

pub use crate::config::ClientConfig;

/// Trading intent together with the wallet acting on it.
#[derive(Clone, derive_more::Debug)]
pub struct IntentRequest<P> {
    pub params: P,
    #[debug(skip)]
    pub wallet: Arc<dyn Wallet>,
    pub chain_id: Caip2ChainId,
    #[debug(skip)]
    pub on_progress: Option<OnProgress>,
}

impl<P> IntentRequest<P> {
    pub fn new(params: P, wallet: Arc<dyn Wallet>, chain_id: impl Into<Caip2ChainId>) -> Self {
        Self {
            params,
            wallet,
            chain_id: chain_id.into(),
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, on_progress: OnProgress) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}

#[derive(Clone, derive_more::Debug)]
pub struct OrderbookClient {
    config: ClientConfig,
    #[debug(skip)]
    api: Arc<dyn OrderbookApi>,
}

impl OrderbookClient {
    /// Client talking to the order-book service over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = ApiClient::new(&config.api).map_err(|err| {
            OrderbookError::new(
                ErrorCode::InitializationError,
                format!("Failed to initialize order-book client: {err}"),
            )
            .with_details(err)
        })?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Client using the provided order-book gateway.
    pub fn with_api(config: ClientConfig, api: Arc<dyn OrderbookApi>) -> Self {
        Self { config, api }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<dyn OrderbookApi> {
        &self.api
    }

    pub async fn create_listing(
        &self,
        request: IntentRequest<CreateListingParams>,
    ) -> Result<CreateListingResult> {
        self.run(CreateListing, request).await
    }

    pub async fn buy_listing(
        &self,
        request: IntentRequest<BuyListingParams>,
    ) -> Result<BuyListingResult> {
        self.run(BuyListing, request).await
    }

    pub async fn cancel_listing(
        &self,
        request: IntentRequest<CancelListingParams>,
    ) -> Result<CancelListingResult> {
        self.run(CancelListing, request).await
    }

    pub async fn create_offer(
        &self,
        request: IntentRequest<CreateOfferParams>,
    ) -> Result<CreateOfferResult> {
        self.run(CreateOffer, request).await
    }

    pub async fn accept_offer(
        &self,
        request: IntentRequest<AcceptOfferParams>,
    ) -> Result<AcceptOfferResult> {
        self.run(AcceptOffer, request).await
    }

    pub async fn cancel_offer(
        &self,
        request: IntentRequest<CancelOfferParams>,
    ) -> Result<CancelOfferResult> {
        self.run(CancelOffer, request).await
    }

    /// Marketplace fees the order-book applies to orders on `contract`.
    #[instrument(skip(self))]
    pub async fn get_orderbook_fee(
        &self,
        contract: Address,
        orderbook: OrderbookType,
        chain_id: Caip2ChainId,
    ) -> Result<Vec<OrderbookFee>> {
        let request = GetOrderbookFeeRequest {
            contract_address: contract,
            orderbook,
            chain_id,
        };
        self.api
            .get_orderbook_fee(&request)
            .await
            .map(|r| r.marketplace_fees)
            .map_err(|err| with_request(api_error(err), chain_id, &request))
    }

    /// Currencies orders on `contract` can be priced in.
    #[instrument(skip(self))]
    pub async fn get_supported_currencies(
        &self,
        contract: Address,
        orderbook: OrderbookType,
        chain_id: Caip2ChainId,
    ) -> Result<Vec<CurrencyToken>> {
        let request = GetSupportedCurrenciesRequest {
            chain_id,
            orderbook,
            contract_address: contract,
        };
        self.api
            .get_supported_currencies(&request)
            .await
            .map(|r| r.currencies)
            .map_err(|err| with_request(api_error(err), chain_id, &request))
    }

    async fn run<H: Handler>(
        &self,
        handler: H,
        request: IntentRequest<H::Params>,
    ) -> Result<H::Output> {
        let ctx = match self.context(&request).await {
            Ok(ctx) => ctx,
            Err(err) => {
                let context = ErrorContext::handler(request.chain_id, &request.params);
                return Err(err.into_intent(H::ERROR_CODE, context));
            }
        };
        handler::execute(&handler, ctx, &request.params).await
    }

    /// Handler context of the request, checking the chain is configured
    /// and matches the wallet's one.
    async fn context<P>(&self, request: &IntentRequest<P>) -> Result<HandlerContext> {
        let chain = self.resolve_chain(request.chain_id)?;
        let wallet_chain = request.wallet.chain_id().await.map_err(chain_error)?;
        if wallet_chain != chain.chain_id() {
            return Err(OrderbookError::new(
                ErrorCode::InvalidParameters,
                format!(
                    "Wallet is connected to chain {wallet_chain}, expected {}",
                    chain.chain_id()
                ),
            ));
        }
        Ok(HandlerContext::new(
            self.api.clone(),
            request.wallet.clone(),
            chain.clone(),
            request.on_progress.clone(),
        ))
    }

    fn resolve_chain(&self, chain_id: Caip2ChainId) -> Result<&Chain> {
        self.config.chain(chain_id.id()).ok_or_else(|| {
            OrderbookError::new(
                ErrorCode::InvalidParameters,
                format!("Chain {chain_id} is not configured"),
            )
        })
    }
}

fn with_request<R: Serialize>(
    err: OrderbookError,
    chain_id: Caip2ChainId,
    request: &R,
) -> OrderbookError {
    err.with_context(ErrorContext::handler(chain_id, request))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{U256, address};
    use url::Url;

    use super::*;
    use crate::{
        api::ApiClientOptions,
        testing::{FeeMode, TestOrderbook, TestWallet},
        types::ListingItem,
    };

    fn client(api: Arc<TestOrderbook>) -> OrderbookClient {
        let config = ClientConfig::new(
            "test",
            ApiClientOptions::new(Url::parse("https://api.example.com").unwrap()),
        )
        .with_chain(Chain::doma_testnet());
        OrderbookClient::with_api(config, api)
    }

    fn listing() -> CreateListingParams {
        CreateListingParams {
            items: vec![ListingItem::new(
                address!("0x2222222222222222222222222222222222222222"),
                U256::from(1),
                U256::from(100),
            )],
            source: "test".to_string(),
            orderbook: OrderbookType::Doma,
            marketplace_fees: None,
        }
    }

    #[tokio::test]
    async fn test_unknown_chain() {
        let client = client(Arc::new(TestOrderbook::new()));
        let wallet = Arc::new(TestWallet::new(1));
        let err = client
            .create_listing(IntentRequest::new(listing(), wallet, 1u64))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameters);
        assert_eq!(err.message(), "Chain eip155:1 is not configured");
    }

    #[tokio::test]
    async fn test_wallet_on_other_chain() {
        let client = client(Arc::new(TestOrderbook::new()));
        let wallet = Arc::new(TestWallet::new(1));
        let err = client
            .create_listing(IntentRequest::new(
                listing(),
                wallet.clone(),
                crate::chain::DOMA_TESTNET,
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameters);
        assert!(err.context().unwrap().params.is_some());
        assert!(wallet.untouched());
    }

    #[tokio::test]
    async fn test_zero_address_wallet() {
        let client = client(Arc::new(TestOrderbook::new()));
        let wallet =
            Arc::new(TestWallet::new(crate::chain::DOMA_TESTNET).with_address(Address::ZERO));
        let err = client
            .create_listing(IntentRequest::new(listing(), wallet, crate::chain::DOMA_TESTNET))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SignerNotProvided);
    }

    #[tokio::test]
    async fn test_fee_passthrough_errors() {
        let api = Arc::new(TestOrderbook::new());
        api.set_fee_mode(FeeMode::Status(500));
        let err = client(api)
            .get_orderbook_fee(
                Address::ZERO,
                OrderbookType::Doma,
                Caip2ChainId::new(crate::chain::DOMA_TESTNET),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ApiError);
    }

    #[test]
    fn test_initialization_error() {
        let config = ClientConfig::new(
            "test",
            ApiClientOptions::new(Url::parse("https://api.example.com").unwrap())
                .with_header("bad header", "value"),
        );
        let err = OrderbookClient::new(config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InitializationError);
    }
}
