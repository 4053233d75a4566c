//! Trading intent handlers.
//!
//! Every call runs one handler through the stages `validating →
//! building-actions → executing → persisting → done|failed`. A handler
//! validates the intent, builds the action list (including the approvals and
//! conversions the wallet still lacks), executes it through
//! [`crate::pipeline`] and publishes the outcome to the order-book.
//!
//! Failures leave the handler as [`OrderbookError`]s with the intent code,
//! wrapping the step or collaborator error. Preconditions checked by the
//! handler itself keep their own code.

mod accept_offer;
mod buy_listing;
mod cancel;
mod create_listing;
mod create_offer;
mod fees;

use std::{fmt, sync::Arc};

use alloy::{
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
    sol_types::{Eip712Domain, SolCall},
};
use async_trait::async_trait;
use futures::future::try_join_all;
use itertools::Itertools;
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};

pub use accept_offer::AcceptOffer;
pub use buy_listing::BuyListing;
pub use cancel::{CancelListing, CancelOffer};
pub use create_listing::CreateListing;
pub use create_offer::CreateOffer;

use crate::{
    Chain,
    abi::{
        seaport::Seaport,
        tokens::{IApprovalForAll, IERC20},
    },
    action::{Action, Artifact, TransactionAction},
    api::{ApiError, GetOrderRequest, OrderbookApi},
    error::{ErrorCode, ErrorContext, OrderbookError, Result},
    pipeline,
    progress::OnProgress,
    seaport::{
        ApprovalRequirement, OrderBuildError, OrderComponents, OrderWithCounter, eip712,
        order::fulfillment_requirements,
    },
    wallet::{self, Wallet, WalletError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Validating,
    BuildingActions,
    Executing,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Validating => "validating",
            Stage::BuildingActions => "building-actions",
            Stage::Executing => "executing",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

/// Side of the order-book an order lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderSide {
    Listing,
    Offer,
}

impl OrderSide {
    fn name(&self) -> &'static str {
        match self {
            OrderSide::Listing => "Listing",
            OrderSide::Offer => "Offer",
        }
    }
}

/// Trading intent implementation.
#[async_trait]
pub trait Handler: Send + Sync {
    type Params: Serialize + Send + Sync;
    type Output: Send;

    const INTENT: &'static str;

    /// Code failures of the intent are reported with.
    const ERROR_CODE: ErrorCode;

    async fn handle(&self, ctx: &mut HandlerContext, params: &Self::Params)
    -> Result<Self::Output>;
}

/// Runs `handler` to completion, attaching the intent code and the call
/// context to any failure.
pub async fn execute<H: Handler>(
    handler: &H,
    mut ctx: HandlerContext,
    params: &H::Params,
) -> Result<H::Output> {
    let span = info_span!("handler", intent = H::INTENT, chain = %ctx.chain.caip2());
    async move {
        match handler.handle(&mut ctx, params).await {
            Ok(output) => {
                ctx.enter(Stage::Done);
                Ok(output)
            }
            Err(err) => {
                warn!(stage = %ctx.stage, code = %err.code(), error = %err, "intent failed");
                ctx.enter(Stage::Failed);
                let context = ErrorContext::handler(ctx.chain.caip2(), params);
                Err(err.into_intent(H::ERROR_CODE, context))
            }
        }
    }
    .instrument(span)
    .await
}

/// Collaborators and state of a single handler invocation.
#[derive(Clone, derive_more::Debug)]
pub struct HandlerContext {
    #[debug(skip)]
    api: Arc<dyn OrderbookApi>,
    #[debug(skip)]
    wallet: Arc<dyn Wallet>,
    chain: Chain,
    #[debug(skip)]
    on_progress: Option<OnProgress>,
    stage: Stage,
}

impl HandlerContext {
    pub fn new(
        api: Arc<dyn OrderbookApi>,
        wallet: Arc<dyn Wallet>,
        chain: Chain,
        on_progress: Option<OnProgress>,
    ) -> Self {
        Self {
            api,
            wallet,
            chain,
            on_progress,
            stage: Stage::Validating,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn api(&self) -> &dyn OrderbookApi {
        self.api.as_ref()
    }

    pub(crate) fn enter(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    pub(crate) fn domain(&self) -> Eip712Domain {
        eip712::domain(self.chain.chain_id(), self.chain.exchange())
    }

    /// Address of the acting wallet, which must not be zero.
    pub(crate) async fn wallet_address(&self) -> Result<Address> {
        let address = self.wallet.address().await.map_err(chain_error)?;
        if address.is_zero() {
            return Err(OrderbookError::new(
                ErrorCode::SignerNotProvided,
                "Signer not provided",
            ));
        }
        Ok(address)
    }

    pub(crate) async fn read<C: SolCall + Send>(&self, to: Address, call: C) -> Result<C::Return> {
        wallet::read(self.wallet.as_ref(), to, call)
            .await
            .map_err(chain_error)
    }

    pub(crate) async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.wallet.native_balance(owner).await.map_err(chain_error)
    }

    /// Current exchange counter of `offerer`.
    pub(crate) async fn counter(&self, offerer: Address) -> Result<U256> {
        self.read(self.chain.exchange(), Seaport::getCounterCall { offerer })
            .await
    }

    /// Stored order, [`ErrorCode::OrderNotFound`] if the order-book has none.
    pub(crate) async fn fetch_order(
        &self,
        side: OrderSide,
        order_id: &str,
        fulfiller: Address,
    ) -> Result<OrderWithCounter> {
        let request = GetOrderRequest {
            order_id: order_id.to_string(),
            fulfiller_address: fulfiller,
        };
        let response = match side {
            OrderSide::Listing => self.api.get_listing(&request).await,
            OrderSide::Offer => self.api.get_offer(&request).await,
        }
        .map_err(api_error)?;
        let order = response.ok_or_else(|| {
            OrderbookError::new(
                ErrorCode::OrderNotFound,
                format!("{} not found", side.name()),
            )
        })?;
        Ok(OrderWithCounter {
            parameters: order.parameters,
            signature: order.signature,
        })
    }

    pub(crate) fn transaction(&self, request: TransactionRequest) -> TransactionAction {
        TransactionAction::new(self.wallet.clone(), request)
    }

    pub(crate) fn wallet(&self) -> Arc<dyn Wallet> {
        self.wallet.clone()
    }

    /// Unlimited ERC-20 approval for the exchange, if the allowance of
    /// `owner` is below `amount`.
    pub(crate) async fn erc20_approval(
        &self,
        owner: Address,
        token: Address,
        amount: U256,
    ) -> Result<Option<Action>> {
        let exchange = self.chain.exchange();
        let allowance = self
            .read(
                token,
                IERC20::allowanceCall {
                    owner,
                    spender: exchange,
                },
            )
            .await?;
        if allowance >= amount {
            return Ok(None);
        }
        debug!(%token, %allowance, %amount, "allowance insufficient");
        let call = IERC20::approveCall {
            spender: exchange,
            amount: U256::MAX,
        };
        Ok(Some(Action::Approval {
            token,
            operator: exchange,
            transaction: self.transaction(wallet::contract_call(token, &call, U256::ZERO)),
        }))
    }

    /// Operator approval of the exchange over all `token`s of `owner`, if
    /// not granted yet.
    pub(crate) async fn operator_approval(
        &self,
        owner: Address,
        token: Address,
    ) -> Result<Option<Action>> {
        let exchange = self.chain.exchange();
        let approved = self
            .read(
                token,
                IApprovalForAll::isApprovedForAllCall {
                    owner,
                    operator: exchange,
                },
            )
            .await?;
        if approved {
            return Ok(None);
        }
        debug!(%token, "operator approval missing");
        let call = IApprovalForAll::setApprovalForAllCall {
            operator: exchange,
            approved: true,
        };
        Ok(Some(Action::Approval {
            token,
            operator: exchange,
            transaction: self.transaction(wallet::contract_call(token, &call, U256::ZERO)),
        }))
    }

    /// Approvals `fulfiller` still lacks to fulfill `order`.
    pub(crate) async fn fulfillment_approvals(
        &self,
        fulfiller: Address,
        order: &OrderComponents,
    ) -> Result<Vec<Action>> {
        let checks = fulfillment_requirements(order)
            .into_iter()
            .map(|requirement| async move {
                match requirement {
                    ApprovalRequirement::Erc20 { token, amount } => {
                        self.erc20_approval(fulfiller, token, amount).await
                    }
                    ApprovalRequirement::Operator { token } => {
                        self.operator_approval(fulfiller, token).await
                    }
                }
            });
        let actions = try_join_all(checks).await?;
        Ok(actions.into_iter().flatten().collect())
    }

    /// Executes the action list with the call's progress observer.
    pub(crate) async fn run_actions<R>(&mut self, actions: Vec<Action>) -> Result<R>
    where
        R: TryFrom<Artifact, Error = Artifact>,
    {
        self.enter(Stage::Executing);
        let kinds = actions.iter().map(|a| a.kind().as_str()).join(",");
        info!(actions = actions.len(), %kinds, "executing actions");
        pipeline::execute_all(actions, self.on_progress.clone()).await
    }
}

pub(crate) fn chain_error(err: WalletError) -> OrderbookError {
    OrderbookError::new(ErrorCode::BlockchainError, err.to_string()).with_details(err)
}

pub(crate) fn api_error(err: ApiError) -> OrderbookError {
    OrderbookError::new(ErrorCode::ApiError, err.to_string()).with_details(err)
}

pub(crate) fn invalid(message: impl Into<String>) -> OrderbookError {
    OrderbookError::new(ErrorCode::InvalidParameters, message)
}

pub(crate) fn build_error(err: OrderBuildError) -> OrderbookError {
    OrderbookError::new(ErrorCode::InvalidParameters, err.to_string()).with_details(err)
}

/// Exactly one item, multi-item orders are not supported.
pub(crate) fn single_item<'a, T>(items: &'a [T], kind: &str) -> Result<&'a T> {
    match items {
        [] => Err(invalid(format!("At least one {kind} item is required"))),
        [item] => Ok(item),
        _ => Err(invalid(format!("Multi-item {kind}s are not supported"))),
    }
}
