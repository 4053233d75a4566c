//! Operations a pipeline executes.
//!
//! Every [`Action`] either signs ([`Action::Create`], [`Action::CreateBulk`],
//! [`Action::OffChainCancel`]) or transacts (all other variants), never both.
//! Actions carry the wallet they execute with and are built fresh for every
//! pipeline run.

use std::sync::Arc;

use alloy::{
    primitives::{Address, B256, Bytes},
    rpc::types::TransactionRequest,
    sol_types::Eip712Domain,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ErrorCode,
    progress::StepKind,
    seaport::{OrderComponents, OrderWithCounter, eip712},
    wallet::{SubmittedTx, TxReceipt, Wallet, WalletError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Create,
    CreateBulk,
    Exchange,
    Approval,
    Conversion,
    CancelOrder,
    OffChainCancel,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::CreateBulk => "createBulk",
            ActionKind::Exchange => "exchange",
            ActionKind::Approval => "approval",
            ActionKind::Conversion => "conversion",
            ActionKind::CancelOrder => "cancelOrder",
            ActionKind::OffChainCancel => "offChainCancel",
        }
    }

    pub fn step_kind(&self) -> StepKind {
        match self {
            ActionKind::Create | ActionKind::CreateBulk | ActionKind::OffChainCancel => {
                StepKind::Signature
            }
            ActionKind::Exchange
            | ActionKind::Approval
            | ActionKind::Conversion
            | ActionKind::CancelOrder => StepKind::Transaction,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionKind::Create => "Creating order",
            ActionKind::CreateBulk => "Creating bulk orders",
            ActionKind::Exchange => "Fulfilling order",
            ActionKind::Approval => "Approving token",
            ActionKind::Conversion => "Converting token",
            ActionKind::CancelOrder => "Canceling order (on-chain)",
            ActionKind::OffChainCancel => "Canceling order (off-chain)",
        }
    }

    /// Code of the error reported when an action of this kind fails.
    pub fn failure_code(&self) -> ErrorCode {
        match self {
            ActionKind::Approval => ErrorCode::SeaportApprovalFailed,
            ActionKind::Create | ActionKind::CreateBulk => ErrorCode::SeaportSignatureFailed,
            ActionKind::OffChainCancel => ErrorCode::OffchainCancelOrderFailed,
            ActionKind::Exchange | ActionKind::CancelOrder => ErrorCode::SeaportTransactionFailed,
            ActionKind::Conversion => ErrorCode::TokenConversionFailed,
        }
    }
}

/// Order signature request.
#[derive(Clone, derive_more::Debug)]
pub struct CreateOrderAction {
    #[debug(skip)]
    wallet: Arc<dyn Wallet>,
    components: OrderComponents,
    domain: Eip712Domain,
}

impl CreateOrderAction {
    pub fn new(wallet: Arc<dyn Wallet>, components: OrderComponents, domain: Eip712Domain) -> Self {
        Self {
            wallet,
            components,
            domain,
        }
    }

    pub fn components(&self) -> &OrderComponents {
        &self.components
    }

    pub async fn create_order(&self) -> Result<OrderWithCounter, WalletError> {
        sign_order(self.wallet.as_ref(), &self.components, &self.domain).await
    }
}

/// Batch of orders, each signed individually in sequence.
#[derive(Clone, derive_more::Debug)]
pub struct CreateBulkOrdersAction {
    #[debug(skip)]
    wallet: Arc<dyn Wallet>,
    orders: Vec<OrderComponents>,
    domain: Eip712Domain,
}

impl CreateBulkOrdersAction {
    pub fn new(
        wallet: Arc<dyn Wallet>,
        orders: Vec<OrderComponents>,
        domain: Eip712Domain,
    ) -> Self {
        Self {
            wallet,
            orders,
            domain,
        }
    }

    pub async fn create_bulk_orders(&self) -> Result<Vec<OrderWithCounter>, WalletError> {
        let mut signed = Vec::with_capacity(self.orders.len());
        for components in &self.orders {
            signed.push(sign_order(self.wallet.as_ref(), components, &self.domain).await?);
        }
        Ok(signed)
    }
}

async fn sign_order(
    wallet: &dyn Wallet,
    components: &OrderComponents,
    domain: &Eip712Domain,
) -> Result<OrderWithCounter, WalletError> {
    let typed = eip712::order_typed_data(components, domain.clone())
        .map_err(|e| WalletError::Fatal(e.to_string()))?;
    let signature = wallet.sign_typed_data(&typed).await?;
    Ok(OrderWithCounter {
        parameters: components.clone(),
        signature: Bytes::from(signature.as_bytes().to_vec()),
    })
}

/// Signed off-chain cancellation of an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffChainCancel {
    pub order_hash: B256,
    pub signature: Bytes,
}

#[derive(Clone, derive_more::Debug)]
pub struct OffChainCancelAction {
    #[debug(skip)]
    wallet: Arc<dyn Wallet>,
    order_hash: B256,
    domain: Eip712Domain,
}

impl OffChainCancelAction {
    pub fn new(wallet: Arc<dyn Wallet>, order_hash: B256, domain: Eip712Domain) -> Self {
        Self {
            wallet,
            order_hash,
            domain,
        }
    }

    pub async fn create_cancel_signature(&self) -> Result<OffChainCancel, WalletError> {
        let typed = eip712::cancel_typed_data(self.order_hash, self.domain.clone());
        let signature = self.wallet.sign_typed_data(&typed).await?;
        Ok(OffChainCancel {
            order_hash: self.order_hash,
            signature: Bytes::from(signature.as_bytes().to_vec()),
        })
    }
}

/// Transaction submitted and awaited by the pipeline.
#[derive(Clone, derive_more::Debug)]
pub struct TransactionAction {
    #[debug(skip)]
    wallet: Arc<dyn Wallet>,
    request: TransactionRequest,
}

impl TransactionAction {
    pub fn new(wallet: Arc<dyn Wallet>, request: TransactionRequest) -> Self {
        Self { wallet, request }
    }

    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    pub async fn transact(&self) -> Result<SubmittedTx, WalletError> {
        self.wallet.send_transaction(self.request.clone()).await
    }

    pub async fn wait(&self, tx: SubmittedTx) -> Result<TxReceipt, WalletError> {
        self.wallet.wait_for_receipt(tx).await
    }
}

#[derive(Clone, Debug)]
pub enum Action {
    Create(CreateOrderAction),
    CreateBulk(CreateBulkOrdersAction),
    OffChainCancel(OffChainCancelAction),
    /// Grants the exchange (`operator`) access to `token` of the owner.
    Approval {
        token: Address,
        operator: Address,
        transaction: TransactionAction,
    },
    Exchange(TransactionAction),
    CancelOrder(TransactionAction),
    Conversion(TransactionAction),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Create(_) => ActionKind::Create,
            Action::CreateBulk(_) => ActionKind::CreateBulk,
            Action::OffChainCancel(_) => ActionKind::OffChainCancel,
            Action::Approval { .. } => ActionKind::Approval,
            Action::Exchange(_) => ActionKind::Exchange,
            Action::CancelOrder(_) => ActionKind::CancelOrder,
            Action::Conversion(_) => ActionKind::Conversion,
        }
    }

    /// Transaction capability, `None` for signature actions.
    pub fn transaction(&self) -> Option<&TransactionAction> {
        match self {
            Action::Approval { transaction, .. } => Some(transaction),
            Action::Exchange(tx) | Action::CancelOrder(tx) | Action::Conversion(tx) => Some(tx),
            Action::Create(_) | Action::CreateBulk(_) | Action::OffChainCancel(_) => None,
        }
    }
}

/// What an action yields once executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    Order(OrderWithCounter),
    Orders(Vec<OrderWithCounter>),
    Cancel(OffChainCancel),
    Receipt(TxReceipt),
}

impl TryFrom<Artifact> for OrderWithCounter {
    type Error = Artifact;

    fn try_from(value: Artifact) -> Result<Self, Self::Error> {
        match value {
            Artifact::Order(order) => Ok(order),
            other => Err(other),
        }
    }
}

impl TryFrom<Artifact> for Vec<OrderWithCounter> {
    type Error = Artifact;

    fn try_from(value: Artifact) -> Result<Self, Self::Error> {
        match value {
            Artifact::Orders(orders) => Ok(orders),
            other => Err(other),
        }
    }
}

impl TryFrom<Artifact> for OffChainCancel {
    type Error = Artifact;

    fn try_from(value: Artifact) -> Result<Self, Self::Error> {
        match value {
            Artifact::Cancel(cancel) => Ok(cancel),
            other => Err(other),
        }
    }
}

impl TryFrom<Artifact> for TxReceipt {
    type Error = Artifact;

    fn try_from(value: Artifact) -> Result<Self, Self::Error> {
        match value {
            Artifact::Receipt(receipt) => Ok(receipt),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ActionKind; 7] = [
        ActionKind::Create,
        ActionKind::CreateBulk,
        ActionKind::Exchange,
        ActionKind::Approval,
        ActionKind::Conversion,
        ActionKind::CancelOrder,
        ActionKind::OffChainCancel,
    ];

    #[test]
    fn test_kind_names_match_wire_format() {
        for kind in ALL {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_signature_kinds() {
        let signatures: Vec<_> = ALL
            .into_iter()
            .filter(|k| k.step_kind() == StepKind::Signature)
            .collect();
        assert_eq!(
            signatures,
            vec![
                ActionKind::Create,
                ActionKind::CreateBulk,
                ActionKind::OffChainCancel
            ]
        );
    }

    #[test]
    fn test_failure_codes() {
        assert_eq!(
            ActionKind::Approval.failure_code(),
            ErrorCode::SeaportApprovalFailed
        );
        assert_eq!(
            ActionKind::CreateBulk.failure_code(),
            ErrorCode::SeaportSignatureFailed
        );
        assert_eq!(
            ActionKind::CancelOrder.failure_code(),
            ErrorCode::SeaportTransactionFailed
        );
        assert_eq!(
            ActionKind::Conversion.failure_code(),
            ErrorCode::TokenConversionFailed
        );
        assert_eq!(
            ActionKind::OffChainCancel.failure_code(),
            ErrorCode::OffchainCancelOrderFailed
        );
    }
}
