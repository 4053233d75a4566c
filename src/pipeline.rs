//! Sequential execution of action lists.
//!
//! Actions run strictly in order, each reaching a terminal state (signed or
//! mined) before the next one starts. The first failure stops the run; there
//! is no resume, callers rebuild the action list and start over. A submitted
//! transaction that fails to confirm is reported as a failure of its step
//! and never resubmitted.

use std::{error::Error, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    action::{Action, Artifact},
    error::{ErrorCode, ErrorContext, ErrorDetails, OrderbookError, Result},
    progress::{OnProgress, ProgressStep, ProgressTracker, StepPatch},
};

/// Executes `actions` in order and returns the artifact of the last one.
///
/// A mined but reverted transaction completes its step; the revert is only
/// visible in the returned receipt.
pub async fn execute_all<R>(actions: Vec<Action>, on_progress: Option<OnProgress>) -> Result<R>
where
    R: TryFrom<Artifact, Error = Artifact>,
{
    if actions.is_empty() {
        return Err(OrderbookError::new(
            ErrorCode::InvalidParameters,
            "No actions provided",
        ));
    }

    let steps = actions
        .iter()
        .map(|action| ProgressStep::new(action.kind()))
        .collect();
    let mut tracker = ProgressTracker::new(steps, on_progress);
    let last = actions.len() - 1;
    let mut result = None;

    for (index, action) in actions.iter().enumerate() {
        let kind = action.kind();
        debug!(index, action = kind.as_str(), "executing action");
        tracker.update_step(index, StepPatch::pending())?;

        match execute(action, index, &mut tracker).await {
            Ok(artifact) => {
                tracker.complete_step(index, None)?;
                if index == last {
                    result = Some(artifact);
                }
            }
            Err(cause) => {
                warn!(index, action = kind.as_str(), error = %cause, "action failed");
                tracker.fail_step(index, cause.clone())?;
                return Err(step_failure(action, index, cause, &tracker));
            }
        }
    }

    let artifact = result.ok_or_else(|| {
        OrderbookError::new(ErrorCode::UnknownError, "Final result not found")
    })?;
    info!(steps = tracker.total_steps(), "actions executed");
    R::try_from(artifact).map_err(|artifact| {
        OrderbookError::new(
            ErrorCode::UnknownError,
            format!("Unexpected result of final action: {artifact:?}"),
        )
    })
}

async fn execute(
    action: &Action,
    index: usize,
    tracker: &mut ProgressTracker,
) -> std::result::Result<Artifact, ErrorDetails> {
    match action {
        Action::Create(create) => Ok(Artifact::Order(create.create_order().await.map_err(shared)?)),
        Action::CreateBulk(bulk) => Ok(Artifact::Orders(
            bulk.create_bulk_orders().await.map_err(shared)?,
        )),
        Action::OffChainCancel(cancel) => Ok(Artifact::Cancel(
            cancel.create_cancel_signature().await.map_err(shared)?,
        )),
        Action::Approval { transaction, .. }
        | Action::Exchange(transaction)
        | Action::CancelOrder(transaction)
        | Action::Conversion(transaction) => {
            let submitted = transaction.transact().await.map_err(shared)?;
            debug!(index, hash = %submitted.hash, "transaction submitted");
            tracker
                .set_transaction_submitted(index, submitted.hash, submitted.chain_id)
                .map_err(shared)?;
            let receipt = transaction.wait(submitted).await.map_err(shared)?;
            if !receipt.status {
                warn!(index, hash = %receipt.transaction_hash, "transaction reverted");
            }
            Ok(Artifact::Receipt(receipt))
        }
    }
}

fn shared<E: Error + Send + Sync + 'static>(err: E) -> ErrorDetails {
    Arc::new(err)
}

fn step_failure(
    action: &Action,
    index: usize,
    cause: ErrorDetails,
    tracker: &ProgressTracker,
) -> OrderbookError {
    let kind = action.kind();
    let message = match action {
        Action::Approval { token, .. } => format!("Failed to approve {token}: {cause}"),
        _ => format!("Failed to execute {} action: {cause}", kind.as_str()),
    };
    OrderbookError::new(kind.failure_code(), message)
        .with_shared_details(cause)
        .with_context(ErrorContext {
            action: Some(kind),
            action_index: Some(index),
            progress: Some(tracker.steps().to_vec()),
            ..Default::default()
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy::{
        primitives::{Address, U256, address},
        sol_types::SolCall,
    };

    use super::*;
    use crate::{
        abi::tokens::{IApprovalForAll, IERC20},
        action::{ActionKind, CreateBulkOrdersAction, TransactionAction},
        chain::SEAPORT_V1_6,
        progress::{StepStatus, StepTxHash},
        seaport::{
            OrderWithCounter, eip712,
            order::{DEFAULT_ORDER_DURATION, OrderTerms, build_listing},
        },
        testing::TestWallet,
        types::ListingItem,
        wallet::{TxReceipt, Wallet, contract_call},
    };

    const TOKEN: Address = address!("0x5555555555555555555555555555555555555555");
    const OPERATOR: Address = address!("0x6666666666666666666666666666666666666666");

    fn approval(wallet: &Arc<TestWallet>) -> Action {
        let call = IERC20::approveCall {
            spender: OPERATOR,
            amount: U256::MAX,
        };
        Action::Approval {
            token: TOKEN,
            operator: OPERATOR,
            transaction: TransactionAction::new(
                wallet.clone() as Arc<dyn Wallet>,
                contract_call(TOKEN, &call, U256::ZERO),
            ),
        }
    }

    fn exchange(wallet: &Arc<TestWallet>) -> Action {
        let call = IApprovalForAll::setApprovalForAllCall {
            operator: OPERATOR,
            approved: true,
        };
        Action::Exchange(TransactionAction::new(
            wallet.clone() as Arc<dyn Wallet>,
            contract_call(TOKEN, &call, U256::ZERO),
        ))
    }

    fn recorder() -> (OnProgress, Arc<Mutex<Vec<Vec<ProgressStep>>>>) {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let on_progress: OnProgress = Arc::new(move |steps: &[ProgressStep]| {
            sink.lock().unwrap().push(steps.to_vec());
        });
        (on_progress, updates)
    }

    #[tokio::test]
    async fn test_empty_actions_rejected() {
        let (on_progress, updates) = recorder();
        let err = execute_all::<TxReceipt>(Vec::new(), Some(on_progress))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameters);
        assert_eq!(err.message(), "No actions provided");
        assert!(updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_result_is_last_artifact() {
        let wallet = Arc::new(TestWallet::new(1));
        let (on_progress, updates) = recorder();

        let receipt: TxReceipt = execute_all(
            vec![approval(&wallet), exchange(&wallet)],
            Some(on_progress),
        )
        .await
        .unwrap();

        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 2);
        assert_eq!(receipt.transaction_hash, sent[1].hash);
        assert!(receipt.status);

        let updates = updates.lock().unwrap();
        let last = updates.last().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].action, ActionKind::Approval);
        assert_eq!(last[1].action, ActionKind::Exchange);
        assert!(last.iter().all(|s| s.status == StepStatus::Complete));
        assert_eq!(last[1].tx_hashes.len(), 1);
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_not_an_error() {
        let wallet = Arc::new(TestWallet::new(1));
        wallet.revert_selector(IApprovalForAll::setApprovalForAllCall::SELECTOR);

        let receipt: TxReceipt = execute_all(vec![exchange(&wallet)], None)
            .await
            .unwrap();
        assert!(!receipt.status);
    }

    #[tokio::test]
    async fn test_approval_failure_fails_step_once() {
        let wallet = Arc::new(TestWallet::new(1));
        wallet.fail_selector(IERC20::approveCall::SELECTOR);
        let (on_progress, updates) = recorder();

        let err = execute_all::<TxReceipt>(
            vec![approval(&wallet), exchange(&wallet)],
            Some(on_progress),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SeaportApprovalFailed);
        assert!(err.message().starts_with("Failed to approve"));
        let context = err.context().unwrap();
        assert_eq!(context.action, Some(ActionKind::Approval));
        assert_eq!(context.action_index, Some(0));
        let progress = context.progress.as_ref().unwrap();
        assert_eq!(progress[0].status, StepStatus::Error);
        assert_eq!(progress[1].status, StepStatus::Incomplete);

        let updates = updates.lock().unwrap();
        let failures = updates
            .windows(2)
            .filter(|w| {
                w[0][0].status != StepStatus::Error && w[1][0].status == StepStatus::Error
            })
            .count();
        assert_eq!(failures, 1);
        assert!(wallet.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_transaction_fails_permanently() {
        let wallet = Arc::new(TestWallet::new(1));
        wallet.fail_receipt(IApprovalForAll::setApprovalForAllCall::SELECTOR);
        let (on_progress, updates) = recorder();

        let err = execute_all::<TxReceipt>(
            vec![exchange(&wallet), approval(&wallet)],
            Some(on_progress),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SeaportTransactionFailed);
        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 1);

        let context = err.context().unwrap();
        assert_eq!(context.action, Some(ActionKind::Exchange));
        assert_eq!(context.action_index, Some(0));
        let progress = context.progress.as_ref().unwrap();
        assert_eq!(progress[0].status, StepStatus::Error);
        assert_eq!(
            progress[0].tx_hashes,
            vec![StepTxHash {
                tx_hash: sent[0].hash,
                chain_id: 1,
            }]
        );
        assert_eq!(progress[1].status, StepStatus::Incomplete);

        let updates = updates.lock().unwrap();
        let failures = updates
            .windows(2)
            .filter(|w| {
                w[0][0].status != StepStatus::Error && w[1][0].status == StepStatus::Error
            })
            .count();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_bulk_orders_signed_in_sequence() {
        let wallet = Arc::new(TestWallet::new(1));
        let terms =
            OrderTerms::new(wallet.signer_address(), U256::ZERO, DEFAULT_ORDER_DURATION).unwrap();
        let orders: Vec<_> = (1..=3u64)
            .map(|id| {
                build_listing(
                    &ListingItem::new(TOKEN, U256::from(id), U256::from(100 * id)),
                    &[],
                    &terms,
                )
                .unwrap()
            })
            .collect();
        let action = Action::CreateBulk(CreateBulkOrdersAction::new(
            wallet.clone(),
            orders.clone(),
            eip712::domain(1, SEAPORT_V1_6),
        ));

        let signed: Vec<OrderWithCounter> = execute_all(vec![action], None).await.unwrap();

        assert_eq!(signed.len(), 3);
        for (order, components) in signed.iter().zip(&orders) {
            assert_eq!(&order.parameters, components);
            assert_eq!(order.signature.len(), 65);
        }
        assert_eq!(wallet.signed_messages().len(), 3);
        assert!(wallet.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_result_type() {
        let wallet = Arc::new(TestWallet::new(1));
        let err = execute_all::<OrderWithCounter>(
            vec![exchange(&wallet)],
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownError);
    }
}
