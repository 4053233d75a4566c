//! Step-by-step progress of a pipeline run.
//!
//! [`ProgressTracker`] owns the step list of one pipeline execution and
//! notifies the observer after every mutation, inline with the mutation
//! itself. A step's status only moves forward: `incomplete` steps may be
//! updated, once `complete` or `error` they are frozen.

use std::sync::Arc;

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};

use crate::{
    action::ActionKind,
    error::{ErrorCode, ErrorDetails, OrderbookError, Result},
};

/// Observer of progress updates, receives the full step list.
pub type OnProgress = Arc<dyn Fn(&[ProgressStep]) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Incomplete,
    Complete,
    Error,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::Incomplete)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Transaction,
    Signature,
    Api,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    Pending,
    Submitted,
    Confirmed,
}

/// Transaction submitted on behalf of a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTxHash {
    pub tx_hash: TxHash,
    pub chain_id: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    pub status: StepStatus,
    pub kind: StepKind,
    pub action: ActionKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_state: Option<ProgressState>,
    /// Every submission of the step, in order. A transaction may be
    /// resubmitted before it confirms.
    pub tx_hashes: Vec<StepTxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub error_data: Option<ErrorDetails>,
}

impl ProgressStep {
    /// Incomplete step of the action kind.
    pub fn new(action: ActionKind) -> Self {
        Self {
            status: StepStatus::Incomplete,
            kind: action.step_kind(),
            action,
            description: action.description().to_string(),
            progress_state: None,
            tx_hashes: Vec::new(),
            error: None,
            error_data: None,
        }
    }
}

/// Partial update of a step, unset fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepPatch {
    pub progress_state: Option<ProgressState>,
    pub description: Option<String>,
}

impl StepPatch {
    pub fn pending() -> Self {
        Self {
            progress_state: Some(ProgressState::Pending),
            ..Default::default()
        }
    }

    fn apply(self, step: &mut ProgressStep) {
        if let Some(state) = self.progress_state {
            step.progress_state = Some(state);
        }
        if let Some(description) = self.description {
            step.description = description;
        }
    }
}

#[derive(derive_more::Debug)]
pub struct ProgressTracker {
    steps: Vec<ProgressStep>,
    current_step_index: usize,
    #[debug(skip)]
    on_progress: Option<OnProgress>,
}

impl ProgressTracker {
    /// Tracker over `steps`, all of them reset to `incomplete`.
    pub fn new(steps: Vec<ProgressStep>, on_progress: Option<OnProgress>) -> Self {
        let steps = steps
            .into_iter()
            .map(|step| ProgressStep {
                status: StepStatus::Incomplete,
                ..step
            })
            .collect();
        Self {
            steps,
            current_step_index: 0,
            on_progress,
        }
    }

    pub fn steps(&self) -> &[ProgressStep] {
        &self.steps
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// All steps completed successfully.
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|step| step.status == StepStatus::Complete)
    }

    pub fn update_step(&mut self, index: usize, patch: StepPatch) -> Result<()> {
        patch.apply(self.open_step(index)?);
        self.notify();
        Ok(())
    }

    /// Marks the step complete and moves on to the next one. Signature steps
    /// have no on-chain confirmation and keep no progress state.
    pub fn complete_step(&mut self, index: usize, patch: Option<StepPatch>) -> Result<()> {
        let step = self.open_step(index)?;
        if let Some(patch) = patch {
            patch.apply(step);
        }
        step.status = StepStatus::Complete;
        step.progress_state = match step.kind {
            StepKind::Signature => None,
            _ => Some(ProgressState::Confirmed),
        };
        if index + 1 < self.steps.len() {
            self.current_step_index = index + 1;
        }
        self.notify();
        Ok(())
    }

    pub fn set_transaction_submitted(
        &mut self,
        index: usize,
        tx_hash: TxHash,
        chain_id: u64,
    ) -> Result<()> {
        let step = self.open_step(index)?;
        step.progress_state = Some(ProgressState::Submitted);
        step.tx_hashes.push(StepTxHash { tx_hash, chain_id });
        self.notify();
        Ok(())
    }

    /// Marks the step failed with `cause`, the current step index stays.
    pub fn fail_step(&mut self, index: usize, cause: ErrorDetails) -> Result<()> {
        let step = self.open_step(index)?;
        step.status = StepStatus::Error;
        step.error = Some(cause.to_string());
        step.error_data = Some(cause);
        self.notify();
        Ok(())
    }

    fn open_step(&mut self, index: usize) -> Result<&mut ProgressStep> {
        let step = self.steps.get_mut(index).ok_or_else(|| {
            OrderbookError::new(
                ErrorCode::InvalidParameters,
                format!("Step index out of bounds: {index}"),
            )
        })?;
        if step.status.is_terminal() {
            return Err(OrderbookError::new(
                ErrorCode::InvalidParameters,
                format!("Step {index} is already {:?}", step.status),
            ));
        }
        Ok(step)
    }

    fn notify(&self) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(&self.steps);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recorder() -> (OnProgress, Arc<Mutex<Vec<Vec<ProgressStep>>>>) {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let on_progress: OnProgress = Arc::new(move |steps: &[ProgressStep]| {
            sink.lock().unwrap().push(steps.to_vec());
        });
        (on_progress, updates)
    }

    fn tracker(on_progress: Option<OnProgress>) -> ProgressTracker {
        ProgressTracker::new(
            vec![
                ProgressStep::new(ActionKind::Approval),
                ProgressStep::new(ActionKind::Create),
            ],
            on_progress,
        )
    }

    #[test]
    fn test_steps_follow_action_kinds() {
        let tracker = tracker(None);
        assert_eq!(tracker.total_steps(), 2);
        assert_eq!(tracker.steps()[0].kind, StepKind::Transaction);
        assert_eq!(tracker.steps()[0].description, "Approving token");
        assert_eq!(tracker.steps()[1].kind, StepKind::Signature);
        assert!(
            tracker
                .steps()
                .iter()
                .all(|s| s.status == StepStatus::Incomplete)
        );
        assert!(!tracker.is_complete());
    }

    #[test]
    fn test_every_mutation_notifies() {
        let (on_progress, updates) = recorder();
        let mut tracker = tracker(Some(on_progress));
        let hash = TxHash::repeat_byte(1);

        tracker.update_step(0, StepPatch::pending()).unwrap();
        tracker.set_transaction_submitted(0, hash, 1).unwrap();
        tracker.complete_step(0, None).unwrap();

        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0][0].progress_state, Some(ProgressState::Pending));
        assert_eq!(updates[1][0].progress_state, Some(ProgressState::Submitted));
        assert_eq!(updates[2][0].status, StepStatus::Complete);
        assert_eq!(updates[2][0].progress_state, Some(ProgressState::Confirmed));
        assert_eq!(
            updates[2][0].tx_hashes,
            vec![StepTxHash {
                tx_hash: hash,
                chain_id: 1
            }]
        );
    }

    #[test]
    fn test_tx_hashes_accumulate() {
        let mut tracker = tracker(None);
        tracker
            .set_transaction_submitted(0, TxHash::repeat_byte(1), 1)
            .unwrap();
        tracker
            .set_transaction_submitted(0, TxHash::repeat_byte(2), 1)
            .unwrap();
        assert_eq!(tracker.steps()[0].tx_hashes.len(), 2);
        assert_eq!(tracker.steps()[0].tx_hashes[1].tx_hash, TxHash::repeat_byte(2));
    }

    #[test]
    fn test_complete_advances_within_bounds() {
        let mut tracker = tracker(None);
        tracker.complete_step(0, None).unwrap();
        assert_eq!(tracker.current_step_index(), 1);

        tracker.complete_step(1, None).unwrap();
        assert_eq!(tracker.current_step_index(), 1);
        assert_eq!(tracker.steps()[1].progress_state, None);
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_fail_keeps_current_step() {
        let mut tracker = tracker(None);
        let cause: ErrorDetails = Arc::new(std::io::Error::other("denied"));
        tracker.fail_step(0, cause).unwrap();

        assert_eq!(tracker.current_step_index(), 0);
        assert_eq!(tracker.steps()[0].status, StepStatus::Error);
        assert_eq!(tracker.steps()[0].error.as_deref(), Some("denied"));
        assert!(tracker.steps()[0].error_data.is_some());
    }

    #[test]
    fn test_terminal_steps_are_frozen() {
        let (on_progress, updates) = recorder();
        let mut tracker = tracker(Some(on_progress));
        tracker.complete_step(0, None).unwrap();

        let err = tracker.update_step(0, StepPatch::pending()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameters);
        assert!(
            tracker
                .fail_step(0, Arc::new(std::io::Error::other("late")))
                .is_err()
        );
        assert_eq!(tracker.steps()[0].status, StepStatus::Complete);
        assert_eq!(updates.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut tracker = tracker(None);
        let err = tracker.complete_step(2, None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameters);
        assert_eq!(err.message(), "Step index out of bounds: 2");
    }

    #[test]
    fn test_step_json() {
        let json = serde_json::to_value(ProgressStep::new(ActionKind::OffChainCancel)).unwrap();
        assert_eq!(json["status"], "incomplete");
        assert_eq!(json["kind"], "signature");
        assert_eq!(json["action"], "offChainCancel");
        assert_eq!(json["description"], "Canceling order (off-chain)");
        assert!(json.get("progressState").is_none());
    }
}
