//! Claim lifecycle state machine
//!
//! A claim moves from `Pending` to `Approved` or `Rejected` exactly once.
//! Stores apply a [`ClaimTransition`] as a single conditional write (status,
//! processor and timestamp together, guarded on the current status and the
//! expected center) so that of two concurrent attempts only one can win.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CenterId, ClaimId, UserId};

use crate::claim::{Claim, ClaimStatus, Processing};
use crate::error::ClaimError;

/// A coordinator's decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Status the claim ends up in
    pub fn target(&self) -> ClaimStatus {
        match self {
            Decision::Approve => ClaimStatus::Approved,
            Decision::Reject => ClaimStatus::Rejected,
        }
    }
}

/// A requested transition, conditioned on the claim still being pending in
/// `center_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTransition {
    pub claim_id: ClaimId,
    pub center_id: CenterId,
    pub decision: Decision,
    pub processed_by: UserId,
    pub processed_at: DateTime<Utc>,
}

impl ClaimTransition {
    pub fn new(claim: &Claim, decision: Decision, processed_by: UserId, processed_at: DateTime<Utc>) -> Self {
        Self {
            claim_id: claim.id(),
            center_id: claim.center_id(),
            decision,
            processed_by,
            processed_at,
        }
    }

    pub fn target(&self) -> ClaimStatus {
        self.decision.target()
    }
}

/// What a store observed when applying a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The write happened; the updated claim
    Applied(Claim),
    /// The claim was no longer pending; nothing was written
    AlreadyProcessed(ClaimStatus),
    /// No claim with that id in the expected center
    Missing,
}

impl Claim {
    /// Applies a transition to the in-memory aggregate
    ///
    /// Leaves the claim untouched on failure.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the transition targets another claim or center
    /// * `AlreadyProcessed` if the claim is in a terminal state
    pub fn apply(&mut self, transition: &ClaimTransition) -> Result<(), ClaimError> {
        if transition.claim_id != self.id() || transition.center_id != self.center_id() {
            return Err(ClaimError::NotFound(format!("claim {}", transition.claim_id)));
        }
        if !self.status().can_transition_to(transition.target()) {
            return Err(ClaimError::AlreadyProcessed {
                claim_id: self.id(),
                status: self.status(),
            });
        }

        self.record_decision(
            transition.target(),
            Processing {
                by: transition.processed_by,
                at: transition.processed_at,
            },
        );
        Ok(())
    }
}
