//! Claims domain errors

use thiserror::Error;

use core_kernel::{AccessDenied, ClaimId, PortError};
use domain_tenancy::TenancyError;

use crate::claim::ClaimStatus;
use crate::payload::PayloadViolation;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid claim payload: {}", join_violations(.0))]
    InvalidClaimPayload(Vec<PayloadViolation>),

    #[error("Claim {claim_id} is already {status}")]
    AlreadyProcessed { claim_id: ClaimId, status: ClaimStatus },

    #[error("Inconsistent stored claim: {0}")]
    InconsistentState(String),

    #[error(transparent)]
    Port(PortError),
}

fn join_violations(violations: &[PayloadViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ClaimError {
    pub fn claim_not_found(id: ClaimId) -> Self {
        ClaimError::NotFound(format!("claim {}", id))
    }

    /// Violations carried by an `InvalidClaimPayload`, empty otherwise
    pub fn violations(&self) -> &[PayloadViolation] {
        match self {
            ClaimError::InvalidClaimPayload(v) => v,
            _ => &[],
        }
    }
}

impl From<AccessDenied> for ClaimError {
    fn from(denied: AccessDenied) -> Self {
        if denied.hides_existence() {
            ClaimError::NotFound("resource not found".to_string())
        } else {
            ClaimError::Unauthorized(denied.to_string())
        }
    }
}

impl From<PortError> for ClaimError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => ClaimError::NotFound(format!("{} {}", entity_type, id)),
            other => ClaimError::Port(other),
        }
    }
}

impl From<TenancyError> for ClaimError {
    fn from(error: TenancyError) -> Self {
        match error {
            TenancyError::Unauthorized(m) => ClaimError::Unauthorized(m),
            TenancyError::NotFound(m) => ClaimError::NotFound(m),
            TenancyError::Port(e) => ClaimError::Port(e),
            other => ClaimError::Port(PortError::internal(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Action, Role};

    #[test]
    fn test_ownership_denial_reads_as_not_found() {
        assert!(matches!(ClaimError::from(AccessDenied::Ownership), ClaimError::NotFound(_)));
        let role = AccessDenied::Role { role: Role::Lecturer, action: Action::Process };
        assert!(matches!(ClaimError::from(role), ClaimError::Unauthorized(_)));
    }

    #[test]
    fn test_payload_message_lists_every_violation() {
        let err = ClaimError::InvalidClaimPayload(vec![
            PayloadViolation::Missing("date"),
            PayloadViolation::Forbidden("amount"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("date"));
        assert!(msg.contains("; "));
        assert!(msg.contains("amount"));
        assert_eq!(err.violations().len(), 2);
    }
}
