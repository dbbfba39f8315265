//! Custom Test Assertions
//!
//! Assertion helpers that print the unexpected value on failure.

use std::fmt::Debug;

use domain_claims::{Claim, ClaimError, ClaimStatus};
use domain_tenancy::TenancyError;

/// Asserts that processing fields agree with the status
pub fn assert_processing_consistent(claim: &Claim) {
    let pending = claim.status() == ClaimStatus::Pending;
    assert_eq!(
        claim.processed_by().is_none(),
        pending,
        "processed_by={:?} with status {}",
        claim.processed_by(),
        claim.status()
    );
    assert_eq!(
        claim.processed_at().is_none(),
        pending,
        "processed_at={:?} with status {}",
        claim.processed_at(),
        claim.status()
    );
}

/// Asserts that every claim has `status`
pub fn assert_all_status(claims: &[Claim], status: ClaimStatus) {
    for claim in claims {
        assert_eq!(claim.status(), status, "claim {} has status {}", claim.id(), claim.status());
    }
}

pub fn assert_claim_unauthorized<T: Debug>(result: Result<T, ClaimError>) {
    match result {
        Err(ClaimError::Unauthorized(_)) => {}
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

pub fn assert_claim_not_found<T: Debug>(result: Result<T, ClaimError>) {
    match result {
        Err(ClaimError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

pub fn assert_already_processed<T: Debug>(result: Result<T, ClaimError>) {
    match result {
        Err(ClaimError::AlreadyProcessed { .. }) => {}
        other => panic!("expected AlreadyProcessed, got {:?}", other),
    }
}

/// Asserts an `InvalidClaimPayload` naming every field in `fields`
pub fn assert_invalid_payload<T: Debug>(result: Result<T, ClaimError>, fields: &[&str]) {
    match result {
        Err(ClaimError::InvalidClaimPayload(violations)) => {
            for field in fields {
                assert!(
                    violations.iter().any(|v| v.field() == *field),
                    "no violation for '{}' in {:?}",
                    field,
                    violations
                );
            }
        }
        other => panic!("expected InvalidClaimPayload, got {:?}", other),
    }
}

pub fn assert_tenancy_unauthorized<T: Debug>(result: Result<T, TenancyError>) {
    match result {
        Err(TenancyError::Unauthorized(_)) => {}
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

pub fn assert_tenancy_not_found<T: Debug>(result: Result<T, TenancyError>) {
    match result {
        Err(TenancyError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}
