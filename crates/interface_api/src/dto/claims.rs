//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CenterId, ClaimId, UserId};
use domain_claims::{Claim, ClaimDetails, ClaimPayload, ClaimStatus, ClaimType};

/// Body of `POST /claims`: the claim type plus the flat payload fields
#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub claim_type: ClaimType,
    #[serde(flatten)]
    pub payload: ClaimPayload,
}

/// Query string of `GET /claims`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListClaimsQuery {
    pub center_id: Option<Uuid>,
    pub submitter_id: Option<Uuid>,
    /// Free-text, status or type query
    #[validate(length(max = 512))]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: ClaimId,
    pub status: ClaimStatus,
    pub center_id: CenterId,
    pub submitted_by: UserId,
    pub submitted_at: DateTime<Utc>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
    /// Teaching claims only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_hours: Option<Decimal>,
    #[serde(flatten)]
    pub details: ClaimDetails,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        let contact_hours = match claim.details() {
            ClaimDetails::Teaching(teaching) => Some(teaching.contact_hours()),
            _ => None,
        };
        Self {
            id: claim.id(),
            status: claim.status(),
            center_id: claim.center_id(),
            submitted_by: claim.submitted_by(),
            submitted_at: claim.submitted_at(),
            processed_by: claim.processed_by(),
            processed_at: claim.processed_at(),
            contact_hours,
            details: claim.details().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_reads_flat_fields() {
        let body = serde_json::json!({
            "claim_type": "transportation",
            "transport_type": "private",
            "origin": "Main Campus",
            "destination": "Nakuru",
            "amount": "1200.50",
            "registration_number": "KDA 123X",
            "cubic_capacity": 1600
        });
        let request: CreateClaimRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.claim_type, ClaimType::Transportation);
        assert_eq!(request.payload.cubic_capacity, Some(1600));
        assert!(request.payload.students.is_empty());
        assert!(request.payload.into_details(request.claim_type).is_ok());
    }

    #[test]
    fn test_query_length_is_bounded() {
        let query = ListClaimsQuery { q: Some("x".repeat(600)), ..ListClaimsQuery::default() };
        assert!(query.validate().is_err());
    }
}
