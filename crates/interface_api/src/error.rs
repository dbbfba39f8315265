//! API error handling
//!
//! Every domain error maps to one status code and a `{error, message, details?}`
//! body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use core_kernel::{NoSession, PortError};
use domain_claims::ClaimError;
use domain_tenancy::TenancyError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(NoSession),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid claim payload: {message}")]
    InvalidPayload { message: String, details: Vec<String> },

    #[error("Validation error: {message}")]
    Validation { message: String, details: Vec<String> },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidPayload { .. } | ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthenticated(reason) => ("unauthenticated", reason.to_string(), None),
            ApiError::Forbidden(msg) => ("unauthorized", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::InvalidPayload { message, details } => ("invalid_claim_payload", message, Some(details)),
            ApiError::Validation { message, details } => ("validation_error", message, Some(details)),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                ("internal_error", "Internal server error".to_string(), None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<NoSession> for ApiError {
    fn from(reason: NoSession) -> Self {
        ApiError::Unauthenticated(reason)
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => ApiError::NotFound(format!("{} {}", entity_type, id)),
            PortError::Conflict { message, .. } => ApiError::Conflict(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Unauthorized(msg) => ApiError::Forbidden(msg),
            ClaimError::NotFound(msg) => ApiError::NotFound(msg),
            ClaimError::InvalidClaimPayload(ref violations) => ApiError::InvalidPayload {
                message: err.to_string(),
                details: violations.iter().map(ToString::to_string).collect(),
            },
            ClaimError::AlreadyProcessed { .. } => ApiError::Conflict(err.to_string()),
            ClaimError::InconsistentState(msg) => ApiError::Internal(msg),
            ClaimError::Port(port) => port.into(),
        }
    }
}

impl From<TenancyError> for ApiError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::Unauthorized(msg) => ApiError::Forbidden(msg),
            TenancyError::NotFound(msg) => ApiError::NotFound(msg),
            TenancyError::AlreadyAssigned(_) | TenancyError::DuplicateName(_) | TenancyError::NotAssigned(_) => {
                ApiError::Conflict(err.to_string())
            }
            TenancyError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            TenancyError::Port(port) => port.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        ApiError::Validation {
            message: "request validation failed".to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::ClaimId;
    use domain_claims::{ClaimStatus, PayloadViolation};

    #[test]
    fn test_claim_error_status_mapping() {
        let cases = [
            (ClaimError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (ClaimError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ClaimError::InvalidClaimPayload(vec![PayloadViolation::Forbidden("registration_number")]),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ClaimError::AlreadyProcessed { claim_id: ClaimId::new(), status: ClaimStatus::Approved },
                StatusCode::CONFLICT,
            ),
            (ClaimError::Port(PortError::connection("down")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_tenancy_error_status_mapping() {
        let cases = [
            (TenancyError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (TenancyError::AlreadyAssigned("x".into()), StatusCode::CONFLICT),
            (TenancyError::DuplicateName("x".into()), StatusCode::CONFLICT),
            (TenancyError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_payload_violations_become_details() {
        let err = ApiError::from(ClaimError::InvalidClaimPayload(vec![
            PayloadViolation::Missing("origin"),
            PayloadViolation::Forbidden("course_code"),
        ]));
        match err {
            ApiError::InvalidPayload { details, .. } => {
                assert_eq!(details, vec!["origin is required", "course_code is not allowed here"]);
            }
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_no_session_is_401() {
        assert_eq!(ApiError::from(NoSession::Expired).status(), StatusCode::UNAUTHORIZED);
    }
}
