//! Claims handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, SessionContext};
use domain_claims::{ClaimScope, DefaultScope};

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Submits a new claim
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    let claim = state
        .claims
        .create_claim(&session, request.claim_type, request.payload)
        .await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// Lists claims for a center or a submitter, optionally filtered by `q`
///
/// Without `center_id` or `submitter_id` the caller's own scope is used.
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<ListClaimsQuery>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    query.validate()?;

    let scope = match (query.center_id, query.submitter_id) {
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "center_id and submitter_id are mutually exclusive".to_string(),
            ))
        }
        (Some(center_id), None) => ClaimScope::Center(center_id.into()),
        (None, Some(submitter_id)) => ClaimScope::Submitter(submitter_id.into()),
        (None, None) => match state.claims.default_scope(&session).await? {
            DefaultScope::Scoped(scope) => scope,
            DefaultScope::Unscoped => {
                return Err(ApiError::BadRequest(
                    "center_id or submitter_id is required".to_string(),
                ))
            }
            DefaultScope::Unassigned => return Ok(Json(Vec::new())),
        },
    };

    let claims = state
        .claims
        .list_claims(&session, scope, query.q.as_deref())
        .await?;
    Ok(Json(claims.into_iter().map(ClaimResponse::from).collect()))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.get_claim(&session, ClaimId::from(id)).await?;
    Ok(Json(claim.into()))
}

pub async fn approve_claim(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.approve_claim(&session, ClaimId::from(id)).await?;
    Ok(Json(claim.into()))
}

pub async fn reject_claim(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.reject_claim(&session, ClaimId::from(id)).await?;
    Ok(Json(claim.into()))
}
