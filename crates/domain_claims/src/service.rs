//! Claims application service
//!
//! Resolves ownership chains through the tenant port and passes every
//! operation through the shared authorization guard. Submitter and center
//! are always taken from the session and the stored user record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{authorize, authorize_role, Action, ClaimId, OwnerChain, Role, SessionContext};
use domain_tenancy::TenantPort;

use crate::claim::{Claim, ClaimType};
use crate::error::ClaimError;
use crate::lifecycle::{ClaimTransition, Decision, TransitionOutcome};
use crate::payload::ClaimPayload;
use crate::ports::ClaimsPort;
use crate::search::{ClaimFilter, ClaimScope, DefaultScope, TenantScope};

/// Service for claim submission, review and search
#[derive(Clone)]
pub struct ClaimsService {
    claims: Arc<dyn ClaimsPort>,
    tenancy: Arc<dyn TenantPort>,
}

impl ClaimsService {
    pub fn new(claims: Arc<dyn ClaimsPort>, tenancy: Arc<dyn TenantPort>) -> Self {
        Self { claims, tenancy }
    }

    /// Submits a claim for the calling lecturer
    ///
    /// # Errors
    ///
    /// * `Unauthorized` if the caller is not a lecturer or has no center
    /// * `InvalidClaimPayload` listing every problem with the payload
    #[instrument(skip(self, session, payload), fields(actor = %session.user_id, claim_type = %claim_type))]
    pub async fn create_claim(
        &self,
        session: &SessionContext,
        claim_type: ClaimType,
        payload: ClaimPayload,
    ) -> Result<Claim, ClaimError> {
        authorize_role(session, Action::Submit)?;

        let me = self.tenancy.get_user(session.user_id).await?;
        let chain = match me.center_id {
            Some(center_id) => self.tenancy.get_center(center_id).await?.owner_chain().owned_by(me.id),
            None => OwnerChain::unassigned_owner(me.id),
        };
        authorize(session, Action::Submit, &chain)?;
        let center_id = chain
            .center_id
            .ok_or_else(|| ClaimError::Unauthorized(format!("lecturer {} is not assigned to a center", me.id)))?;

        let details = payload.into_details(claim_type).map_err(|e| {
            warn!(violations = e.violations().len(), "Rejected claim payload");
            e
        })?;

        let claim = Claim::submit(me.id, center_id, details, Utc::now());
        let claim = self.claims.insert_claim(claim).await?;

        info!(claim_id = %claim.id(), center = %claim.center_id(), "Claim submitted");
        Ok(claim)
    }

    /// Retrieves a claim the caller may see
    #[instrument(skip(self, session), fields(actor = %session.user_id, claim = %claim_id))]
    pub async fn get_claim(
        &self,
        session: &SessionContext,
        claim_id: ClaimId,
    ) -> Result<Claim, ClaimError> {
        let claim = self.claims.get_claim(claim_id).await?;
        let chain = self.claim_chain(&claim).await?;
        authorize(session, Action::Read, &chain)?;
        Ok(claim)
    }

    /// Lists claims inside a scope, optionally narrowed by a free-text query
    ///
    /// # Errors
    ///
    /// * `Unauthorized` when a lecturer asks for a center listing
    /// * `NotFound` when the scope lies outside the caller's tenant
    #[instrument(skip(self, session, query), fields(actor = %session.user_id, scope = ?scope))]
    pub async fn list_claims(
        &self,
        session: &SessionContext,
        scope: ClaimScope,
        query: Option<&str>,
    ) -> Result<Vec<Claim>, ClaimError> {
        let scope = self.resolve_scope(session, scope).await?;
        let filter = ClaimFilter::new(scope, query);
        debug!(term = ?filter.term, "Listing claims");
        Ok(self.claims.list_claims(&filter).await?)
    }

    /// Scope used when the caller names none
    ///
    /// Lecturers see their own claims and coordinators their center's.
    /// Registry has no implicit scope, and a coordinator without a center
    /// is reported as [`DefaultScope::Unassigned`].
    pub async fn default_scope(&self, session: &SessionContext) -> Result<DefaultScope, ClaimError> {
        match session.role {
            Role::Registry => Ok(DefaultScope::Unscoped),
            Role::Lecturer => Ok(DefaultScope::Scoped(ClaimScope::Submitter(session.user_id))),
            Role::Coordinator => match self.tenancy.find_center_by_coordinator(session.user_id).await? {
                Some(center) => Ok(DefaultScope::Scoped(ClaimScope::Center(center.id))),
                None => Ok(DefaultScope::Unassigned),
            },
        }
    }

    /// Approves a pending claim in the caller's center
    pub async fn approve_claim(
        &self,
        session: &SessionContext,
        claim_id: ClaimId,
    ) -> Result<Claim, ClaimError> {
        self.decide(session, claim_id, Decision::Approve).await
    }

    /// Rejects a pending claim in the caller's center
    pub async fn reject_claim(
        &self,
        session: &SessionContext,
        claim_id: ClaimId,
    ) -> Result<Claim, ClaimError> {
        self.decide(session, claim_id, Decision::Reject).await
    }

    #[instrument(skip(self, session), fields(actor = %session.user_id, claim = %claim_id))]
    async fn decide(
        &self,
        session: &SessionContext,
        claim_id: ClaimId,
        decision: Decision,
    ) -> Result<Claim, ClaimError> {
        authorize_role(session, Action::Process)?;

        let claim = self.claims.get_claim(claim_id).await?;
        let center = self.tenancy.get_center(claim.center_id()).await?;
        authorize(session, Action::Process, &center.owner_chain())?;

        let transition = ClaimTransition::new(&claim, decision, session.user_id, Utc::now());
        match self.claims.transition_claim(&transition).await? {
            TransitionOutcome::Applied(updated) => {
                info!(status = %updated.status(), "Claim processed");
                Ok(updated)
            }
            TransitionOutcome::AlreadyProcessed(status) => {
                warn!(status = %status, "Claim was already processed");
                Err(ClaimError::AlreadyProcessed { claim_id, status })
            }
            TransitionOutcome::Missing => Err(ClaimError::claim_not_found(claim_id)),
        }
    }

    async fn claim_chain(&self, claim: &Claim) -> Result<OwnerChain, ClaimError> {
        let center = self.tenancy.get_center(claim.center_id()).await?;
        Ok(center.owner_chain().owned_by(claim.submitted_by()))
    }

    /// Turns a requested scope into one the caller is entitled to
    async fn resolve_scope(
        &self,
        session: &SessionContext,
        scope: ClaimScope,
    ) -> Result<TenantScope, ClaimError> {
        match scope {
            ClaimScope::Center(center_id) => {
                authorize_role(session, Action::Manage)?;
                let center = self.tenancy.get_center(center_id).await?;
                authorize(session, Action::Manage, &center.owner_chain())?;
                Ok(TenantScope::center(center.id))
            }
            ClaimScope::Submitter(submitter_id) => {
                if session.role == Role::Lecturer {
                    authorize(session, Action::Read, &OwnerChain::unscoped().owned_by(submitter_id))?;
                    return Ok(TenantScope::submitter(submitter_id));
                }

                let submitter = self.tenancy.get_user(submitter_id).await?;
                let center = match submitter.center_id {
                    Some(center_id) => Some(self.tenancy.get_center(center_id).await?),
                    None => None,
                };
                let chain = match &center {
                    Some(center) => center.owner_chain().owned_by(submitter.id),
                    None => OwnerChain::unassigned_owner(submitter.id),
                };
                authorize(session, Action::Read, &chain)?;

                Ok(match (session.role, center) {
                    (Role::Coordinator, Some(center)) => TenantScope::center_submitter(center.id, submitter.id),
                    _ => TenantScope::submitter(submitter.id),
                })
            }
        }
    }
}
