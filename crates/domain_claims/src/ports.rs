//! Claims Ports
//!
//! Implementations:
//!
//! - **PostgreSQL adapter** (`infra_db::adapters::PostgresClaimsAdapter`)
//! - **In-memory adapter** (`test_utils::MemoryStore`)

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, PortError};

use crate::claim::Claim;
use crate::lifecycle::{ClaimTransition, TransitionOutcome};
use crate::search::ClaimFilter;

#[async_trait]
pub trait ClaimsPort: DomainPort {
    /// Stores a claim together with its supervised students, all or nothing
    async fn insert_claim(&self, claim: Claim) -> Result<Claim, PortError>;

    /// Retrieves a claim or `PortError::NotFound`
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Lists claims matching a filter, newest first
    async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, PortError>;

    /// Applies a transition only if the claim is still pending in the
    /// transition's center, in a single write
    async fn transition_claim(
        &self,
        transition: &ClaimTransition,
    ) -> Result<TransitionOutcome, PortError>;
}
