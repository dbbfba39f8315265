//! PostgreSQL Claims Adapter
//!
//! Implements `ClaimsPort` over `ClaimsRepository`. Typed claim details are
//! flattened through `ClaimPayload` on the way in and re-validated on the way
//! out, so a row that no longer satisfies the claim invariants is reported
//! instead of being served.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use core_kernel::{ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::{
    Claim, ClaimFilter, ClaimPayload, ClaimTransition, ClaimsPort, StoredClaim, StudentPayload,
    TransitionOutcome,
};

use crate::adapters::tenancy::ping;
use crate::repositories::claims::{
    ClaimRow, ClaimWithStudents, ClaimsRepository,
    SupervisedStudentRow, ThesisType as DbThesisType, TransitionResult, TransportType as DbTransportType,
};

/// PostgreSQL-backed implementation of `ClaimsPort`
#[derive(Debug, Clone)]
pub struct PostgresClaimsAdapter {
    repository: ClaimsRepository,
    pool: PgPool,
}

impl PostgresClaimsAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

impl DomainPort for PostgresClaimsAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClaimsAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-claims-adapter").await
    }
}

#[async_trait]
impl ClaimsPort for PostgresClaimsAdapter {
    #[instrument(skip(self, claim), fields(claim_id = %claim.id(), claim_type = %claim.claim_type()))]
    async fn insert_claim(&self, claim: Claim) -> Result<Claim, PortError> {
        let (row, students) = claim_to_rows(&claim);
        let stored = self.repository.insert(&row, &students).await?;
        debug!(students = stored.students.len(), "Claim stored");
        rows_to_claim(stored)
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        rows_to_claim(self.repository.get(id.into()).await?)
    }

    #[instrument(skip(self, filter), fields(term = ?filter.term))]
    async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, PortError> {
        let rows = self.repository.list(filter).await?;
        debug!(count = rows.len(), "Claims listed");
        rows.into_iter().map(rows_to_claim).collect()
    }

    #[instrument(skip(self, transition), fields(claim_id = %transition.claim_id, target = %transition.target()))]
    async fn transition_claim(&self, transition: &ClaimTransition) -> Result<TransitionOutcome, PortError> {
        let result = self
            .repository
            .transition(
                transition.claim_id.into(),
                transition.center_id.into(),
                transition.target().into(),
                transition.processed_by.into(),
                transition.processed_at,
            )
            .await?;

        match result {
            TransitionResult::Updated(row) => {
                let students = self.repository.get(row.id).await?.students;
                Ok(TransitionOutcome::Applied(rows_to_claim(ClaimWithStudents { claim: row, students })?))
            }
            TransitionResult::NotPending(status) => {
                warn!(status = ?status, "Conditional update lost");
                Ok(TransitionOutcome::AlreadyProcessed(status.into()))
            }
            TransitionResult::Missing => Ok(TransitionOutcome::Missing),
        }
    }
}

fn claim_to_rows(claim: &Claim) -> (ClaimRow, Vec<SupervisedStudentRow>) {
    let flat = ClaimPayload::from(claim.details());
    let row = ClaimRow {
        id: claim.id().into(),
        claim_type: claim.claim_type().into(),
        status: claim.status().into(),
        submitted_at: claim.submitted_at(),
        submitted_by: claim.submitted_by().into(),
        center_id: claim.center_id().into(),
        processed_by: claim.processed_by().map(Into::into),
        processed_at: claim.processed_at(),
        date: flat.date,
        start_time: flat.start_time,
        end_time: flat.end_time,
        transport_type: flat.transport_type.map(DbTransportType::from),
        origin: flat.origin,
        destination: flat.destination,
        amount: flat.amount,
        registration_number: flat.registration_number,
        cubic_capacity: flat.cubic_capacity,
        thesis_type: flat.thesis_type.map(DbThesisType::from),
        course_code: flat.course_code,
        exam_date: flat.exam_date,
        supervision_rank: flat.supervision_rank,
    };

    let students = claim
        .supervised_students()
        .into_iter()
        .map(|s| SupervisedStudentRow {
            id: s.id.into(),
            claim_id: s.claim_id.into(),
            supervisor_id: s.supervisor_id.into(),
            student_name: s.student_name,
            thesis_title: s.thesis_title,
        })
        .collect();

    (row, students)
}

fn rows_to_claim(stored: ClaimWithStudents) -> Result<Claim, PortError> {
    let ClaimWithStudents { claim: row, students } = stored;

    let student_supervisors = students.iter().map(|s| s.supervisor_id.into()).collect();
    let flat = ClaimPayload {
        date: row.date,
        start_time: row.start_time,
        end_time: row.end_time,
        transport_type: row.transport_type.map(Into::into),
        origin: row.origin,
        destination: row.destination,
        amount: row.amount,
        registration_number: row.registration_number,
        cubic_capacity: row.cubic_capacity,
        thesis_type: row.thesis_type.map(Into::into),
        course_code: row.course_code,
        exam_date: row.exam_date,
        supervision_rank: row.supervision_rank,
        students: students
            .into_iter()
            .map(|s| StudentPayload {
                id: Some(s.id.into()),
                student_name: Some(s.student_name),
                thesis_title: Some(s.thesis_title),
            })
            .collect(),
    };

    let details = flat
        .into_details(row.claim_type.into())
        .map_err(|e| PortError::internal(format!("stored claim {} is malformed: {}", row.id, e)))?;

    Claim::restore(StoredClaim {
        id: row.id.into(),
        status: row.status.into(),
        submitted_at: row.submitted_at,
        submitted_by: row.submitted_by.into(),
        center_id: row.center_id.into(),
        processed_by: row.processed_by.map(Into::into),
        processed_at: row.processed_at,
        details,
        student_supervisors,
    })
    .map_err(|e| PortError::internal(e.to_string()))
}
