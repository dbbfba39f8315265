//! Claims repository implementation
//!
//! Claims are stored flat: one nullable column per type-specific field.
//! Supervised students live in their own table, written in the same
//! transaction as the parent claim.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use domain_claims::{ClaimFilter, SearchTerm, TextField};

use crate::error::DatabaseError;

/// Claim type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_type", rename_all = "snake_case")]
pub enum ClaimType {
    Teaching,
    Transportation,
    ThesisProject,
}

/// Claim status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

/// Transport type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "transport_type", rename_all = "snake_case")]
pub enum TransportType {
    Public,
    Private,
}

/// Thesis type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "thesis_type", rename_all = "snake_case")]
pub enum ThesisType {
    Examination,
    Supervision,
}

/// Database row for claim
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub id: Uuid,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: Uuid,
    pub center_id: Uuid,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub transport_type: Option<TransportType>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub amount: Option<Decimal>,
    pub registration_number: Option<String>,
    pub cubic_capacity: Option<i32>,
    pub thesis_type: Option<ThesisType>,
    pub course_code: Option<String>,
    pub exam_date: Option<NaiveDate>,
    pub supervision_rank: Option<String>,
}

/// Database row for a supervised student
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SupervisedStudentRow {
    pub id: Uuid,
    pub claim_id: Uuid,
    pub supervisor_id: Uuid,
    pub student_name: String,
    pub thesis_title: String,
}

/// A claim row together with its student rows
#[derive(Debug, Clone)]
pub struct ClaimWithStudents {
    pub claim: ClaimRow,
    pub students: Vec<SupervisedStudentRow>,
}

/// Result of a conditional status update
#[derive(Debug, Clone)]
pub enum TransitionResult {
    Updated(ClaimRow),
    /// The claim exists in the center but is no longer pending
    NotPending(ClaimStatus),
    Missing,
}

const CLAIM_COLUMNS: &str = "id, claim_type, status, submitted_at, submitted_by, center_id, \
    processed_by, processed_at, date, start_time, end_time, transport_type, origin, destination, \
    amount, registration_number, cubic_capacity, thesis_type, course_code, exam_date, supervision_rank";

const STUDENT_COLUMNS: &str = "id, claim_id, supervisor_id, student_name, thesis_title";

/// Escapes `LIKE` wildcards so user text only ever matches literally
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Appends the `WHERE` clause for a filter
///
/// The tenant scope is always rendered; an unmatchable term becomes `FALSE`.
pub fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ClaimFilter) {
    builder.push(" WHERE TRUE");

    if let Some(center_id) = filter.scope.center_id() {
        builder.push(" AND center_id = ").push_bind(Uuid::from(center_id));
    }
    if let Some(submitter_id) = filter.scope.submitter_id() {
        builder.push(" AND submitted_by = ").push_bind(Uuid::from(submitter_id));
    }

    match &filter.term {
        SearchTerm::Any => {}
        SearchTerm::Nothing => {
            builder.push(" AND FALSE");
        }
        SearchTerm::Type(claim_type) => {
            builder.push(" AND claim_type = ").push_bind(ClaimType::from(*claim_type));
        }
        SearchTerm::Status(status) => {
            builder.push(" AND status = ").push_bind(ClaimStatus::from(*status));
        }
        SearchTerm::Text(text) => {
            let pattern = like_pattern(text);
            builder.push(" AND (");
            for (i, field) in TextField::ALL.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                match field {
                    TextField::SubmitterName => builder
                        .push("EXISTS (SELECT 1 FROM users u WHERE u.id = claims.submitted_by AND u.name ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\')"),
                    TextField::SubmitterEmail => builder
                        .push("EXISTS (SELECT 1 FROM users u WHERE u.id = claims.submitted_by AND u.email ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\')"),
                    TextField::Destination => builder
                        .push("destination ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\'"),
                    TextField::CourseCode => builder
                        .push("course_code ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\'"),
                };
            }
            builder.push(")");
        }
    }
}

/// Repository for managing claims data
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a claim and its students atomically
    pub async fn insert(&self, claim: &ClaimRow, students: &[SupervisedStudentRow]) -> Result<ClaimWithStudents, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO claims ({CLAIM_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21) \
             RETURNING {CLAIM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim.id)
            .bind(claim.claim_type)
            .bind(claim.status)
            .bind(claim.submitted_at)
            .bind(claim.submitted_by)
            .bind(claim.center_id)
            .bind(claim.processed_by)
            .bind(claim.processed_at)
            .bind(claim.date)
            .bind(claim.start_time)
            .bind(claim.end_time)
            .bind(claim.transport_type)
            .bind(&claim.origin)
            .bind(&claim.destination)
            .bind(claim.amount)
            .bind(&claim.registration_number)
            .bind(claim.cubic_capacity)
            .bind(claim.thesis_type)
            .bind(&claim.course_code)
            .bind(claim.exam_date)
            .bind(&claim.supervision_rank)
            .fetch_one(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(students.len());
        let sql = format!(
            "INSERT INTO supervised_students ({STUDENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {STUDENT_COLUMNS}"
        );
        for student in students {
            let student = sqlx::query_as::<_, SupervisedStudentRow>(&sql)
                .bind(student.id)
                .bind(student.claim_id)
                .bind(student.supervisor_id)
                .bind(&student.student_name)
                .bind(&student.thesis_title)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(student);
        }

        tx.commit().await?;
        Ok(ClaimWithStudents { claim: row, students: stored })
    }

    pub async fn get(&self, id: Uuid) -> Result<ClaimWithStudents, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1");
        let claim = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", id))?;

        let students = self.students_for(&[id]).await?;
        Ok(ClaimWithStudents { claim, students })
    }

    /// Lists claims matching a filter, newest first
    pub async fn list(&self, filter: &ClaimFilter) -> Result<Vec<ClaimWithStudents>, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {CLAIM_COLUMNS} FROM claims"));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY submitted_at DESC, id DESC");

        let claims: Vec<ClaimRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let ids: Vec<Uuid> = claims.iter().map(|c| c.id).collect();

        let mut by_claim: HashMap<Uuid, Vec<SupervisedStudentRow>> = HashMap::new();
        for student in self.students_for(&ids).await? {
            by_claim.entry(student.claim_id).or_default().push(student);
        }

        Ok(claims
            .into_iter()
            .map(|claim| {
                let students = by_claim.remove(&claim.id).unwrap_or_default();
                ClaimWithStudents { claim, students }
            })
            .collect())
    }

    async fn students_for(&self, claim_ids: &[Uuid]) -> Result<Vec<SupervisedStudentRow>, DatabaseError> {
        if claim_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM supervised_students WHERE claim_id = ANY($1) ORDER BY student_name, id"
        );
        Ok(sqlx::query_as::<_, SupervisedStudentRow>(&sql)
            .bind(claim_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Moves a pending claim in `center_id` to `status` in one statement
    pub async fn transition(
        &self,
        id: Uuid,
        center_id: Uuid,
        status: ClaimStatus,
        processed_by: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<TransitionResult, DatabaseError> {
        let sql = format!(
            "UPDATE claims SET status = $3, processed_by = $4, processed_at = $5 \
             WHERE id = $1 AND center_id = $2 AND status = 'pending' \
             RETURNING {CLAIM_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id)
            .bind(center_id)
            .bind(status)
            .bind(processed_by)
            .bind(processed_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = updated {
            return Ok(TransitionResult::Updated(row));
        }

        let current: Option<ClaimStatus> =
            sqlx::query_scalar("SELECT status FROM claims WHERE id = $1 AND center_id = $2")
                .bind(id)
                .bind(center_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match current {
            Some(status) => TransitionResult::NotPending(status),
            None => TransitionResult::Missing,
        })
    }
}

impl From<domain_claims::ClaimType> for ClaimType {
    fn from(value: domain_claims::ClaimType) -> Self {
        match value {
            domain_claims::ClaimType::Teaching => ClaimType::Teaching,
            domain_claims::ClaimType::Transportation => ClaimType::Transportation,
            domain_claims::ClaimType::ThesisProject => ClaimType::ThesisProject,
        }
    }
}

impl From<ClaimType> for domain_claims::ClaimType {
    fn from(value: ClaimType) -> Self {
        match value {
            ClaimType::Teaching => domain_claims::ClaimType::Teaching,
            ClaimType::Transportation => domain_claims::ClaimType::Transportation,
            ClaimType::ThesisProject => domain_claims::ClaimType::ThesisProject,
        }
    }
}

impl From<domain_claims::ClaimStatus> for ClaimStatus {
    fn from(value: domain_claims::ClaimStatus) -> Self {
        match value {
            domain_claims::ClaimStatus::Pending => ClaimStatus::Pending,
            domain_claims::ClaimStatus::Approved => ClaimStatus::Approved,
            domain_claims::ClaimStatus::Rejected => ClaimStatus::Rejected,
        }
    }
}

impl From<ClaimStatus> for domain_claims::ClaimStatus {
    fn from(value: ClaimStatus) -> Self {
        match value {
            ClaimStatus::Pending => domain_claims::ClaimStatus::Pending,
            ClaimStatus::Approved => domain_claims::ClaimStatus::Approved,
            ClaimStatus::Rejected => domain_claims::ClaimStatus::Rejected,
        }
    }
}

impl From<domain_claims::TransportType> for TransportType {
    fn from(value: domain_claims::TransportType) -> Self {
        match value {
            domain_claims::TransportType::Public => TransportType::Public,
            domain_claims::TransportType::Private => TransportType::Private,
        }
    }
}

impl From<TransportType> for domain_claims::TransportType {
    fn from(value: TransportType) -> Self {
        match value {
            TransportType::Public => domain_claims::TransportType::Public,
            TransportType::Private => domain_claims::TransportType::Private,
        }
    }
}

impl From<domain_claims::ThesisType> for ThesisType {
    fn from(value: domain_claims::ThesisType) -> Self {
        match value {
            domain_claims::ThesisType::Examination => ThesisType::Examination,
            domain_claims::ThesisType::Supervision => ThesisType::Supervision,
        }
    }
}

impl From<ThesisType> for domain_claims::ThesisType {
    fn from(value: ThesisType) -> Self {
        match value {
            ThesisType::Examination => domain_claims::ThesisType::Examination,
            ThesisType::Supervision => domain_claims::ThesisType::Supervision,
        }
    }
}
