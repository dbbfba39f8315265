//! Claim aggregate

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CenterId, ClaimId, SupervisedStudentId, UserId};
use crate::error::ClaimError;

/// Kind of claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Teaching,
    Transportation,
    ThesisProject,
}

impl ClaimType {
    pub const ALL: [ClaimType; 3] = [ClaimType::Teaching, ClaimType::Transportation, ClaimType::ThesisProject];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Teaching => "teaching",
            ClaimType::Transportation => "transportation",
            ClaimType::ThesisProject => "thesis_project",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimType {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ClaimError::InconsistentState(format!("unknown claim type '{}'", s)))
    }
}

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Submitted, awaiting the coordinator
    Pending,
    /// Approved by the coordinator (terminal)
    Approved,
    /// Rejected by the coordinator (terminal)
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 3] = [ClaimStatus::Pending, ClaimStatus::Approved, ClaimStatus::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClaimStatus::Pending)
    }

    /// Checks if transition is valid
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!((self, target), (Pending, Approved) | (Pending, Rejected))
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public or private transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    Public,
    Private,
}

/// Thesis/project sub-type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThesisType {
    Examination,
    Supervision,
}

/// Teaching session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingDetails {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TeachingDetails {
    /// Contact hours between start and end, to two decimal places
    pub fn contact_hours(&self) -> Decimal {
        let minutes = (self.end_time - self.start_time).num_minutes();
        (Decimal::from(minutes) / Decimal::from(60)).round_dp(2)
    }
}

/// How the journey was made; private vehicles carry their registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport_type", rename_all = "snake_case")]
pub enum TransportMode {
    Public,
    Private {
        registration_number: String,
        cubic_capacity: u32,
    },
}

impl TransportMode {
    pub fn transport_type(&self) -> TransportType {
        match self {
            TransportMode::Public => TransportType::Public,
            TransportMode::Private { .. } => TransportType::Private,
        }
    }
}

/// Transportation expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportationDetails {
    pub mode: TransportMode,
    pub origin: String,
    pub destination: String,
    pub amount: Decimal,
}

/// A supervised student as held inside the claim aggregate
///
/// The claim and supervisor references are implied by the owning claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEntry {
    pub id: SupervisedStudentId,
    pub student_name: String,
    pub thesis_title: String,
}

impl StudentEntry {
    pub fn new(student_name: impl Into<String>, thesis_title: impl Into<String>) -> Self {
        Self {
            id: SupervisedStudentId::new(),
            student_name: student_name.into(),
            thesis_title: thesis_title.into(),
        }
    }
}

/// A supervised student record as stored, with both back references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisedStudent {
    pub id: SupervisedStudentId,
    pub claim_id: ClaimId,
    pub supervisor_id: UserId,
    pub student_name: String,
    pub thesis_title: String,
}

/// Thesis or project work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "thesis_type", rename_all = "snake_case")]
pub enum ThesisDetails {
    Examination {
        course_code: String,
        exam_date: NaiveDate,
    },
    Supervision {
        supervision_rank: String,
        students: Vec<StudentEntry>,
    },
}

impl ThesisDetails {
    pub fn thesis_type(&self) -> ThesisType {
        match self {
            ThesisDetails::Examination { .. } => ThesisType::Examination,
            ThesisDetails::Supervision { .. } => ThesisType::Supervision,
        }
    }
}

/// The type-specific part of a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "claim_type", rename_all = "snake_case")]
pub enum ClaimDetails {
    Teaching(TeachingDetails),
    Transportation(TransportationDetails),
    ThesisProject(ThesisDetails),
}

impl ClaimDetails {
    pub fn claim_type(&self) -> ClaimType {
        match self {
            ClaimDetails::Teaching(_) => ClaimType::Teaching,
            ClaimDetails::Transportation(_) => ClaimType::Transportation,
            ClaimDetails::ThesisProject(_) => ClaimType::ThesisProject,
        }
    }

    /// Supervised students, empty for every other shape
    pub fn students(&self) -> &[StudentEntry] {
        match self {
            ClaimDetails::ThesisProject(ThesisDetails::Supervision { students, .. }) => students,
            _ => &[],
        }
    }

    /// Destination for transportation claims
    pub fn destination(&self) -> Option<&str> {
        match self {
            ClaimDetails::Transportation(t) => Some(&t.destination),
            _ => None,
        }
    }

    /// Course code for examination claims
    pub fn course_code(&self) -> Option<&str> {
        match self {
            ClaimDetails::ThesisProject(ThesisDetails::Examination { course_code, .. }) => Some(course_code),
            _ => None,
        }
    }
}

/// Who decided the claim, and when
///
/// Kept as one value so the two can never be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processing {
    pub by: UserId,
    pub at: DateTime<Utc>,
}

/// A claim as reassembled from storage, before its invariants are checked
#[derive(Debug, Clone)]
pub struct StoredClaim {
    pub id: ClaimId,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: UserId,
    pub center_id: CenterId,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub details: ClaimDetails,
    pub student_supervisors: Vec<UserId>,
}

/// A claim submitted by a lecturer
///
/// Fields are private: a claim is only obtained through [`Claim::submit`] or
/// the validating [`Claim::restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    id: ClaimId,
    status: ClaimStatus,
    submitted_at: DateTime<Utc>,
    submitted_by: UserId,
    center_id: CenterId,
    processing: Option<Processing>,
    details: ClaimDetails,
}

impl Claim {
    /// Creates a new pending claim
    pub fn submit(
        submitted_by: UserId,
        center_id: CenterId,
        details: ClaimDetails,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ClaimId::new(),
            status: ClaimStatus::Pending,
            submitted_at,
            submitted_by,
            center_id,
            processing: None,
            details,
        }
    }

    /// Rebuilds a claim from storage, rejecting rows that break the
    /// status/processing invariant or carry foreign supervisors
    pub fn restore(stored: StoredClaim) -> Result<Self, ClaimError> {
        let processing = match (stored.status, stored.processed_by, stored.processed_at) {
            (ClaimStatus::Pending, None, None) => None,
            (status, Some(by), Some(at)) if status.is_terminal() => Some(Processing { by, at }),
            (status, by, at) => {
                return Err(ClaimError::InconsistentState(format!(
                    "claim {} has status {} with processed_by={:?} processed_at={:?}",
                    stored.id, status, by, at
                )))
            }
        };

        if let Some(foreign) = stored
            .student_supervisors
            .iter()
            .find(|supervisor| **supervisor != stored.submitted_by)
        {
            return Err(ClaimError::InconsistentState(format!(
                "claim {} lists supervisor {} but was submitted by {}",
                stored.id, foreign, stored.submitted_by
            )));
        }

        Ok(Self {
            id: stored.id,
            status: stored.status,
            submitted_at: stored.submitted_at,
            submitted_by: stored.submitted_by,
            center_id: stored.center_id,
            processing,
            details: stored.details,
        })
    }

    pub fn id(&self) -> ClaimId {
        self.id
    }

    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    pub fn claim_type(&self) -> ClaimType {
        self.details.claim_type()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn submitted_by(&self) -> UserId {
        self.submitted_by
    }

    pub fn center_id(&self) -> CenterId {
        self.center_id
    }

    pub fn processing(&self) -> Option<Processing> {
        self.processing
    }

    pub fn processed_by(&self) -> Option<UserId> {
        self.processing.map(|p| p.by)
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processing.map(|p| p.at)
    }

    pub fn details(&self) -> &ClaimDetails {
        &self.details
    }

    /// Supervised students with their claim and supervisor references filled in
    pub fn supervised_students(&self) -> Vec<SupervisedStudent> {
        self.details
            .students()
            .iter()
            .map(|entry| SupervisedStudent {
                id: entry.id,
                claim_id: self.id,
                supervisor_id: self.submitted_by,
                student_name: entry.student_name.clone(),
                thesis_title: entry.thesis_title.clone(),
            })
            .collect()
    }

    /// Records a decision; only called through the lifecycle module
    pub(crate) fn record_decision(&mut self, status: ClaimStatus, processing: Processing) {
        self.status = status;
        self.processing = Some(processing);
    }
}
