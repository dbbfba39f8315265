//! Flat claim payloads and their validation
//!
//! Callers and storage both speak the flat shape: one optional field per
//! column, whatever the claim type. [`ClaimPayload::into_details`] is the only
//! way from the flat shape to [`ClaimDetails`]; it rejects missing required
//! fields and populated fields that belong to another claim type, collecting
//! every violation rather than stopping at the first.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::SupervisedStudentId;

use crate::claim::{
    ClaimDetails, ClaimType, StudentEntry, TeachingDetails, ThesisDetails, ThesisType,
    TransportMode, TransportType, TransportationDetails,
};
use crate::error::ClaimError;

/// A supervised student as supplied by a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPayload {
    /// Only set when reloading from storage; callers cannot choose ids
    #[serde(skip)]
    pub id: Option<SupervisedStudentId>,
    pub student_name: Option<String>,
    pub thesis_title: Option<String>,
}

impl StudentPayload {
    pub fn new(student_name: impl Into<String>, thesis_title: impl Into<String>) -> Self {
        Self {
            id: None,
            student_name: Some(student_name.into()),
            thesis_title: Some(thesis_title.into()),
        }
    }
}

/// Every type-specific claim field, all optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimPayload {
    // Teaching
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    // Transportation
    pub transport_type: Option<TransportType>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub amount: Option<Decimal>,
    pub registration_number: Option<String>,
    pub cubic_capacity: Option<i32>,

    // Thesis / project
    pub thesis_type: Option<ThesisType>,
    pub course_code: Option<String>,
    pub exam_date: Option<NaiveDate>,
    pub supervision_rank: Option<String>,
    pub students: Vec<StudentPayload>,
}

/// What is wrong with one payload field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadViolation {
    /// Required for this claim type but absent or blank
    Missing(&'static str),
    /// Belongs to another claim type (or sub-type) but populated
    Forbidden(&'static str),
    /// Present but unusable
    Invalid { field: &'static str, reason: String },
}

impl PayloadViolation {
    pub fn field(&self) -> &'static str {
        match self {
            PayloadViolation::Missing(field) | PayloadViolation::Forbidden(field) => *field,
            PayloadViolation::Invalid { field, .. } => *field,
        }
    }
}

impl fmt::Display for PayloadViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadViolation::Missing(field) => write!(f, "{} is required", field),
            PayloadViolation::Forbidden(field) => write!(f, "{} is not allowed here", field),
            PayloadViolation::Invalid { field, reason } => write!(f, "{} is invalid: {}", field, reason),
        }
    }
}

/// Field groups, by the shape that owns them
const TEACHING_FIELDS: &[&str] = &["date", "start_time", "end_time"];
const TRANSPORT_FIELDS: &[&str] = &["transport_type", "origin", "destination", "amount"];
const PRIVATE_TRANSPORT_FIELDS: &[&str] = &["registration_number", "cubic_capacity"];
const THESIS_FIELDS: &[&str] = &["thesis_type"];
const EXAMINATION_FIELDS: &[&str] = &["course_code", "exam_date"];
const SUPERVISION_FIELDS: &[&str] = &["supervision_rank", "students"];

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ClaimPayload {
    /// Whether a field carries a value; blank strings count as empty
    fn is_populated(&self, field: &str) -> bool {
        match field {
            "date" => self.date.is_some(),
            "start_time" => self.start_time.is_some(),
            "end_time" => self.end_time.is_some(),
            "transport_type" => self.transport_type.is_some(),
            "origin" => text(&self.origin).is_some(),
            "destination" => text(&self.destination).is_some(),
            "amount" => self.amount.is_some(),
            "registration_number" => text(&self.registration_number).is_some(),
            "cubic_capacity" => self.cubic_capacity.is_some(),
            "thesis_type" => self.thesis_type.is_some(),
            "course_code" => text(&self.course_code).is_some(),
            "exam_date" => self.exam_date.is_some(),
            "supervision_rank" => text(&self.supervision_rank).is_some(),
            "students" => !self.students.is_empty(),
            _ => false,
        }
    }

    fn forbid(&self, groups: &[&[&'static str]], violations: &mut Vec<PayloadViolation>) {
        for &field in groups.iter().flat_map(|g| g.iter()) {
            if self.is_populated(field) {
                violations.push(PayloadViolation::Forbidden(field));
            }
        }
    }

    /// Validates the payload against `claim_type` and builds the typed details
    ///
    /// # Errors
    ///
    /// `ClaimError::InvalidClaimPayload` listing every violation found.
    pub fn into_details(self, claim_type: ClaimType) -> Result<ClaimDetails, ClaimError> {
        let mut violations = Vec::new();

        let details = match claim_type {
            ClaimType::Teaching => {
                self.forbid(&[TRANSPORT_FIELDS, PRIVATE_TRANSPORT_FIELDS, THESIS_FIELDS, EXAMINATION_FIELDS, SUPERVISION_FIELDS], &mut violations);
                self.teaching(&mut violations).map(ClaimDetails::Teaching)
            }
            ClaimType::Transportation => {
                self.forbid(&[TEACHING_FIELDS, THESIS_FIELDS, EXAMINATION_FIELDS, SUPERVISION_FIELDS], &mut violations);
                self.transportation(&mut violations).map(ClaimDetails::Transportation)
            }
            ClaimType::ThesisProject => {
                self.forbid(&[TEACHING_FIELDS, TRANSPORT_FIELDS, PRIVATE_TRANSPORT_FIELDS], &mut violations);
                self.thesis(&mut violations).map(ClaimDetails::ThesisProject)
            }
        };

        match details {
            Some(details) if violations.is_empty() => Ok(details),
            _ => Err(ClaimError::InvalidClaimPayload(violations)),
        }
    }

    fn teaching(&self, violations: &mut Vec<PayloadViolation>) -> Option<TeachingDetails> {
        let date = require(self.date, "date", violations);
        let start_time = require(self.start_time, "start_time", violations);
        let end_time = require(self.end_time, "end_time", violations);

        let (date, start_time, end_time) = (date?, start_time?, end_time?);
        if end_time <= start_time {
            violations.push(PayloadViolation::Invalid {
                field: "end_time",
                reason: "must be after start_time".to_string(),
            });
            return None;
        }

        Some(TeachingDetails { date, start_time, end_time })
    }

    fn transportation(&self, violations: &mut Vec<PayloadViolation>) -> Option<TransportationDetails> {
        let transport_type = require(self.transport_type, "transport_type", violations);
        let origin = require(text(&self.origin), "origin", violations);
        let destination = require(text(&self.destination), "destination", violations);
        let amount = require(self.amount, "amount", violations);

        if let Some(amount) = amount {
            if let Some(reason) = amount_violation(amount) {
                violations.push(PayloadViolation::Invalid { field: "amount", reason });
            }
        }

        let mode = match transport_type? {
            TransportType::Public => {
                self.forbid(&[PRIVATE_TRANSPORT_FIELDS], violations);
                TransportMode::Public
            }
            TransportType::Private => {
                let registration_number = require(text(&self.registration_number), "registration_number", violations);
                let cubic_capacity = require(self.cubic_capacity, "cubic_capacity", violations)
                    .and_then(|cc| match u32::try_from(cc) {
                        Ok(cc) if cc > 0 => Some(cc),
                        _ => {
                            violations.push(PayloadViolation::Invalid {
                                field: "cubic_capacity",
                                reason: "must be a positive number".to_string(),
                            });
                            None
                        }
                    });
                TransportMode::Private {
                    registration_number: registration_number?,
                    cubic_capacity: cubic_capacity?,
                }
            }
        };

        Some(TransportationDetails {
            mode,
            origin: origin?,
            destination: destination?,
            amount: in_cents(amount?),
        })
    }

    fn thesis(&self, violations: &mut Vec<PayloadViolation>) -> Option<ThesisDetails> {
        match require(self.thesis_type, "thesis_type", violations)? {
            ThesisType::Examination => {
                self.forbid(&[SUPERVISION_FIELDS], violations);
                let course_code = require(text(&self.course_code), "course_code", violations);
                let exam_date = require(self.exam_date, "exam_date", violations);
                Some(ThesisDetails::Examination {
                    course_code: course_code?,
                    exam_date: exam_date?,
                })
            }
            ThesisType::Supervision => {
                self.forbid(&[EXAMINATION_FIELDS], violations);
                let supervision_rank = require(text(&self.supervision_rank), "supervision_rank", violations);
                if self.students.is_empty() {
                    violations.push(PayloadViolation::Missing("students"));
                }

                let mut students = Vec::with_capacity(self.students.len());
                for student in &self.students {
                    let name = require(text(&student.student_name), "students.student_name", violations);
                    let title = require(text(&student.thesis_title), "students.thesis_title", violations);
                    if let (Some(student_name), Some(thesis_title)) = (name, title) {
                        students.push(StudentEntry {
                            id: student.id.unwrap_or_default(),
                            student_name,
                            thesis_title,
                        });
                    }
                }

                Some(ThesisDetails::Supervision {
                    supervision_rank: supervision_rank?,
                    students,
                })
            }
        }
    }
}

fn require<T>(value: Option<T>, field: &'static str, violations: &mut Vec<PayloadViolation>) -> Option<T> {
    if value.is_none() {
        violations.push(PayloadViolation::Missing(field));
    }
    value
}

impl From<&ClaimDetails> for ClaimPayload {
    /// Flattens typed details into the column-per-field shape
    fn from(details: &ClaimDetails) -> Self {
        let mut payload = ClaimPayload::default();
        match details {
            ClaimDetails::Teaching(t) => {
                payload.date = Some(t.date);
                payload.start_time = Some(t.start_time);
                payload.end_time = Some(t.end_time);
            }
            ClaimDetails::Transportation(t) => {
                payload.transport_type = Some(t.mode.transport_type());
                payload.origin = Some(t.origin.clone());
                payload.destination = Some(t.destination.clone());
                payload.amount = Some(t.amount);
                if let TransportMode::Private { registration_number, cubic_capacity } = &t.mode {
                    payload.registration_number = Some(registration_number.clone());
                    payload.cubic_capacity = i32::try_from(*cubic_capacity).ok();
                }
            }
            ClaimDetails::ThesisProject(thesis) => {
                payload.thesis_type = Some(thesis.thesis_type());
                match thesis {
                    ThesisDetails::Examination { course_code, exam_date } => {
                        payload.course_code = Some(course_code.clone());
                        payload.exam_date = Some(*exam_date);
                    }
                    ThesisDetails::Supervision { supervision_rank, students } => {
                        payload.supervision_rank = Some(supervision_rank.clone());
                        payload.students = students
                            .iter()
                            .map(|s| StudentPayload {
                                id: Some(s.id),
                                student_name: Some(s.student_name.clone()),
                                thesis_title: Some(s.thesis_title.clone()),
                            })
                            .collect();
                    }
                }
            }
        }
        payload
    }
}

/// Largest scale an amount may carry (whole cents)
const AMOUNT_SCALE: u32 = 2;

/// Amounts must stay below 10^10 to fit the stored precision
const AMOUNT_INTEGER_DIGITS: u32 = 10;

fn amount_violation(amount: Decimal) -> Option<String> {
    if amount.is_sign_negative() {
        return Some("must not be negative".to_string());
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Some(format!("must have at most {} decimal places", AMOUNT_SCALE));
    }
    if amount >= Decimal::from(10i64.pow(AMOUNT_INTEGER_DIGITS)) {
        return Some(format!("must be less than 10^{}", AMOUNT_INTEGER_DIGITS));
    }
    None
}

/// Stores the amount at the fixed scale the database reports back
fn in_cents(mut amount: Decimal) -> Decimal {
    amount.rescale(AMOUNT_SCALE);
    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn violations(result: Result<ClaimDetails, ClaimError>) -> Vec<PayloadViolation> {
        match result {
            Err(ClaimError::InvalidClaimPayload(v)) => v,
            other => panic!("expected InvalidClaimPayload, got {:?}", other),
        }
    }

    fn public_transport() -> ClaimPayload {
        ClaimPayload {
            transport_type: Some(TransportType::Public),
            origin: Some("Campus A".to_string()),
            destination: Some("Campus B".to_string()),
            amount: Some(dec!(12.40)),
            ..Default::default()
        }
    }

    #[test]
    fn test_public_transport_is_valid() {
        let details = public_transport().into_details(ClaimType::Transportation).unwrap();
        match details {
            ClaimDetails::Transportation(t) => assert_eq!(t.mode, TransportMode::Public),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_amount_must_fit_whole_cents_below_ten_billion() {
        for amount in [dec!(12.345), dec!(10000000000.00), dec!(100000000000.00)] {
            let payload = ClaimPayload { amount: Some(amount), ..public_transport() };
            let v = violations(payload.into_details(ClaimType::Transportation));
            assert!(
                matches!(v.as_slice(), [PayloadViolation::Invalid { field: "amount", .. }]),
                "{}: {:?}",
                amount,
                v
            );
        }

        for (amount, stored) in [("0", "0.00"), ("12.3", "12.30"), ("12.3400", "12.34"), ("9999999999.99", "9999999999.99")] {
            let payload = ClaimPayload { amount: Some(amount.parse().unwrap()), ..public_transport() };
            match payload.into_details(ClaimType::Transportation) {
                Ok(ClaimDetails::Transportation(t)) => assert_eq!(t.amount.to_string(), stored),
                other => panic!("{}: unexpected {:?}", amount, other),
            }
        }
    }

    #[test]
    fn test_public_transport_with_registration_is_rejected() {
        let payload = ClaimPayload {
            registration_number: Some("AB-123".to_string()),
            ..public_transport()
        };
        let v = violations(payload.into_details(ClaimType::Transportation));
        assert_eq!(v, vec![PayloadViolation::Forbidden("registration_number")]);
    }

    #[test]
    fn test_private_transport_requires_vehicle() {
        let payload = ClaimPayload {
            transport_type: Some(TransportType::Private),
            ..public_transport()
        };
        let v = violations(payload.into_details(ClaimType::Transportation));
        assert!(v.contains(&PayloadViolation::Missing("registration_number")));
        assert!(v.contains(&PayloadViolation::Missing("cubic_capacity")));
    }

    #[test]
    fn test_private_transport_rejects_non_positive_capacity() {
        let payload = ClaimPayload {
            transport_type: Some(TransportType::Private),
            registration_number: Some("AB-123".to_string()),
            cubic_capacity: Some(0),
            ..public_transport()
        };
        let v = violations(payload.into_details(ClaimType::Transportation));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field(), "cubic_capacity");
    }

    #[test]
    fn test_teaching_rejects_foreign_fields() {
        let payload = ClaimPayload {
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            start_time: NaiveTime::from_hms_opt(10, 0, 0),
            end_time: NaiveTime::from_hms_opt(12, 0, 0),
            destination: Some("Library".to_string()),
            course_code: Some("CS101".to_string()),
            ..Default::default()
        };
        let v = violations(payload.into_details(ClaimType::Teaching));
        assert!(v.contains(&PayloadViolation::Forbidden("destination")));
        assert!(v.contains(&PayloadViolation::Forbidden("course_code")));
    }

    #[test]
    fn test_teaching_end_must_follow_start() {
        let payload = ClaimPayload {
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            start_time: NaiveTime::from_hms_opt(12, 0, 0),
            end_time: NaiveTime::from_hms_opt(12, 0, 0),
            ..Default::default()
        };
        let v = violations(payload.into_details(ClaimType::Teaching));
        assert_eq!(v[0].field(), "end_time");
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let payload = ClaimPayload {
            origin: Some("   ".to_string()),
            ..public_transport()
        };
        let v = violations(payload.into_details(ClaimType::Transportation));
        assert_eq!(v, vec![PayloadViolation::Missing("origin")]);
    }

    #[test]
    fn test_examination_forbids_students() {
        let payload = ClaimPayload {
            thesis_type: Some(ThesisType::Examination),
            course_code: Some("MA201".to_string()),
            exam_date: NaiveDate::from_ymd_opt(2024, 6, 10),
            students: vec![StudentPayload::new("Emmy", "Rings")],
            ..Default::default()
        };
        let v = violations(payload.into_details(ClaimType::ThesisProject));
        assert_eq!(v, vec![PayloadViolation::Forbidden("students")]);
    }

    #[test]
    fn test_supervision_requires_students() {
        let payload = ClaimPayload {
            thesis_type: Some(ThesisType::Supervision),
            supervision_rank: Some("Co-supervisor".to_string()),
            ..Default::default()
        };
        let v = violations(payload.into_details(ClaimType::ThesisProject));
        assert_eq!(v, vec![PayloadViolation::Missing("students")]);
    }

    #[test]
    fn test_supervision_round_trips_through_flat_shape() {
        let payload = ClaimPayload {
            thesis_type: Some(ThesisType::Supervision),
            supervision_rank: Some("Main supervisor".to_string()),
            students: vec![StudentPayload::new("Emmy", "Rings"), StudentPayload::new("Sofia", "PDEs")],
            ..Default::default()
        };
        let details = payload.into_details(ClaimType::ThesisProject).unwrap();
        let flat = ClaimPayload::from(&details);
        let again = flat.into_details(ClaimType::ThesisProject).unwrap();
        assert_eq!(details, again);
    }

    #[test]
    fn test_missing_thesis_type() {
        let v = violations(ClaimPayload::default().into_details(ClaimType::ThesisProject));
        assert_eq!(v, vec![PayloadViolation::Missing("thesis_type")]);
    }
}
