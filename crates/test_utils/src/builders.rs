//! Test Data Builders
//!
//! Builders for flat claim payloads. Each starts from a valid payload for one
//! claim shape; tests then override or break the fields they care about.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use domain_claims::{ClaimPayload, ClaimType, StudentPayload, ThesisType, TransportType};

use crate::fixtures::CalendarFixtures;

/// Builder for claim payloads
#[derive(Debug, Clone)]
pub struct ClaimPayloadBuilder {
    claim_type: ClaimType,
    payload: ClaimPayload,
}

impl ClaimPayloadBuilder {
    /// A 2.5 hour teaching session
    pub fn teaching() -> Self {
        Self {
            claim_type: ClaimType::Teaching,
            payload: ClaimPayload {
                date: Some(CalendarFixtures::lecture_date()),
                start_time: Some(CalendarFixtures::morning_start()),
                end_time: Some(CalendarFixtures::morning_end()),
                ..ClaimPayload::default()
            },
        }
    }

    /// A bus journey
    pub fn public_transport() -> Self {
        Self {
            claim_type: ClaimType::Transportation,
            payload: ClaimPayload {
                transport_type: Some(TransportType::Public),
                origin: Some("Main Campus".to_string()),
                destination: Some("Kisumu Study Center".to_string()),
                amount: Some(dec!(850.00)),
                ..ClaimPayload::default()
            },
        }
    }

    /// A journey in the lecturer's own car
    pub fn private_transport() -> Self {
        let mut builder = Self::public_transport();
        builder.payload.transport_type = Some(TransportType::Private);
        builder.payload.registration_number = Some("KDA 123X".to_string());
        builder.payload.cubic_capacity = Some(1800);
        builder.payload.amount = Some(dec!(2400.00));
        builder
    }

    pub fn examination() -> Self {
        Self {
            claim_type: ClaimType::ThesisProject,
            payload: ClaimPayload {
                thesis_type: Some(ThesisType::Examination),
                course_code: Some("CSC 411".to_string()),
                exam_date: Some(CalendarFixtures::exam_date()),
                ..ClaimPayload::default()
            },
        }
    }

    /// Supervision of `students` generated students
    pub fn supervision(students: usize) -> Self {
        Self {
            claim_type: ClaimType::ThesisProject,
            payload: ClaimPayload {
                thesis_type: Some(ThesisType::Supervision),
                supervision_rank: Some("Principal Supervisor".to_string()),
                students: (1..=students)
                    .map(|i| StudentPayload::new(format!("Student {}", i), format!("Thesis title {}", i)))
                    .collect(),
                ..ClaimPayload::default()
            },
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.payload.destination = Some(destination.into());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.payload.amount = Some(amount);
        self
    }

    pub fn with_registration_number(mut self, registration: impl Into<String>) -> Self {
        self.payload.registration_number = Some(registration.into());
        self
    }

    /// Direct access for tests that need to break the payload
    pub fn edit(mut self, f: impl FnOnce(&mut ClaimPayload)) -> Self {
        f(&mut self.payload);
        self
    }

    pub fn build(self) -> ClaimPayload {
        self.payload
    }

    /// The claim type together with the payload, as `create_claim` takes them
    pub fn into_parts(self) -> (ClaimType, ClaimPayload) {
        (self.claim_type, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builder_yields_valid_details() {
        for builder in [
            ClaimPayloadBuilder::teaching(),
            ClaimPayloadBuilder::public_transport(),
            ClaimPayloadBuilder::private_transport(),
            ClaimPayloadBuilder::examination(),
            ClaimPayloadBuilder::supervision(2),
        ] {
            let (claim_type, payload) = builder.into_parts();
            assert!(payload.into_details(claim_type).is_ok(), "{claim_type} builder is invalid");
        }
    }

    #[test]
    fn test_public_transport_with_registration_is_invalid() {
        let (claim_type, payload) = ClaimPayloadBuilder::public_transport()
            .with_registration_number("KCB 001A")
            .into_parts();
        assert!(payload.into_details(claim_type).is_err());
    }
}
