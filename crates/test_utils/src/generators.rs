//! Test Data Generators
//!
//! `fake` for realistic names and emails, `proptest` strategies for claim
//! payloads and search queries.

use chrono::{NaiveDate, NaiveTime};
use fake::faker::name::en::{FirstName, Name};
use fake::Fake;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use domain_claims::{ClaimPayload, ClaimType, TransportType};

/// A generated full name
pub fn fake_name() -> String {
    Name().fake()
}

/// A generated email that is unique for the life of the process
pub fn fake_email() -> String {
    let first: String = FirstName().fake();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}.{}@example.org", first.to_lowercase(), &suffix[..12])
}

pub fn claim_type_strategy() -> impl Strategy<Value = ClaimType> {
    prop_oneof![
        Just(ClaimType::Teaching),
        Just(ClaimType::Transportation),
        Just(ClaimType::ThesisProject),
    ]
}

/// Dates within 2024
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1u32..=12, 1u32..=28).prop_map(|(m, d)| NaiveDate::from_ymd_opt(2024, m, d).unwrap_or_default())
}

/// A session on a quarter-hour grid with `end > start`
pub fn session_times_strategy() -> impl Strategy<Value = (NaiveTime, NaiveTime)> {
    (28u32..80, 1u32..16).prop_map(|(start_q, len_q)| {
        let start = NaiveTime::from_num_seconds_from_midnight_opt(start_q * 900, 0).unwrap_or_default();
        let end = NaiveTime::from_num_seconds_from_midnight_opt((start_q + len_q) * 900, 0).unwrap_or_default();
        (start, end)
    })
}

/// Non-negative amounts with two decimal places
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Valid teaching payloads
pub fn teaching_payload_strategy() -> impl Strategy<Value = ClaimPayload> {
    (date_strategy(), session_times_strategy()).prop_map(|(date, (start, end))| ClaimPayload {
        date: Some(date),
        start_time: Some(start),
        end_time: Some(end),
        ..ClaimPayload::default()
    })
}

/// Valid transportation payloads, public or private
pub fn transport_payload_strategy() -> impl Strategy<Value = ClaimPayload> {
    (
        proptest::bool::ANY,
        "[A-Z][a-z]{3,12}",
        "[A-Z][a-z]{3,12}",
        amount_strategy(),
        "K[A-Z]{2} [0-9]{3}[A-Z]",
        600i32..5000,
    )
        .prop_map(|(private, origin, destination, amount, registration, cc)| ClaimPayload {
            transport_type: Some(if private { TransportType::Private } else { TransportType::Public }),
            origin: Some(origin),
            destination: Some(destination),
            amount: Some(amount),
            registration_number: private.then_some(registration),
            cubic_capacity: private.then_some(cc),
            ..ClaimPayload::default()
        })
}

/// Queries that contain no alphanumeric character
pub fn unsearchable_query_strategy() -> impl Strategy<Value = String> {
    "[%_*!?.,;:#@\\-]{1,30}"
}
