//! Claim search filters
//!
//! A [`ClaimFilter`] always carries a tenant scope. The free-text part is
//! classified once into a [`SearchTerm`]; adapters render it to SQL and the
//! in-memory store evaluates it with [`ClaimFilter::matches`], so both agree
//! on what a query means.

use serde::{Deserialize, Serialize};

use core_kernel::{CenterId, UserId};

use crate::claim::{Claim, ClaimStatus, ClaimType};

/// Longest query that is still searched
pub const MAX_QUERY_LEN: usize = 100;

/// Scope requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ClaimScope {
    Center(CenterId),
    Submitter(UserId),
}

/// Scope a caller falls back to when they name none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultScope {
    Scoped(ClaimScope),
    /// Registry spans every center and has to name one
    Unscoped,
    /// Coordinator without a center; there is nothing to list
    Unassigned,
}

/// Scope after authorization; at least one side is always set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    center_id: Option<CenterId>,
    submitter_id: Option<UserId>,
}

impl TenantScope {
    pub fn center(center_id: CenterId) -> Self {
        Self { center_id: Some(center_id), submitter_id: None }
    }

    pub fn submitter(submitter_id: UserId) -> Self {
        Self { center_id: None, submitter_id: Some(submitter_id) }
    }

    /// A submitter's claims restricted to one center
    pub fn center_submitter(center_id: CenterId, submitter_id: UserId) -> Self {
        Self { center_id: Some(center_id), submitter_id: Some(submitter_id) }
    }

    pub fn center_id(&self) -> Option<CenterId> {
        self.center_id
    }

    pub fn submitter_id(&self) -> Option<UserId> {
        self.submitter_id
    }

    pub fn contains(&self, claim: &Claim) -> bool {
        self.center_id.map_or(true, |c| c == claim.center_id())
            && self.submitter_id.map_or(true, |s| s == claim.submitted_by())
    }
}

/// Fields matched by [`SearchTerm::Text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    SubmitterName,
    SubmitterEmail,
    Destination,
    CourseCode,
}

impl TextField {
    pub const ALL: [TextField; 4] = [
        TextField::SubmitterName,
        TextField::SubmitterEmail,
        TextField::Destination,
        TextField::CourseCode,
    ];
}

/// Classified free-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// No query; scope only
    Any,
    Type(ClaimType),
    Status(ClaimStatus),
    /// Lowercased, trimmed substring
    Text(String),
    /// Matches nothing
    Nothing,
}

impl SearchTerm {
    pub fn parse(query: Option<&str>) -> Self {
        let query = match query.map(str::trim) {
            None | Some("") => return SearchTerm::Any,
            Some(q) => q,
        };

        if query.chars().count() > MAX_QUERY_LEN || !query.chars().any(char::is_alphanumeric) {
            return SearchTerm::Nothing;
        }

        let key = enum_key(query);
        if let Some(claim_type) = ClaimType::ALL.into_iter().find(|t| enum_key(t.as_str()) == key) {
            return SearchTerm::Type(claim_type);
        }
        if let Some(status) = ClaimStatus::ALL.into_iter().find(|s| enum_key(s.as_str()) == key) {
            return SearchTerm::Status(status);
        }

        SearchTerm::Text(query.to_lowercase())
    }
}

/// Lowercase with separators removed, so `Thesis Project` and
/// `thesis_project` compare equal
fn enum_key(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Submitter columns needed to evaluate a text term in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterInfo {
    pub name: String,
    pub email: String,
}

/// Scope plus term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimFilter {
    pub scope: TenantScope,
    pub term: SearchTerm,
}

impl ClaimFilter {
    pub fn new(scope: TenantScope, query: Option<&str>) -> Self {
        Self { scope, term: SearchTerm::parse(query) }
    }

    pub fn matches(&self, claim: &Claim, submitter: &SubmitterInfo) -> bool {
        if !self.scope.contains(claim) {
            return false;
        }
        match &self.term {
            SearchTerm::Any => true,
            SearchTerm::Nothing => false,
            SearchTerm::Type(t) => claim.claim_type() == *t,
            SearchTerm::Status(s) => claim.status() == *s,
            SearchTerm::Text(needle) => TextField::ALL.iter().any(|field| {
                let haystack = match field {
                    TextField::SubmitterName => Some(submitter.name.as_str()),
                    TextField::SubmitterEmail => Some(submitter.email.as_str()),
                    TextField::Destination => claim.details().destination(),
                    TextField::CourseCode => claim.details().course_code(),
                };
                haystack.is_some_and(|h| h.to_lowercase().contains(needle.as_str()))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use crate::claim::{ClaimDetails, TransportMode, TransportationDetails};

    fn transport_claim(center: CenterId, submitter: UserId, destination: &str) -> Claim {
        Claim::submit(
            submitter,
            center,
            ClaimDetails::Transportation(TransportationDetails {
                mode: TransportMode::Public,
                origin: "Nairobi".to_string(),
                destination: destination.to_string(),
                amount: dec!(1200.00),
            }),
            Utc::now(),
        )
    }

    fn submitter() -> SubmitterInfo {
        SubmitterInfo { name: "Amina Otieno".to_string(), email: "amina@example.org".to_string() }
    }

    #[test]
    fn test_blank_query_is_any() {
        assert_eq!(SearchTerm::parse(None), SearchTerm::Any);
        assert_eq!(SearchTerm::parse(Some("   ")), SearchTerm::Any);
    }

    #[test]
    fn test_enum_names_tolerate_case_and_separators() {
        let expected = SearchTerm::Type(ClaimType::ThesisProject);
        assert_eq!(SearchTerm::parse(Some("thesis_project")), expected);
        assert_eq!(SearchTerm::parse(Some("Thesis Project")), expected);
        assert_eq!(SearchTerm::parse(Some("THESIS-PROJECT")), expected);
        assert_eq!(SearchTerm::parse(Some("Approved")), SearchTerm::Status(ClaimStatus::Approved));
        assert_eq!(SearchTerm::parse(Some("teaching")), SearchTerm::Type(ClaimType::Teaching));
    }

    #[test]
    fn test_unsearchable_query_matches_nothing() {
        assert_eq!(SearchTerm::parse(Some("%%__")), SearchTerm::Nothing);
        assert_eq!(SearchTerm::parse(Some(&"a".repeat(101))), SearchTerm::Nothing);
    }

    #[test]
    fn test_text_search_over_destination_and_submitter() {
        let center = CenterId::new();
        let lecturer = UserId::new();
        let claim = transport_claim(center, lecturer, "Kisumu");

        for q in ["kisu", "AMINA", "example.org"] {
            let filter = ClaimFilter::new(TenantScope::center(center), Some(q));
            assert!(filter.matches(&claim, &submitter()), "query {q}");
        }
        let miss = ClaimFilter::new(TenantScope::center(center), Some("zzz-no-match"));
        assert!(!miss.matches(&claim, &submitter()));
    }

    #[test]
    fn test_scope_is_always_applied() {
        let claim = transport_claim(CenterId::new(), UserId::new(), "Mombasa");
        let other_center = ClaimFilter::new(TenantScope::center(CenterId::new()), None);
        assert!(!other_center.matches(&claim, &submitter()));

        let narrowed = ClaimFilter::new(
            TenantScope::center_submitter(claim.center_id(), UserId::new()),
            Some("pending"),
        );
        assert!(!narrowed.matches(&claim, &submitter()));

        let own = ClaimFilter::new(TenantScope::submitter(claim.submitted_by()), Some("pending"));
        assert!(own.matches(&claim, &submitter()));
    }

    #[test]
    fn test_course_code_is_searchable() {
        use crate::claim::ThesisDetails;
        let claim = Claim::submit(
            UserId::new(),
            CenterId::new(),
            ClaimDetails::ThesisProject(ThesisDetails::Examination {
                course_code: "CSC 411".to_string(),
                exam_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            }),
            Utc::now(),
        );
        let filter = ClaimFilter::new(TenantScope::submitter(claim.submitted_by()), Some("csc 4"));
        assert!(filter.matches(&claim, &submitter()));
    }

    proptest! {
        #[test]
        fn prop_no_alphanumerics_is_nothing(q in "[ %_\\-.,!?*]{1,40}") {
            prop_assume!(!q.trim().is_empty());
            prop_assert_eq!(SearchTerm::parse(Some(&q)), SearchTerm::Nothing);
        }

        #[test]
        fn prop_overlong_query_is_nothing(q in "[a-z]{101,200}") {
            prop_assert_eq!(SearchTerm::parse(Some(&q)), SearchTerm::Nothing);
        }

        #[test]
        fn prop_status_names_any_case(idx in 0usize..3, upper in proptest::bool::ANY) {
            let status = ClaimStatus::ALL[idx];
            let q = if upper { status.as_str().to_uppercase() } else { status.as_str().to_string() };
            prop_assert_eq!(SearchTerm::parse(Some(&q)), SearchTerm::Status(status));
        }

        #[test]
        fn prop_text_terms_are_lowercased(q in "[A-Za-z0-9]{1,20}x") {
            match SearchTerm::parse(Some(&q)) {
                SearchTerm::Text(t) => prop_assert_eq!(t, q.to_lowercase()),
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
