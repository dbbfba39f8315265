//! Claims Domain
//!
//! Lecturers submit claims of one of three kinds; the coordinator of the
//! claim's center approves or rejects each one exactly once.
//!
//! # Claim Shapes
//!
//! ```text
//! ClaimDetails
//!   ├── Teaching        (date, start, end -> contact hours)
//!   ├── Transportation  (Public | Private{reg no, cc}, origin, destination, amount)
//!   └── ThesisProject
//!         ├── Examination (course code, exam date)
//!         └── Supervision (rank, [supervised students])
//! ```
//!
//! # Claim Lifecycle
//!
//! ```text
//! Pending -> Approved
//!         -> Rejected
//! ```

pub mod claim;
pub mod payload;
pub mod lifecycle;
pub mod search;
pub mod ports;
pub mod service;
pub mod error;

pub use claim::{
    Claim, ClaimType, ClaimStatus, ClaimDetails, TeachingDetails, TransportationDetails,
    TransportMode, TransportType, ThesisDetails, ThesisType, StudentEntry, SupervisedStudent,
    Processing, StoredClaim,
};
pub use payload::{ClaimPayload, StudentPayload, PayloadViolation};
pub use lifecycle::{Decision, ClaimTransition, TransitionOutcome};
pub use search::{ClaimScope, DefaultScope, TenantScope, SearchTerm, TextField, ClaimFilter, SubmitterInfo};
pub use ports::ClaimsPort;
pub use service::ClaimsService;
pub use error::ClaimError;
