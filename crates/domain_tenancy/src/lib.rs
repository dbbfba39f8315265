//! Tenant Graph Domain
//!
//! Centers are the tenant boundary. Each center has exactly one coordinator,
//! owns departments whose names are unique within the center, and has
//! lecturers assigned to it (and optionally to one of its departments).
//!
//! ```text
//! Registry ──creates──> Center ──1:1── Coordinator
//!                         │
//!                         ├── Department (name unique per center)
//!                         │       └── Lecturer.department_id
//!                         └── Lecturer.center_id
//! ```
//!
//! All mutations go through [`TenancyService`], which resolves ownership from
//! the store and runs it past the authorization guard on every call.

pub mod user;
pub mod center;
pub mod ports;
pub mod service;
pub mod error;

pub use user::{User, NewUser};
pub use center::{Center, Department, CenterMembership};
pub use ports::TenantPort;
pub use service::TenancyService;
pub use error::TenancyError;
