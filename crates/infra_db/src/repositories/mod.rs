//! Repository implementations
//!
//! Repositories own the SQL. They speak in row types and `DatabaseError`;
//! the adapters translate to the domain.

pub mod tenancy;
pub mod claims;

pub use tenancy::TenancyRepository;
pub use claims::ClaimsRepository;
