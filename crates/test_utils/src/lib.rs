//! Test Utilities Crate
//!
//! Shared test infrastructure for the claims workspace.
//!
//! # Modules
//!
//! - `memory`: in-memory implementation of every domain port
//! - `fixtures`: a seeded [`TestWorld`] with services and sessions
//! - `builders`: valid claim payloads to start from
//! - `database`: PostgreSQL test containers
//! - `assertions`: error and invariant assertions
//! - `generators`: `fake` data and `proptest` strategies

pub mod memory;
pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use memory::MemoryStore;
pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
