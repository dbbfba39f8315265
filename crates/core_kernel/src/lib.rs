//! Core Kernel - Foundational types shared by every claims-system crate
//!
//! This crate provides the fundamental building blocks used across the domain modules:
//! - Strongly-typed identifiers for users, centers, departments and claims
//! - The per-request session context (`{user_id, role}`)
//! - The authorization guard every read and write passes through
//! - Port error types and health checks for the hexagonal adapters

pub mod identifiers;
pub mod session;
pub mod access;
pub mod ports;

pub use identifiers::{UserId, CenterId, DepartmentId, ClaimId, SupervisedStudentId};
pub use session::{Role, SessionContext, NoSession};
pub use access::{authorize, authorize_role, Action, OwnerChain, AccessDenied};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
