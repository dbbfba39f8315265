//! Tenant graph errors

use thiserror::Error;

use core_kernel::{AccessDenied, PortError};

/// Errors that can occur in the tenancy domain
#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already assigned: {0}")]
    AlreadyAssigned(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Not assigned: {0}")]
    NotAssigned(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Port(PortError),
}

impl TenancyError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        TenancyError::NotFound(format!("{} {}", entity, id))
    }
}

impl From<AccessDenied> for TenancyError {
    fn from(denied: AccessDenied) -> Self {
        if denied.hides_existence() {
            TenancyError::NotFound("resource not found".to_string())
        } else {
            TenancyError::Unauthorized(denied.to_string())
        }
    }
}

impl From<PortError> for TenancyError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => TenancyError::NotFound(format!("{} {}", entity_type, id)),
            other => TenancyError::Port(other),
        }
    }
}
