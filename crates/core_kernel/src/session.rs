//! Identity and session context
//!
//! A request is resolved exactly once into a [`SessionContext`] (or
//! [`NoSession`]) at the edge of the system. Every service operation takes the
//! context as its first argument; nothing downstream looks identity up from
//! ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::identifiers::UserId;

/// The three permission tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Cross-tenant administration and read access
    Registry,
    /// Owns exactly one center and processes its claims
    Coordinator,
    /// Submits claims inside an assigned center
    Lecturer,
}

impl Role {
    /// Returns the canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Registry => "registry",
            Role::Coordinator => "coordinator",
            Role::Lecturer => "lecturer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = NoSession;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registry" => Ok(Role::Registry),
            "coordinator" => Ok(Role::Coordinator),
            "lecturer" => Ok(Role::Lecturer),
            other => Err(NoSession::UnknownRole(other.to_string())),
        }
    }
}

/// The resolved identity of the caller for the duration of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: UserId,
    pub role: Role,
}

impl SessionContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn registry(user_id: UserId) -> Self {
        Self::new(user_id, Role::Registry)
    }

    pub fn coordinator(user_id: UserId) -> Self {
        Self::new(user_id, Role::Coordinator)
    }

    pub fn lecturer(user_id: UserId) -> Self {
        Self::new(user_id, Role::Lecturer)
    }

    /// True when the session belongs to the given user
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Session resolution failed; the request carries no usable identity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoSession {
    #[error("No credentials supplied")]
    MissingCredentials,

    #[error("Credentials are invalid")]
    InvalidCredentials,

    #[error("Credentials have expired")]
    Expired,

    #[error("Malformed subject: {0}")]
    MalformedSubject(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Coordinator".parse::<Role>().unwrap(), Role::Coordinator);
        assert_eq!(" REGISTRY ".parse::<Role>().unwrap(), Role::Registry);
        assert_eq!("lecturer".parse::<Role>().unwrap(), Role::Lecturer);
    }

    #[test]
    fn test_unknown_role_is_no_session() {
        let err = "admin".parse::<Role>().unwrap_err();
        assert_eq!(err, NoSession::UnknownRole("admin".to_string()));
    }

    #[test]
    fn test_role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::Coordinator).unwrap();
        assert_eq!(json, "\"coordinator\"");
    }

    #[test]
    fn test_session_identity() {
        let user = UserId::new();
        let session = SessionContext::lecturer(user);
        assert!(session.is(user));
        assert!(!session.is(UserId::new()));
        assert_eq!(session.role, Role::Lecturer);
    }
}
