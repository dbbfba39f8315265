//! Role-scoped users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CenterId, DepartmentId, Role, UserId};

/// A user of the system
///
/// `center_id` is only ever set for lecturers; a coordinator's center is found
/// through `Center::coordinator_id`. `department_id` implies `center_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub center_id: Option<CenterId>,
    pub department_id: Option<DepartmentId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_lecturer(&self) -> bool {
        self.role == Role::Lecturer
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}

/// Data for registering a new user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    /// Builds the stored user with a fresh id and no tenant bindings
    pub fn into_user(self) -> User {
        User {
            id: UserId::new(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            role: self.role,
            center_id: None,
            department_id: None,
            created_at: Utc::now(),
        }
    }
}
