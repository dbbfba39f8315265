//! Tenant graph DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CenterId, DepartmentId, Role, UserId};
use domain_tenancy::{NewUser, User};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
}

impl From<CreateUserRequest> for NewUser {
    fn from(request: CreateUserRequest) -> Self {
        NewUser::new(request.name, request.email, request.role)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCenterRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub coordinator_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AssignCoordinatorRequest {
    pub coordinator_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignCenterRequest {
    pub center_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AssignDepartmentRequest {
    pub department_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub center_id: Option<CenterId>,
    pub department_id: Option<DepartmentId>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            center_id: user.center_id,
            department_id: user.department_id,
            created_at: user.created_at,
        }
    }
}

/// Result of deleting a department
#[derive(Debug, Serialize)]
pub struct DepartmentDeletedResponse {
    pub department_id: DepartmentId,
    /// Lecturers whose department was cleared
    pub released_lecturers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_request_validation() {
        let valid = CreateUserRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@uni.edu".to_string(),
            role: Role::Lecturer,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateUserRequest {
            name: String::new(),
            email: "nope".to_string(),
            role: Role::Lecturer,
        };
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("email"));
    }
}
