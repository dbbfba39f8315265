//! Tenant Graph Ports
//!
//! The `TenantPort` trait is everything the tenancy domain (and the claims
//! domain, for ownership resolution) needs from storage. Implementations:
//!
//! - **PostgreSQL adapter** (`infra_db::adapters::PostgresTenantAdapter`)
//! - **In-memory adapter** (`test_utils::MemoryStore`)
//!
//! Methods that enforce a relational invariant under concurrency are
//! conditional writes: they report `false` instead of overwriting when the
//! precondition no longer holds at write time.

use async_trait::async_trait;

use core_kernel::{CenterId, DepartmentId, DomainPort, PortError, UserId};

use crate::center::{Center, Department};
use crate::user::User;

#[async_trait]
pub trait TenantPort: DomainPort {
    // ========================================================================
    // Users
    // ========================================================================

    /// Stores a new user; `Conflict { field: "email" }` on a duplicate email
    async fn create_user(&self, user: User) -> Result<User, PortError>;

    /// Retrieves a user or `PortError::NotFound`
    async fn get_user(&self, id: UserId) -> Result<User, PortError>;

    /// Lists lecturers assigned to a center
    async fn list_lecturers(&self, center_id: CenterId) -> Result<Vec<User>, PortError>;

    /// Lists lecturers with no center
    async fn list_unassigned_lecturers(&self) -> Result<Vec<User>, PortError>;

    // ========================================================================
    // Centers
    // ========================================================================

    /// Stores a new center
    ///
    /// Conflicts are reported on `name` or `coordinator_id`.
    async fn create_center(&self, center: Center) -> Result<Center, PortError>;

    /// Retrieves a center or `PortError::NotFound`
    async fn get_center(&self, id: CenterId) -> Result<Center, PortError>;

    /// Lists every center
    async fn list_centers(&self) -> Result<Vec<Center>, PortError>;

    /// Finds the center a coordinator owns, if any
    async fn find_center_by_coordinator(
        &self,
        coordinator_id: UserId,
    ) -> Result<Option<Center>, PortError>;

    /// Replaces a center's coordinator in a single write
    ///
    /// `Conflict { field: "coordinator_id" }` when the coordinator already
    /// owns another center.
    async fn set_center_coordinator(
        &self,
        center_id: CenterId,
        coordinator_id: UserId,
    ) -> Result<Center, PortError>;

    // ========================================================================
    // Departments
    // ========================================================================

    /// Stores a new department; `Conflict { field: "name" }` when the name is
    /// already used inside the same center
    async fn create_department(&self, department: Department) -> Result<Department, PortError>;

    /// Retrieves a department or `PortError::NotFound`
    async fn get_department(&self, id: DepartmentId) -> Result<Department, PortError>;

    /// Lists the departments of a center
    async fn list_departments(&self, center_id: CenterId) -> Result<Vec<Department>, PortError>;

    /// Nulls every lecturer's reference to the department, then removes it,
    /// in one transaction. Returns the number of lecturers released.
    async fn delete_department(&self, id: DepartmentId) -> Result<u64, PortError>;

    // ========================================================================
    // Lecturer assignment (conditional writes)
    // ========================================================================

    /// Binds a lecturer to a center only if the lecturer has no center
    async fn bind_lecturer_to_center(
        &self,
        lecturer_id: UserId,
        center_id: CenterId,
    ) -> Result<bool, PortError>;

    /// Releases a lecturer from `center_id` (clearing the department too),
    /// only if the lecturer is still in that center
    async fn release_lecturer_from_center(
        &self,
        lecturer_id: UserId,
        center_id: CenterId,
    ) -> Result<bool, PortError>;

    /// Sets or clears a lecturer's department, only if the lecturer is still
    /// in `center_id`
    async fn set_lecturer_department(
        &self,
        lecturer_id: UserId,
        center_id: CenterId,
        department_id: Option<DepartmentId>,
    ) -> Result<bool, PortError>;
}
