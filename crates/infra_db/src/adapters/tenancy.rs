//! PostgreSQL Tenant Adapter
//!
//! Implements `TenantPort` over `TenancyRepository`, converting rows to
//! domain types and database errors to `PortError`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, CenterId, DepartmentId, DomainPort, HealthCheckResult, HealthCheckable,
    PortError, Role, UserId,
};
use domain_tenancy::{Center, Department, TenantPort, User};

use crate::repositories::tenancy::{CenterRow, DepartmentRow, TenancyRepository, UserRole, UserRow};

/// PostgreSQL-backed implementation of `TenantPort`
#[derive(Debug, Clone)]
pub struct PostgresTenantAdapter {
    repository: TenancyRepository,
    pool: PgPool,
}

impl PostgresTenantAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: TenancyRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &TenancyRepository {
        &self.repository
    }
}

impl DomainPort for PostgresTenantAdapter {}

#[async_trait]
impl HealthCheckable for PostgresTenantAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-tenant-adapter").await
    }
}

/// Runs `SELECT 1` against the pool and reports latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };

    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

#[async_trait]
impl TenantPort for PostgresTenantAdapter {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: User) -> Result<User, PortError> {
        let row = self.repository.insert_user(&user_to_row(&user)).await?;
        Ok(row_to_user(row))
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_user(&self, id: UserId) -> Result<User, PortError> {
        debug!("Fetching user");
        Ok(row_to_user(self.repository.get_user(id.into()).await?))
    }

    async fn list_lecturers(&self, center_id: CenterId) -> Result<Vec<User>, PortError> {
        let rows = self.repository.list_lecturers(center_id.into()).await?;
        Ok(rows.into_iter().map(row_to_user).collect())
    }

    async fn list_unassigned_lecturers(&self) -> Result<Vec<User>, PortError> {
        let rows = self.repository.list_unassigned_lecturers().await?;
        Ok(rows.into_iter().map(row_to_user).collect())
    }

    #[instrument(skip(self, center), fields(center_id = %center.id))]
    async fn create_center(&self, center: Center) -> Result<Center, PortError> {
        let row = CenterRow {
            id: center.id.into(),
            name: center.name,
            coordinator_id: center.coordinator_id.into(),
            created_at: center.created_at,
        };
        Ok(row_to_center(self.repository.insert_center(&row).await?))
    }

    async fn get_center(&self, id: CenterId) -> Result<Center, PortError> {
        Ok(row_to_center(self.repository.get_center(id.into()).await?))
    }

    async fn list_centers(&self) -> Result<Vec<Center>, PortError> {
        let rows = self.repository.list_centers().await?;
        Ok(rows.into_iter().map(row_to_center).collect())
    }

    async fn find_center_by_coordinator(&self, coordinator_id: UserId) -> Result<Option<Center>, PortError> {
        let row = self.repository.find_center_by_coordinator(coordinator_id.into()).await?;
        Ok(row.map(row_to_center))
    }

    #[instrument(skip(self), fields(center_id = %center_id, coordinator_id = %coordinator_id))]
    async fn set_center_coordinator(&self, center_id: CenterId, coordinator_id: UserId) -> Result<Center, PortError> {
        let row = self
            .repository
            .set_center_coordinator(center_id.into(), coordinator_id.into())
            .await?;
        Ok(row_to_center(row))
    }

    #[instrument(skip(self, department), fields(center_id = %department.center_id))]
    async fn create_department(&self, department: Department) -> Result<Department, PortError> {
        let row = DepartmentRow {
            id: department.id.into(),
            center_id: department.center_id.into(),
            name: department.name,
            created_at: department.created_at,
        };
        Ok(row_to_department(self.repository.insert_department(&row).await?))
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Department, PortError> {
        Ok(row_to_department(self.repository.get_department(id.into()).await?))
    }

    async fn list_departments(&self, center_id: CenterId) -> Result<Vec<Department>, PortError> {
        let rows = self.repository.list_departments(center_id.into()).await?;
        Ok(rows.into_iter().map(row_to_department).collect())
    }

    #[instrument(skip(self), fields(department_id = %id))]
    async fn delete_department(&self, id: DepartmentId) -> Result<u64, PortError> {
        Ok(self.repository.delete_department(id.into()).await?)
    }

    #[instrument(skip(self))]
    async fn bind_lecturer_to_center(&self, lecturer_id: UserId, center_id: CenterId) -> Result<bool, PortError> {
        Ok(self
            .repository
            .bind_lecturer_to_center(lecturer_id.into(), center_id.into())
            .await?)
    }

    #[instrument(skip(self))]
    async fn release_lecturer_from_center(&self, lecturer_id: UserId, center_id: CenterId) -> Result<bool, PortError> {
        Ok(self
            .repository
            .release_lecturer_from_center(lecturer_id.into(), center_id.into())
            .await?)
    }

    #[instrument(skip(self))]
    async fn set_lecturer_department(
        &self,
        lecturer_id: UserId,
        center_id: CenterId,
        department_id: Option<DepartmentId>,
    ) -> Result<bool, PortError> {
        Ok(self
            .repository
            .set_lecturer_department(lecturer_id.into(), center_id.into(), department_id.map(Into::into))
            .await?)
    }
}

fn role_to_db(role: Role) -> UserRole {
    match role {
        Role::Registry => UserRole::Registry,
        Role::Coordinator => UserRole::Coordinator,
        Role::Lecturer => UserRole::Lecturer,
    }
}

fn db_to_role(role: UserRole) -> Role {
    match role {
        UserRole::Registry => Role::Registry,
        UserRole::Coordinator => Role::Coordinator,
        UserRole::Lecturer => Role::Lecturer,
    }
}

fn user_to_row(user: &User) -> UserRow {
    UserRow {
        id: user.id.into(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: role_to_db(user.role),
        center_id: user.center_id.map(Into::into),
        department_id: user.department_id.map(Into::into),
        created_at: user.created_at,
    }
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: row.id.into(),
        name: row.name,
        email: row.email,
        role: db_to_role(row.role),
        center_id: row.center_id.map(Into::into),
        department_id: row.department_id.map(Into::into),
        created_at: row.created_at,
    }
}

fn row_to_center(row: CenterRow) -> Center {
    Center {
        id: row.id.into(),
        name: row.name,
        coordinator_id: row.coordinator_id.into(),
        created_at: row.created_at,
    }
}

fn row_to_department(row: DepartmentRow) -> Department {
    Department {
        id: row.id.into(),
        center_id: row.center_id.into(),
        name: row.name,
        created_at: row.created_at,
    }
}
