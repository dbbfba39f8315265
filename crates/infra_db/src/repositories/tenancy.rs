//! Tenant graph repository
//!
//! Users, centers and departments. Membership changes that must hold under
//! concurrency are single conditional `UPDATE`s whose affected-row count
//! tells the caller whether the precondition still held.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Database role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Registry,
    Coordinator,
    Lecturer,
}

/// Database row for a user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub center_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Database row for a center
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CenterRow {
    pub id: Uuid,
    pub name: String,
    pub coordinator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Database row for a department
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DepartmentRow {
    pub id: Uuid,
    pub center_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, name, email, role, center_id, department_id, created_at";
const CENTER_COLUMNS: &str = "id, name, coordinator_id, created_at";
const DEPARTMENT_COLUMNS: &str = "id, center_id, name, created_at";

/// Repository for the tenant graph
#[derive(Debug, Clone)]
pub struct TenancyRepository {
    pool: PgPool,
}

impl TenancyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub async fn insert_user(&self, row: &UserRow) -> Result<UserRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, UserRow>(&sql)
            .bind(row.id)
            .bind(&row.name)
            .bind(&row.email)
            .bind(row.role)
            .bind(row.center_id)
            .bind(row.department_id)
            .bind(row.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserRow, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", id))
    }

    pub async fn list_lecturers(&self, center_id: Uuid) -> Result<Vec<UserRow>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'lecturer' AND center_id = $1 ORDER BY name, id"
        );
        Ok(sqlx::query_as::<_, UserRow>(&sql).bind(center_id).fetch_all(&self.pool).await?)
    }

    pub async fn list_unassigned_lecturers(&self) -> Result<Vec<UserRow>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'lecturer' AND center_id IS NULL ORDER BY name, id"
        );
        Ok(sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.pool).await?)
    }

    /// Binds a lecturer to a center only if it has none; false otherwise
    pub async fn bind_lecturer_to_center(&self, lecturer_id: Uuid, center_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET center_id = $2, department_id = NULL \
             WHERE id = $1 AND role = 'lecturer' AND center_id IS NULL",
        )
        .bind(lecturer_id)
        .bind(center_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Clears a lecturer's center and department if it is still in `center_id`
    pub async fn release_lecturer_from_center(&self, lecturer_id: Uuid, center_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET center_id = NULL, department_id = NULL WHERE id = $1 AND center_id = $2",
        )
        .bind(lecturer_id)
        .bind(center_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Sets or clears a lecturer's department if it is still in `center_id`
    pub async fn set_lecturer_department(
        &self,
        lecturer_id: Uuid,
        center_id: Uuid,
        department_id: Option<Uuid>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET department_id = $3 WHERE id = $1 AND center_id = $2")
            .bind(lecturer_id)
            .bind(center_id)
            .bind(department_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    // ------------------------------------------------------------------------
    // Centers
    // ------------------------------------------------------------------------

    pub async fn insert_center(&self, row: &CenterRow) -> Result<CenterRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO centers ({CENTER_COLUMNS}) VALUES ($1, $2, $3, $4) RETURNING {CENTER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CenterRow>(&sql)
            .bind(row.id)
            .bind(&row.name)
            .bind(row.coordinator_id)
            .bind(row.created_at)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn get_center(&self, id: Uuid) -> Result<CenterRow, DatabaseError> {
        let sql = format!("SELECT {CENTER_COLUMNS} FROM centers WHERE id = $1");
        sqlx::query_as::<_, CenterRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Center", id))
    }

    pub async fn list_centers(&self) -> Result<Vec<CenterRow>, DatabaseError> {
        let sql = format!("SELECT {CENTER_COLUMNS} FROM centers ORDER BY name");
        Ok(sqlx::query_as::<_, CenterRow>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn find_center_by_coordinator(&self, coordinator_id: Uuid) -> Result<Option<CenterRow>, DatabaseError> {
        let sql = format!("SELECT {CENTER_COLUMNS} FROM centers WHERE coordinator_id = $1");
        Ok(sqlx::query_as::<_, CenterRow>(&sql)
            .bind(coordinator_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn set_center_coordinator(&self, center_id: Uuid, coordinator_id: Uuid) -> Result<CenterRow, DatabaseError> {
        let sql = format!("UPDATE centers SET coordinator_id = $2 WHERE id = $1 RETURNING {CENTER_COLUMNS}");
        sqlx::query_as::<_, CenterRow>(&sql)
            .bind(center_id)
            .bind(coordinator_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Center", center_id))
    }

    // ------------------------------------------------------------------------
    // Departments
    // ------------------------------------------------------------------------

    pub async fn insert_department(&self, row: &DepartmentRow) -> Result<DepartmentRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO departments ({DEPARTMENT_COLUMNS}) VALUES ($1, $2, $3, $4) RETURNING {DEPARTMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, DepartmentRow>(&sql)
            .bind(row.id)
            .bind(row.center_id)
            .bind(&row.name)
            .bind(row.created_at)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn get_department(&self, id: Uuid) -> Result<DepartmentRow, DatabaseError> {
        let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = $1");
        sqlx::query_as::<_, DepartmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Department", id))
    }

    pub async fn list_departments(&self, center_id: Uuid) -> Result<Vec<DepartmentRow>, DatabaseError> {
        let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE center_id = $1 ORDER BY name");
        Ok(sqlx::query_as::<_, DepartmentRow>(&sql).bind(center_id).fetch_all(&self.pool).await?)
    }

    /// Deletes a department after releasing its lecturers, in one transaction
    ///
    /// Returns how many lecturers were released.
    pub async fn delete_department(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let released = sqlx::query("UPDATE users SET department_id = NULL WHERE department_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::not_found("Department", id));
        }

        tx.commit().await?;
        Ok(released)
    }
}
