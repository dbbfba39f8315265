//! Tenant graph handlers: users, centers, departments and lecturer membership

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CenterId, DepartmentId, SessionContext, UserId};
use domain_tenancy::{Center, CenterMembership, Department};

use crate::dto::tenancy::*;
use crate::{error::ApiError, AppState};

// ============================================================================
// Registry administration
// ============================================================================

pub async fn create_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;
    let user = state.tenancy.create_user(&session, request.into()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn create_center(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<CreateCenterRequest>,
) -> Result<(StatusCode, Json<Center>), ApiError> {
    request.validate()?;
    let center = state
        .tenancy
        .create_center(&session, &request.name, UserId::from(request.coordinator_id))
        .await?;
    Ok((StatusCode::CREATED, Json(center)))
}

pub async fn assign_coordinator(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignCoordinatorRequest>,
) -> Result<Json<Center>, ApiError> {
    let center = state
        .tenancy
        .assign_coordinator(&session, CenterId::from(id), UserId::from(request.coordinator_id))
        .await?;
    Ok(Json(center))
}

// ============================================================================
// Centers
// ============================================================================

pub async fn list_centers(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<Center>>, ApiError> {
    Ok(Json(state.tenancy.list_centers(&session).await?))
}

pub async fn get_center(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Center>, ApiError> {
    Ok(Json(state.tenancy.get_center(&session, CenterId::from(id)).await?))
}

pub async fn list_lecturers(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let lecturers = state.tenancy.list_lecturers(&session, CenterId::from(id)).await?;
    Ok(Json(lecturers.into_iter().map(UserResponse::from).collect()))
}

pub async fn list_unassigned_lecturers(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let lecturers = state.tenancy.list_unassigned_lecturers(&session).await?;
    Ok(Json(lecturers.into_iter().map(UserResponse::from).collect()))
}

// ============================================================================
// Departments
// ============================================================================

pub async fn list_departments(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Department>>, ApiError> {
    Ok(Json(state.tenancy.list_departments(&session, CenterId::from(id)).await?))
}

pub async fn create_department(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    request.validate()?;
    let department = state
        .tenancy
        .create_department(&session, CenterId::from(id), &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// Deletes a department; its lecturers stay in the center without one
pub async fn delete_department(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<DepartmentDeletedResponse>, ApiError> {
    let department_id = DepartmentId::from(id);
    let released = state.tenancy.delete_department(&session, department_id).await?;
    Ok(Json(DepartmentDeletedResponse {
        department_id,
        released_lecturers: released,
    }))
}

// ============================================================================
// Membership
// ============================================================================

pub async fn find_center_for_coordinator(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<CenterMembership>, ApiError> {
    Ok(Json(
        state
            .tenancy
            .find_center_for_coordinator(&session, UserId::from(id))
            .await?,
    ))
}

pub async fn find_center_for_lecturer(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<CenterMembership>, ApiError> {
    Ok(Json(
        state
            .tenancy
            .find_center_for_lecturer(&session, UserId::from(id))
            .await?,
    ))
}

pub async fn assign_lecturer_to_center(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignCenterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .tenancy
        .assign_lecturer_to_center(&session, UserId::from(id), CenterId::from(request.center_id))
        .await?;
    Ok(Json(user.into()))
}

pub async fn unassign_lecturer_from_center(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .tenancy
        .unassign_lecturer_from_center(&session, UserId::from(id))
        .await?;
    Ok(Json(user.into()))
}

pub async fn assign_lecturer_to_department(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDepartmentRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .tenancy
        .assign_lecturer_to_department(
            &session,
            UserId::from(id),
            DepartmentId::from(request.department_id),
        )
        .await?;
    Ok(Json(user.into()))
}

pub async fn unassign_lecturer_from_department(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .tenancy
        .unassign_lecturer_from_department(&session, UserId::from(id))
        .await?;
    Ok(Json(user.into()))
}
