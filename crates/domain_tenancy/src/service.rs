//! Tenancy application service
//!
//! Every operation takes the caller's [`SessionContext`] first, resolves the
//! ownership chain of the target from the store, and passes it through
//! [`authorize`] before touching anything.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::ValidateEmail;

use core_kernel::{
    authorize, Action, CenterId, DepartmentId, OwnerChain, Role, SessionContext, UserId,
};

use crate::center::{normalize_name, Center, CenterMembership, Department};
use crate::error::TenancyError;
use crate::ports::TenantPort;
use crate::user::{NewUser, User};

/// Service for the tenant graph
#[derive(Clone)]
pub struct TenancyService {
    port: Arc<dyn TenantPort>,
}

impl TenancyService {
    /// Creates a new tenancy service over a port implementation
    pub fn new(port: Arc<dyn TenantPort>) -> Self {
        Self { port }
    }

    // ========================================================================
    // Registry administration
    // ========================================================================

    /// Registers a new user
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless the caller is Registry
    /// * `InvalidRequest` for a blank name or malformed email
    /// * `DuplicateName` when the email is already registered
    #[instrument(skip(self, session, new_user), fields(actor = %session.user_id, role = %new_user.role))]
    pub async fn create_user(
        &self,
        session: &SessionContext,
        new_user: NewUser,
    ) -> Result<User, TenancyError> {
        authorize(session, Action::Administer, &OwnerChain::unscoped())?;

        if new_user.name.trim().is_empty() {
            return Err(TenancyError::InvalidRequest("name must not be blank".to_string()));
        }
        if !is_valid_email(&new_user.email) {
            return Err(TenancyError::InvalidRequest(format!("invalid email '{}'", new_user.email)));
        }

        let user = self.port.create_user(new_user.into_user()).await.map_err(|e| {
            if e.is_conflict_on("email") {
                TenancyError::DuplicateName("email is already registered".to_string())
            } else {
                e.into()
            }
        })?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Creates a center owned by a coordinator
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless the caller is Registry
    /// * `NotFound` if the coordinator does not exist
    /// * `InvalidRequest` if the user is not a coordinator or the name is blank
    /// * `AlreadyAssigned` if the coordinator already owns a center
    /// * `DuplicateName` if another center has the same name
    #[instrument(skip(self, session), fields(actor = %session.user_id, coordinator = %coordinator_id))]
    pub async fn create_center(
        &self,
        session: &SessionContext,
        name: &str,
        coordinator_id: UserId,
    ) -> Result<Center, TenancyError> {
        authorize(session, Action::Administer, &OwnerChain::unscoped())?;

        let name = normalize_name(name)
            .ok_or_else(|| TenancyError::InvalidRequest("center name must not be blank".to_string()))?;
        self.require_coordinator(coordinator_id).await?;

        if self.port.find_center_by_coordinator(coordinator_id).await?.is_some() {
            return Err(TenancyError::AlreadyAssigned(format!(
                "coordinator {} already owns a center",
                coordinator_id
            )));
        }

        let center = self
            .port
            .create_center(Center::new(name, coordinator_id))
            .await
            .map_err(|e| {
                if e.is_conflict_on("coordinator_id") {
                    TenancyError::AlreadyAssigned(format!("coordinator {} already owns a center", coordinator_id))
                } else if e.is_conflict_on("name") {
                    TenancyError::DuplicateName("a center with this name already exists".to_string())
                } else {
                    e.into()
                }
            })?;

        info!(center_id = %center.id, "Center created");
        Ok(center)
    }

    /// Hands a center to a different coordinator
    ///
    /// The previous coordinator becomes unassigned; the center is never left
    /// without one.
    #[instrument(skip(self, session), fields(actor = %session.user_id, center = %center_id, coordinator = %coordinator_id))]
    pub async fn assign_coordinator(
        &self,
        session: &SessionContext,
        center_id: CenterId,
        coordinator_id: UserId,
    ) -> Result<Center, TenancyError> {
        authorize(session, Action::Administer, &OwnerChain::unscoped())?;

        let center = self.port.get_center(center_id).await?;
        self.require_coordinator(coordinator_id).await?;

        match self.port.find_center_by_coordinator(coordinator_id).await? {
            Some(owned) if owned.id == center.id => return Ok(owned),
            Some(_) => {
                return Err(TenancyError::AlreadyAssigned(format!(
                    "coordinator {} already owns a center",
                    coordinator_id
                )))
            }
            None => {}
        }

        let updated = self
            .port
            .set_center_coordinator(center_id, coordinator_id)
            .await
            .map_err(|e| {
                if e.is_conflict_on("coordinator_id") {
                    TenancyError::AlreadyAssigned(format!("coordinator {} already owns a center", coordinator_id))
                } else {
                    e.into()
                }
            })?;

        info!(previous = %center.coordinator_id, "Center coordinator replaced");
        Ok(updated)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Retrieves a center the caller may see
    #[instrument(skip(self, session), fields(actor = %session.user_id, center = %center_id))]
    pub async fn get_center(
        &self,
        session: &SessionContext,
        center_id: CenterId,
    ) -> Result<Center, TenancyError> {
        let center = self.port.get_center(center_id).await?;
        let chain = self.read_chain(session, &center).await?;
        authorize(session, Action::Read, &chain)?;
        Ok(center)
    }

    /// Lists the centers visible to the caller
    ///
    /// Registry sees all of them; coordinators and lecturers see their own
    /// (or nothing, when unassigned).
    #[instrument(skip(self, session), fields(actor = %session.user_id))]
    pub async fn list_centers(&self, session: &SessionContext) -> Result<Vec<Center>, TenancyError> {
        match session.role {
            Role::Registry => Ok(self.port.list_centers().await?),
            Role::Coordinator => Ok(self
                .port
                .find_center_by_coordinator(session.user_id)
                .await?
                .into_iter()
                .collect()),
            Role::Lecturer => {
                let me = self.port.get_user(session.user_id).await?;
                match me.center_id {
                    Some(center_id) => Ok(vec![self.port.get_center(center_id).await?]),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Reports which center a coordinator owns
    #[instrument(skip(self, session), fields(actor = %session.user_id, coordinator = %coordinator_id))]
    pub async fn find_center_for_coordinator(
        &self,
        session: &SessionContext,
        coordinator_id: UserId,
    ) -> Result<CenterMembership, TenancyError> {
        let user = self.port.get_user(coordinator_id).await?;
        let center = self.port.find_center_by_coordinator(coordinator_id).await?;

        let chain = OwnerChain {
            center_id: center.as_ref().map(|c| c.id),
            coordinator_id: Some(user.id),
            owner_id: Some(user.id),
        };
        authorize(session, Action::Read, &chain)?;

        if !user.is_coordinator() {
            return Err(TenancyError::InvalidRequest(format!("user {} is not a coordinator", user.id)));
        }

        Ok(match center {
            Some(center) => CenterMembership::Assigned { center, department: None },
            None => CenterMembership::Unassigned,
        })
    }

    /// Reports which center (and department) a lecturer belongs to
    #[instrument(skip(self, session), fields(actor = %session.user_id, lecturer = %lecturer_id))]
    pub async fn find_center_for_lecturer(
        &self,
        session: &SessionContext,
        lecturer_id: UserId,
    ) -> Result<CenterMembership, TenancyError> {
        let user = self.port.get_user(lecturer_id).await?;
        let center = match user.center_id {
            Some(center_id) => Some(self.port.get_center(center_id).await?),
            None => None,
        };

        let chain = match &center {
            Some(center) => center.owner_chain().owned_by(user.id),
            None => OwnerChain::unassigned_owner(user.id),
        };
        authorize(session, Action::Read, &chain)?;

        if !user.is_lecturer() {
            return Err(TenancyError::InvalidRequest(format!("user {} is not a lecturer", user.id)));
        }

        match center {
            Some(center) => {
                let department = match user.department_id {
                    Some(department_id) => Some(self.port.get_department(department_id).await?),
                    None => None,
                };
                Ok(CenterMembership::Assigned { center, department })
            }
            None => Ok(CenterMembership::Unassigned),
        }
    }

    /// Lists the departments of a center
    #[instrument(skip(self, session), fields(actor = %session.user_id, center = %center_id))]
    pub async fn list_departments(
        &self,
        session: &SessionContext,
        center_id: CenterId,
    ) -> Result<Vec<Department>, TenancyError> {
        let center = self.port.get_center(center_id).await?;
        let chain = self.read_chain(session, &center).await?;
        authorize(session, Action::Read, &chain)?;
        Ok(self.port.list_departments(center.id).await?)
    }

    /// Lists the lecturers of a center
    #[instrument(skip(self, session), fields(actor = %session.user_id, center = %center_id))]
    pub async fn list_lecturers(
        &self,
        session: &SessionContext,
        center_id: CenterId,
    ) -> Result<Vec<User>, TenancyError> {
        let center = self.port.get_center(center_id).await?;
        authorize(session, Action::Manage, &center.owner_chain())?;
        Ok(self.port.list_lecturers(center.id).await?)
    }

    /// Lists lecturers waiting for a center
    ///
    /// Available to Registry and to coordinators that own a center.
    #[instrument(skip(self, session), fields(actor = %session.user_id))]
    pub async fn list_unassigned_lecturers(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<User>, TenancyError> {
        let chain = match session.role {
            Role::Coordinator => self
                .port
                .find_center_by_coordinator(session.user_id)
                .await?
                .map(|c| c.owner_chain())
                .unwrap_or_default(),
            _ => OwnerChain::unscoped(),
        };
        authorize(session, Action::Manage, &chain)?;
        Ok(self.port.list_unassigned_lecturers().await?)
    }

    // ========================================================================
    // Lecturer assignment
    // ========================================================================

    /// Binds an unassigned lecturer to a center
    ///
    /// # Errors
    ///
    /// * `NotFound` if the center is missing or outside the caller's scope
    /// * `AlreadyAssigned` if the lecturer already has a center, this one included
    #[instrument(skip(self, session), fields(actor = %session.user_id, lecturer = %lecturer_id, center = %center_id))]
    pub async fn assign_lecturer_to_center(
        &self,
        session: &SessionContext,
        lecturer_id: UserId,
        center_id: CenterId,
    ) -> Result<User, TenancyError> {
        let center = self.port.get_center(center_id).await?;
        authorize(session, Action::Manage, &center.owner_chain())?;

        let lecturer = self.require_lecturer(lecturer_id).await?;
        if let Some(current) = lecturer.center_id {
            warn!(current = %current, "Lecturer is already bound to a center");
            return Err(TenancyError::AlreadyAssigned(format!(
                "lecturer {} already belongs to a center",
                lecturer_id
            )));
        }

        if !self.port.bind_lecturer_to_center(lecturer_id, center.id).await? {
            warn!("Lecturer was bound concurrently");
            return Err(TenancyError::AlreadyAssigned(format!(
                "lecturer {} already belongs to a center",
                lecturer_id
            )));
        }

        info!("Lecturer assigned to center");
        Ok(self.port.get_user(lecturer_id).await?)
    }

    /// Releases a lecturer from its center (and department)
    #[instrument(skip(self, session), fields(actor = %session.user_id, lecturer = %lecturer_id))]
    pub async fn unassign_lecturer_from_center(
        &self,
        session: &SessionContext,
        lecturer_id: UserId,
    ) -> Result<User, TenancyError> {
        let (lecturer, center) = self.lecturer_under_management(session, lecturer_id).await?;

        if !self.port.release_lecturer_from_center(lecturer.id, center.id).await? {
            return Err(TenancyError::NotAssigned(format!(
                "lecturer {} is no longer in center {}",
                lecturer.id, center.id
            )));
        }

        info!(center = %center.id, "Lecturer unassigned from center");
        Ok(self.port.get_user(lecturer.id).await?)
    }

    /// Places a lecturer in a department of its own center
    #[instrument(skip(self, session), fields(actor = %session.user_id, lecturer = %lecturer_id, department = %department_id))]
    pub async fn assign_lecturer_to_department(
        &self,
        session: &SessionContext,
        lecturer_id: UserId,
        department_id: DepartmentId,
    ) -> Result<User, TenancyError> {
        let department = self.port.get_department(department_id).await?;
        let center = self.port.get_center(department.center_id).await?;
        authorize(session, Action::Manage, &center.owner_chain())?;

        let lecturer = self.require_lecturer(lecturer_id).await?;
        match lecturer.center_id {
            None => {
                return Err(TenancyError::NotAssigned(format!(
                    "lecturer {} is not assigned to a center",
                    lecturer.id
                )))
            }
            Some(current) if current != center.id => {
                return Err(TenancyError::not_found("Lecturer", lecturer.id));
            }
            Some(_) => {}
        }

        if !self
            .port
            .set_lecturer_department(lecturer.id, center.id, Some(department.id))
            .await?
        {
            return Err(TenancyError::NotAssigned(format!(
                "lecturer {} left center {}",
                lecturer.id, center.id
            )));
        }

        info!("Lecturer assigned to department");
        Ok(self.port.get_user(lecturer.id).await?)
    }

    /// Removes a lecturer from its department, keeping the center
    #[instrument(skip(self, session), fields(actor = %session.user_id, lecturer = %lecturer_id))]
    pub async fn unassign_lecturer_from_department(
        &self,
        session: &SessionContext,
        lecturer_id: UserId,
    ) -> Result<User, TenancyError> {
        let (lecturer, center) = self.lecturer_under_management(session, lecturer_id).await?;

        if lecturer.department_id.is_none() {
            return Err(TenancyError::NotAssigned(format!(
                "lecturer {} has no department",
                lecturer.id
            )));
        }

        if !self.port.set_lecturer_department(lecturer.id, center.id, None).await? {
            return Err(TenancyError::NotAssigned(format!(
                "lecturer {} left center {}",
                lecturer.id, center.id
            )));
        }

        info!("Lecturer unassigned from department");
        Ok(self.port.get_user(lecturer.id).await?)
    }

    // ========================================================================
    // Departments
    // ========================================================================

    /// Creates a department inside a center
    ///
    /// # Errors
    ///
    /// * `DuplicateName` if the center already has a department with this name
    #[instrument(skip(self, session), fields(actor = %session.user_id, center = %center_id))]
    pub async fn create_department(
        &self,
        session: &SessionContext,
        center_id: CenterId,
        name: &str,
    ) -> Result<Department, TenancyError> {
        let center = self.port.get_center(center_id).await?;
        authorize(session, Action::Manage, &center.owner_chain())?;

        let name = normalize_name(name)
            .ok_or_else(|| TenancyError::InvalidRequest("department name must not be blank".to_string()))?;

        let department = self
            .port
            .create_department(Department::new(center.id, name.clone()))
            .await
            .map_err(|e| {
                if e.is_conflict_on("name") {
                    TenancyError::DuplicateName(format!("department '{}' already exists in this center", name))
                } else {
                    e.into()
                }
            })?;

        info!(department_id = %department.id, "Department created");
        Ok(department)
    }

    /// Deletes a department after releasing its lecturers
    ///
    /// Returns the number of lecturers whose department was cleared. No user
    /// record is deleted.
    #[instrument(skip(self, session), fields(actor = %session.user_id, department = %department_id))]
    pub async fn delete_department(
        &self,
        session: &SessionContext,
        department_id: DepartmentId,
    ) -> Result<u64, TenancyError> {
        let department = self.port.get_department(department_id).await?;
        let center = self.port.get_center(department.center_id).await?;
        authorize(session, Action::Manage, &center.owner_chain())?;

        let released = self.port.delete_department(department.id).await?;
        info!(released, "Department deleted");
        Ok(released)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Chain for reading center-level context; lecturers own their membership
    async fn read_chain(
        &self,
        session: &SessionContext,
        center: &Center,
    ) -> Result<OwnerChain, TenancyError> {
        let chain = center.owner_chain();
        if session.role != Role::Lecturer {
            return Ok(chain);
        }
        let me = self.port.get_user(session.user_id).await?;
        if me.center_id == Some(center.id) {
            Ok(chain.owned_by(me.id))
        } else {
            Ok(chain)
        }
    }

    /// Loads a lecturer and its center, checking the caller manages it
    async fn lecturer_under_management(
        &self,
        session: &SessionContext,
        lecturer_id: UserId,
    ) -> Result<(User, Center), TenancyError> {
        let lecturer = self.port.get_user(lecturer_id).await?;
        let center = match lecturer.center_id {
            Some(center_id) => Some(self.port.get_center(center_id).await?),
            None => None,
        };

        let chain = center
            .as_ref()
            .map(|c| c.owner_chain().owned_by(lecturer.id))
            .unwrap_or_else(|| OwnerChain::unassigned_owner(lecturer.id));
        authorize(session, Action::Manage, &chain)?;

        if !lecturer.is_lecturer() {
            return Err(TenancyError::InvalidRequest(format!("user {} is not a lecturer", lecturer.id)));
        }

        match center {
            Some(center) => Ok((lecturer, center)),
            None => Err(TenancyError::NotAssigned(format!(
                "lecturer {} is not assigned to a center",
                lecturer.id
            ))),
        }
    }

    async fn require_coordinator(&self, user_id: UserId) -> Result<User, TenancyError> {
        let user = self.port.get_user(user_id).await?;
        if !user.is_coordinator() {
            return Err(TenancyError::InvalidRequest(format!("user {} is not a coordinator", user_id)));
        }
        Ok(user)
    }

    async fn require_lecturer(&self, user_id: UserId) -> Result<User, TenancyError> {
        let user = self.port.get_user(user_id).await?;
        if !user.is_lecturer() {
            return Err(TenancyError::InvalidRequest(format!("user {} is not a lecturer", user_id)));
        }
        Ok(user)
    }
}

/// Same rule the HTTP layer applies to `CreateUserRequest::email`
fn is_valid_email(email: &str) -> bool {
    email.trim().to_string().validate_email()
}
