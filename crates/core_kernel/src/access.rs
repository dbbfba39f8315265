//! Authorization guard
//!
//! Every service operation resolves the ownership chain of the resource it is
//! about to touch from storage, then asks [`authorize`] whether the session may
//! perform the action. The decision table lives here and nowhere else.
//!
//! ```text
//! Action      Registry    Coordinator            Lecturer
//! Read        allow       chain.coordinator==me  chain.owner==me
//! Manage      allow       chain.coordinator==me  role denied
//! Administer  allow       role denied            role denied
//! Submit      role denied role denied            chain.owner==me, center set
//! Process     role denied chain.coordinator==me  role denied
//! ```
//!
//! Role denials surface to callers as `Unauthorized`. Ownership denials
//! surface as `NotFound` so a caller cannot probe another tenant for the
//! existence of a resource.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::{CenterId, UserId};
use crate::session::{Role, SessionContext};

/// What the caller wants to do with a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read a resource (claim, center context, department, lecturer record)
    Read,
    /// Coordinator-level management inside a center
    Manage,
    /// Registry-level administration of the tenant graph
    Administer,
    /// Submit a new claim into a center
    Submit,
    /// Approve or reject a pending claim
    Process,
}

/// Ownership facts about a resource, resolved from storage for this call
///
/// * `center_id` - the center the resource belongs to, if any
/// * `coordinator_id` - the coordinator of that center
/// * `owner_id` - the user whose own resource this is (claim submitter,
///   lecturer record, or a lecturer's membership in the center)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnerChain {
    pub center_id: Option<CenterId>,
    pub coordinator_id: Option<UserId>,
    pub owner_id: Option<UserId>,
}

impl OwnerChain {
    /// Chain for a resource that belongs to a center
    pub fn center(center_id: CenterId, coordinator_id: UserId) -> Self {
        Self {
            center_id: Some(center_id),
            coordinator_id: Some(coordinator_id),
            owner_id: None,
        }
    }

    /// Chain for a resource with no tenant (e.g. the registry's own objects)
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Marks the resource as owned by a specific user
    pub fn owned_by(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Marks the resource as owned by a user who has no center
    pub fn unassigned_owner(owner_id: UserId) -> Self {
        Self {
            center_id: None,
            coordinator_id: None,
            owner_id: Some(owner_id),
        }
    }
}

/// Why the guard refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// The role may never perform this action
    #[error("role {role} may not {action:?}")]
    Role { role: Role, action: Action },

    /// The resource is outside the caller's tenant
    #[error("resource is outside the caller's scope")]
    Ownership,

    /// The caller has no center and the action needs one
    #[error("{role} is not assigned to a center")]
    Unassigned { role: Role },
}

impl AccessDenied {
    /// True when the denial must be reported as a missing resource
    pub fn hides_existence(&self) -> bool {
        matches!(self, AccessDenied::Ownership)
    }
}

/// Role-level half of the decision table, checked before any resource is
/// loaded so that e.g. a lecturer approving a claim gets `Unauthorized`
/// rather than learning whether the claim exists
pub fn authorize_role(session: &SessionContext, action: Action) -> Result<(), AccessDenied> {
    let allowed = match session.role {
        Role::Registry => matches!(action, Action::Read | Action::Manage | Action::Administer),
        Role::Coordinator => matches!(action, Action::Read | Action::Manage | Action::Process),
        Role::Lecturer => matches!(action, Action::Read | Action::Submit),
    };
    if allowed {
        Ok(())
    } else {
        Err(AccessDenied::Role { role: session.role, action })
    }
}

/// Decides whether `session` may perform `action` on a resource with `chain`
pub fn authorize(
    session: &SessionContext,
    action: Action,
    chain: &OwnerChain,
) -> Result<(), AccessDenied> {
    authorize_role(session, action)?;

    let me = Some(session.user_id);
    let owns = |id: Option<UserId>| id.is_some() && id == me;

    let permitted = match (session.role, action) {
        (Role::Registry, _) => true,
        (Role::Coordinator, _) => owns(chain.coordinator_id),
        (Role::Lecturer, Action::Submit) => {
            if owns(chain.owner_id) && chain.center_id.is_none() {
                return Err(AccessDenied::Unassigned { role: Role::Lecturer });
            }
            owns(chain.owner_id)
        }
        (Role::Lecturer, _) => owns(chain.owner_id),
    };

    if permitted {
        Ok(())
    } else {
        Err(AccessDenied::Ownership)
    }
}
