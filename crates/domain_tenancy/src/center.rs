//! Centers and departments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CenterId, DepartmentId, OwnerChain, UserId};

/// A tenant boundary with exactly one coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
    pub id: CenterId,
    pub name: String,
    pub coordinator_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Center {
    pub fn new(name: impl Into<String>, coordinator_id: UserId) -> Self {
        Self {
            id: CenterId::new(),
            name: name.into(),
            coordinator_id,
            created_at: Utc::now(),
        }
    }

    /// Ownership chain of anything that lives inside this center
    pub fn owner_chain(&self) -> OwnerChain {
        OwnerChain::center(self.id, self.coordinator_id)
    }
}

/// A department within a center
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub center_id: CenterId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Department {
    pub fn new(center_id: CenterId, name: impl Into<String>) -> Self {
        Self {
            id: DepartmentId::new(),
            center_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Where a coordinator or lecturer sits in the tenant graph
///
/// Being unassigned is a normal, reportable state rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CenterMembership {
    Assigned {
        center: Center,
        department: Option<Department>,
    },
    Unassigned,
}

impl CenterMembership {
    pub fn center(&self) -> Option<&Center> {
        match self {
            CenterMembership::Assigned { center, .. } => Some(center),
            CenterMembership::Unassigned => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, CenterMembership::Assigned { .. })
    }
}

/// Normalizes a center or department name; `None` when nothing is left
pub(crate) fn normalize_name(name: &str) -> Option<String> {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
