//! In-memory Store
//!
//! Implements both `TenantPort` and `ClaimsPort` over plain maps behind a
//! single `tokio::sync::Mutex`, so every port call is atomic in the same way
//! the PostgreSQL statements are. Uniqueness and foreign-key failures are
//! reported with the same `PortError` shapes the database adapter produces.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use core_kernel::{
    AdapterHealth, CenterId, ClaimId, DepartmentId, DomainPort, HealthCheckResult, HealthCheckable,
    PortError, Role, UserId,
};
use domain_claims::{
    Claim, ClaimError, ClaimFilter, ClaimTransition, ClaimsPort, SubmitterInfo, TransitionOutcome,
};
use domain_tenancy::{Center, Department, TenantPort, User};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    centers: BTreeMap<CenterId, Center>,
    departments: BTreeMap<DepartmentId, Department>,
    claims: BTreeMap<ClaimId, Claim>,
}

/// Shared in-memory implementation of every port
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of stored users, for tests asserting nothing was deleted
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn claim_count(&self) -> usize {
        self.state.lock().await.claims.len()
    }
}

impl DomainPort for MemoryStore {}

#[async_trait]
impl HealthCheckable for MemoryStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl TenantPort for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, PortError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(PortError::conflict(format!("email '{}' is taken", user.email), "email"));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, PortError> {
        let state = self.state.lock().await;
        state.users.get(&id).cloned().ok_or_else(|| PortError::not_found("User", id))
    }

    async fn list_lecturers(&self, center_id: CenterId) -> Result<Vec<User>, PortError> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(
            state
                .users
                .values()
                .filter(|u| u.role == Role::Lecturer && u.center_id == Some(center_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_unassigned_lecturers(&self) -> Result<Vec<User>, PortError> {
        let state = self.state.lock().await;
        Ok(sorted_by_name(
            state
                .users
                .values()
                .filter(|u| u.role == Role::Lecturer && u.center_id.is_none())
                .cloned()
                .collect(),
        ))
    }

    async fn create_center(&self, center: Center) -> Result<Center, PortError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&center.coordinator_id) {
            return Err(PortError::validation(format!("user {} does not exist", center.coordinator_id)));
        }
        if state.centers.values().any(|c| c.name == center.name) {
            return Err(PortError::conflict(format!("center '{}' exists", center.name), "name"));
        }
        if state.centers.values().any(|c| c.coordinator_id == center.coordinator_id) {
            return Err(PortError::conflict("coordinator already owns a center", "coordinator_id"));
        }
        state.centers.insert(center.id, center.clone());
        Ok(center)
    }

    async fn get_center(&self, id: CenterId) -> Result<Center, PortError> {
        let state = self.state.lock().await;
        state.centers.get(&id).cloned().ok_or_else(|| PortError::not_found("Center", id))
    }

    async fn list_centers(&self) -> Result<Vec<Center>, PortError> {
        let state = self.state.lock().await;
        let mut centers: Vec<Center> = state.centers.values().cloned().collect();
        centers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(centers)
    }

    async fn find_center_by_coordinator(&self, coordinator_id: UserId) -> Result<Option<Center>, PortError> {
        let state = self.state.lock().await;
        Ok(state.centers.values().find(|c| c.coordinator_id == coordinator_id).cloned())
    }

    async fn set_center_coordinator(&self, center_id: CenterId, coordinator_id: UserId) -> Result<Center, PortError> {
        let mut state = self.state.lock().await;
        if state
            .centers
            .values()
            .any(|c| c.coordinator_id == coordinator_id && c.id != center_id)
        {
            return Err(PortError::conflict("coordinator already owns a center", "coordinator_id"));
        }
        let center = state
            .centers
            .get_mut(&center_id)
            .ok_or_else(|| PortError::not_found("Center", center_id))?;
        center.coordinator_id = coordinator_id;
        Ok(center.clone())
    }

    async fn create_department(&self, department: Department) -> Result<Department, PortError> {
        let mut state = self.state.lock().await;
        if !state.centers.contains_key(&department.center_id) {
            return Err(PortError::validation(format!("center {} does not exist", department.center_id)));
        }
        if state
            .departments
            .values()
            .any(|d| d.center_id == department.center_id && d.name == department.name)
        {
            return Err(PortError::conflict(format!("department '{}' exists", department.name), "name"));
        }
        state.departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Department, PortError> {
        let state = self.state.lock().await;
        state.departments.get(&id).cloned().ok_or_else(|| PortError::not_found("Department", id))
    }

    async fn list_departments(&self, center_id: CenterId) -> Result<Vec<Department>, PortError> {
        let state = self.state.lock().await;
        let mut departments: Vec<Department> = state
            .departments
            .values()
            .filter(|d| d.center_id == center_id)
            .cloned()
            .collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<u64, PortError> {
        let mut state = self.state.lock().await;
        if state.departments.remove(&id).is_none() {
            return Err(PortError::not_found("Department", id));
        }
        let mut released = 0;
        for user in state.users.values_mut().filter(|u| u.department_id == Some(id)) {
            user.department_id = None;
            released += 1;
        }
        Ok(released)
    }

    async fn bind_lecturer_to_center(&self, lecturer_id: UserId, center_id: CenterId) -> Result<bool, PortError> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&lecturer_id) {
            Some(user) if user.role == Role::Lecturer && user.center_id.is_none() => {
                user.center_id = Some(center_id);
                user.department_id = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_lecturer_from_center(&self, lecturer_id: UserId, center_id: CenterId) -> Result<bool, PortError> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&lecturer_id) {
            Some(user) if user.center_id == Some(center_id) => {
                user.center_id = None;
                user.department_id = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_lecturer_department(
        &self,
        lecturer_id: UserId,
        center_id: CenterId,
        department_id: Option<DepartmentId>,
    ) -> Result<bool, PortError> {
        let mut state = self.state.lock().await;
        if let Some(department_id) = department_id {
            match state.departments.get(&department_id) {
                Some(d) if d.center_id == center_id => {}
                _ => {
                    return Err(PortError::validation(format!(
                        "department {} is not in center {}",
                        department_id, center_id
                    )))
                }
            }
        }
        match state.users.get_mut(&lecturer_id) {
            Some(user) if user.center_id == Some(center_id) => {
                user.department_id = department_id;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ClaimsPort for MemoryStore {
    async fn insert_claim(&self, claim: Claim) -> Result<Claim, PortError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&claim.submitted_by()) {
            return Err(PortError::validation(format!("user {} does not exist", claim.submitted_by())));
        }
        if !state.centers.contains_key(&claim.center_id()) {
            return Err(PortError::validation(format!("center {} does not exist", claim.center_id())));
        }
        if state.claims.contains_key(&claim.id()) {
            return Err(PortError::conflict(format!("claim {} exists", claim.id()), "id"));
        }
        state.claims.insert(claim.id(), claim.clone());
        Ok(claim)
    }

    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        let state = self.state.lock().await;
        state.claims.get(&id).cloned().ok_or_else(|| PortError::not_found("Claim", id))
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, PortError> {
        let state = self.state.lock().await;
        let mut claims: Vec<Claim> = state
            .claims
            .values()
            .filter(|claim| {
                let submitter = state
                    .users
                    .get(&claim.submitted_by())
                    .map(|u| SubmitterInfo { name: u.name.clone(), email: u.email.clone() })
                    .unwrap_or(SubmitterInfo { name: String::new(), email: String::new() });
                filter.matches(claim, &submitter)
            })
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.submitted_at().cmp(&a.submitted_at()).then(b.id().cmp(&a.id())));
        Ok(claims)
    }

    async fn transition_claim(&self, transition: &ClaimTransition) -> Result<TransitionOutcome, PortError> {
        let mut state = self.state.lock().await;
        let Some(claim) = state
            .claims
            .get_mut(&transition.claim_id)
            .filter(|c| c.center_id() == transition.center_id)
        else {
            return Ok(TransitionOutcome::Missing);
        };

        match claim.apply(transition) {
            Ok(()) => Ok(TransitionOutcome::Applied(claim.clone())),
            Err(ClaimError::AlreadyProcessed { status, .. }) => Ok(TransitionOutcome::AlreadyProcessed(status)),
            Err(other) => Err(PortError::internal(other.to_string())),
        }
    }
}

fn sorted_by_name(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    users
}
