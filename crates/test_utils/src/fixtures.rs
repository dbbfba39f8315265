//! Pre-built Test Fixtures
//!
//! [`TestWorld`] wires both services over one [`MemoryStore`] and seeds the
//! tenant graph through the real service operations, so fixtures obey the
//! same rules as production data.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use core_kernel::{Role, SessionContext, UserId};
use domain_claims::{Claim, ClaimPayload, ClaimType, ClaimsService};
use domain_tenancy::{Center, Department, NewUser, TenancyService, TenantPort};

use crate::generators::{fake_email, fake_name};
use crate::memory::MemoryStore;

/// Fixed dates and times used across claim fixtures
pub struct CalendarFixtures;

impl CalendarFixtures {
    pub fn lecture_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }

    pub fn exam_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
    }

    pub fn morning_start() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    /// Two and a half hours after `morning_start`
    pub fn morning_end() -> NaiveTime {
        NaiveTime::from_hms_opt(10, 30, 0).unwrap()
    }
}

/// Services, store and a registry session ready for a test
pub struct TestWorld {
    pub store: Arc<MemoryStore>,
    pub tenancy: TenancyService,
    pub claims: ClaimsService,
    pub registry: SessionContext,
}

/// A center together with its coordinator's session
pub struct SeededCenter {
    pub center: Center,
    pub coordinator: SessionContext,
}

impl TestWorld {
    /// Creates an empty world holding a single registry user
    pub async fn new() -> Self {
        let store = MemoryStore::shared();
        let tenancy = TenancyService::new(store.clone());
        let claims = ClaimsService::new(store.clone(), store.clone());

        let registry_user = NewUser::new("Registry Office", "registry@example.org", Role::Registry).into_user();
        let registry_id = registry_user.id;
        store
            .create_user(registry_user)
            .await
            .expect("seed registry user");

        Self {
            store,
            tenancy,
            claims,
            registry: SessionContext::registry(registry_id),
        }
    }

    /// Registers a user with a generated name and email
    pub async fn user(&self, role: Role) -> UserId {
        self.named_user(&fake_name(), role).await
    }

    pub async fn named_user(&self, name: &str, role: Role) -> UserId {
        self.tenancy
            .create_user(&self.registry, NewUser::new(name, fake_email(), role))
            .await
            .expect("create user")
            .id
    }

    /// A coordinator with no center yet
    pub async fn coordinator(&self) -> SessionContext {
        SessionContext::coordinator(self.user(Role::Coordinator).await)
    }

    /// A lecturer with no center yet
    pub async fn lecturer(&self) -> SessionContext {
        SessionContext::lecturer(self.user(Role::Lecturer).await)
    }

    /// A new center with a new coordinator
    pub async fn center(&self, name: &str) -> SeededCenter {
        let coordinator = self.coordinator().await;
        let center = self
            .tenancy
            .create_center(&self.registry, name, coordinator.user_id)
            .await
            .expect("create center");
        SeededCenter { center, coordinator }
    }

    /// A lecturer already assigned to `center`
    pub async fn lecturer_in(&self, center: &SeededCenter) -> SessionContext {
        let lecturer = self.lecturer().await;
        self.tenancy
            .assign_lecturer_to_center(&center.coordinator, lecturer.user_id, center.center.id)
            .await
            .expect("assign lecturer");
        lecturer
    }

    pub async fn department(&self, center: &SeededCenter, name: &str) -> Department {
        self.tenancy
            .create_department(&center.coordinator, center.center.id, name)
            .await
            .expect("create department")
    }

    /// Submits a claim as `lecturer`
    pub async fn submit(&self, lecturer: &SessionContext, claim_type: ClaimType, payload: ClaimPayload) -> Claim {
        self.claims
            .create_claim(lecturer, claim_type, payload)
            .await
            .expect("submit claim")
    }
}
