//! Adapter tests against a real PostgreSQL container
//!
//! Run with `cargo test -p infra_db -- --ignored` on a host with Docker.

use std::sync::Arc;

use core_kernel::{Role, SessionContext};
use domain_claims::{ClaimError, ClaimScope, ClaimStatus, ClaimsService};
use domain_tenancy::{NewUser, TenancyError, TenancyService, TenantPort};
use test_utils::{db_test, fake_email, ClaimPayloadBuilder, TestDatabase};

struct Services {
    tenancy: TenancyService,
    claims: ClaimsService,
    registry: SessionContext,
}

async fn services(db: &TestDatabase) -> Services {
    let (tenant_adapter, claims_adapter) = db.adapters();
    let registry_user = NewUser::new("Registry Office", fake_email(), Role::Registry).into_user();
    let registry = SessionContext::registry(registry_user.id);
    tenant_adapter.create_user(registry_user).await.expect("seed registry");

    Services {
        tenancy: TenancyService::new(tenant_adapter.clone()),
        claims: ClaimsService::new(claims_adapter, tenant_adapter),
        registry,
    }
}

async fn user(s: &Services, role: Role) -> SessionContext {
    let user = s
        .tenancy
        .create_user(&s.registry, NewUser::new("Test User", fake_email(), role))
        .await
        .expect("create user");
    SessionContext { user_id: user.id, role }
}

db_test!(test_unique_constraints_surface_as_domain_errors, |db| {
    let s = services(&db).await;
    let coordinator = user(&s, Role::Coordinator).await;
    let center = s
        .tenancy
        .create_center(&s.registry, "North Campus", coordinator.user_id)
        .await
        .unwrap();

    let other = user(&s, Role::Coordinator).await;
    let duplicate = s.tenancy.create_center(&s.registry, "North Campus", other.user_id).await;
    assert!(matches!(duplicate, Err(TenancyError::DuplicateName(_))), "{:?}", duplicate);

    s.tenancy.create_department(&coordinator, center.id, "Physics").await.unwrap();
    let duplicate = s.tenancy.create_department(&coordinator, center.id, "Physics").await;
    assert!(matches!(duplicate, Err(TenancyError::DuplicateName(_))), "{:?}", duplicate);
});

db_test!(test_department_delete_keeps_users, |db| {
    let s = services(&db).await;
    let coordinator = user(&s, Role::Coordinator).await;
    let center = s
        .tenancy
        .create_center(&s.registry, "North Campus", coordinator.user_id)
        .await
        .unwrap();
    let physics = s.tenancy.create_department(&coordinator, center.id, "Physics").await.unwrap();

    for _ in 0..2 {
        let lecturer = user(&s, Role::Lecturer).await;
        s.tenancy
            .assign_lecturer_to_center(&coordinator, lecturer.user_id, center.id)
            .await
            .unwrap();
        s.tenancy
            .assign_lecturer_to_department(&coordinator, lecturer.user_id, physics.id)
            .await
            .unwrap();
    }

    let released = s.tenancy.delete_department(&coordinator, physics.id).await.unwrap();
    assert_eq!(released, 2);

    let lecturers = s.tenancy.list_lecturers(&coordinator, center.id).await.unwrap();
    assert_eq!(lecturers.len(), 2);
    assert!(lecturers.iter().all(|l| l.department_id.is_none()));
});

db_test!(test_claims_round_trip_and_search, |db| {
    let s = services(&db).await;
    let coordinator = user(&s, Role::Coordinator).await;
    let center = s
        .tenancy
        .create_center(&s.registry, "North Campus", coordinator.user_id)
        .await
        .unwrap();
    let lecturer = user(&s, Role::Lecturer).await;
    s.tenancy
        .assign_lecturer_to_center(&coordinator, lecturer.user_id, center.id)
        .await
        .unwrap();

    let builders = [
        ClaimPayloadBuilder::teaching(),
        ClaimPayloadBuilder::private_transport().with_destination("Kisumu 50%"),
        ClaimPayloadBuilder::examination(),
        ClaimPayloadBuilder::supervision(3),
    ];
    let mut created = Vec::new();
    for builder in builders {
        let (claim_type, payload) = builder.into_parts();
        created.push(s.claims.create_claim(&lecturer, claim_type, payload).await.unwrap());
    }

    for claim in &created {
        let stored = s.claims.get_claim(&coordinator, claim.id()).await.unwrap();
        assert_eq!(stored.details(), claim.details());
        assert_eq!(stored.supervised_students(), claim.supervised_students());
    }

    let scope = ClaimScope::Center(center.id);
    let thesis = s.claims.list_claims(&coordinator, scope, Some("thesis-project")).await.unwrap();
    assert_eq!(thesis.len(), 2);

    // LIKE metacharacters match literally
    let literal = s.claims.list_claims(&coordinator, scope, Some("50%")).await.unwrap();
    assert_eq!(literal.len(), 1);
    let none = s.claims.list_claims(&coordinator, scope, Some("%%")).await.unwrap();
    assert!(none.is_empty());
});

db_test!(test_conditional_transition_has_one_winner, |db| {
    let s = Arc::new(services(&db).await);
    let coordinator = user(&s, Role::Coordinator).await;
    let center = s
        .tenancy
        .create_center(&s.registry, "North Campus", coordinator.user_id)
        .await
        .unwrap();
    let lecturer = user(&s, Role::Lecturer).await;
    s.tenancy
        .assign_lecturer_to_center(&coordinator, lecturer.user_id, center.id)
        .await
        .unwrap();
    let (claim_type, payload) = ClaimPayloadBuilder::teaching().into_parts();
    let claim = s.claims.create_claim(&lecturer, claim_type, payload).await.unwrap();

    let id = claim.id();
    let (a, b) = (s.clone(), s.clone());
    let approve = tokio::spawn(async move { a.claims.approve_claim(&coordinator, id).await });
    let reject = tokio::spawn(async move { b.claims.reject_claim(&coordinator, id).await });
    let results = [approve.await.unwrap(), reject.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(ClaimError::AlreadyProcessed { .. }))));

    let stored = s.claims.get_claim(&coordinator, id).await.unwrap();
    assert_ne!(stored.status(), ClaimStatus::Pending);
    assert_eq!(stored.processed_by(), Some(coordinator.user_id));
});
