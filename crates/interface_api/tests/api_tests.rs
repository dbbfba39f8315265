//! HTTP tests over the in-memory store

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use core_kernel::SessionContext;
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{ClaimPayloadBuilder, SeededCenter, TestWorld};

const SECRET: &str = "api-test-secret";

struct Harness {
    world: TestWorld,
    server: TestServer,
}

impl Harness {
    async fn new() -> Self {
        let world = TestWorld::new().await;
        let config = ApiConfig {
            jwt_secret: SECRET.to_string(),
            ..ApiConfig::default()
        };
        let state = AppState::new(world.store.clone(), world.store.clone(), world.store.clone(), config);
        let server = TestServer::new(create_router(state)).unwrap();
        Self { world, server }
    }
}

fn token(session: &SessionContext) -> String {
    create_token(session.user_id, session.role, SECRET, 300).unwrap()
}

fn id_of(session: &SessionContext) -> String {
    session.user_id.as_uuid().to_string()
}

async fn seeded_claims(h: &Harness) -> (SeededCenter, SessionContext, Vec<String>) {
    let north = h.world.center("North Campus").await;
    let lecturer = h.world.lecturer_in(&north).await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let (claim_type, payload) = ClaimPayloadBuilder::teaching().into_parts();
        let claim = h.world.submit(&lecturer, claim_type, payload).await;
        ids.push(claim.id().as_uuid().to_string());
    }
    (north, lecturer, ids)
}

// ============================================================================
// Health and sessions
// ============================================================================

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let h = Harness::new().await;
        h.server.get("/health").await.assert_status_ok();

        let ready = h.server.get("/health/ready").await;
        ready.assert_status_ok();
        assert_eq!(ready.json::<Value>()["status"], "ready");
    }

    #[tokio::test]
    async fn test_missing_or_bad_token_is_401() {
        let h = Harness::new().await;

        let response = h.server.get("/api/v1/centers").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "unauthenticated");

        h.server
            .get("/api/v1/centers")
            .authorization_bearer("not-a-jwt")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// Claims
// ============================================================================

mod claims_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_lecturer_submits_claim() {
        let h = Harness::new().await;
        let north = h.world.center("North Campus").await;
        let lecturer = h.world.lecturer_in(&north).await;

        let response = h
            .server
            .post("/api/v1/claims")
            .authorization_bearer(token(&lecturer))
            .json(&json!({
                "claim_type": "teaching",
                "date": "2024-03-12",
                "start_time": "08:00:00",
                "end_time": "10:30:00"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "pending");
        assert_eq!(body["claim_type"], "teaching");
        assert_eq!(body["center_id"], north.center.id.as_uuid().to_string());
        let hours: f64 = body["contact_hours"].as_str().unwrap().parse().unwrap();
        assert_eq!(hours, 2.5);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_422_with_details() {
        let h = Harness::new().await;
        let north = h.world.center("North Campus").await;
        let lecturer = h.world.lecturer_in(&north).await;

        let response = h
            .server
            .post("/api/v1/claims")
            .authorization_bearer(token(&lecturer))
            .json(&json!({
                "claim_type": "transportation",
                "transport_type": "public",
                "origin": "Main Campus",
                "destination": "Nakuru",
                "amount": "300.00",
                "registration_number": "KDA 123X"
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "invalid_claim_payload");
        let details = body["details"].as_array().unwrap();
        assert!(details.iter().any(|d| d.as_str().unwrap().contains("registration_number")));
    }

    #[tokio::test]
    async fn test_coordinator_cannot_submit() {
        let h = Harness::new().await;
        let north = h.world.center("North Campus").await;

        h.server
            .post("/api/v1/claims")
            .authorization_bearer(token(&north.coordinator))
            .json(&json!({ "claim_type": "teaching" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_approve_then_conflict() {
        let h = Harness::new().await;
        let (north, _, ids) = seeded_claims(&h).await;
        let path = format!("/api/v1/claims/{}/approve", ids[0]);

        let approved = h.server.post(&path).authorization_bearer(token(&north.coordinator)).await;
        approved.assert_status_ok();
        assert_eq!(approved.json::<Value>()["status"], "approved");

        h.server
            .post(&format!("/api/v1/claims/{}/reject", ids[0]))
            .authorization_bearer(token(&north.coordinator))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_registry_cannot_approve_and_foreign_coordinator_sees_404() {
        let h = Harness::new().await;
        let (_, _, ids) = seeded_claims(&h).await;
        let south = h.world.center("South Campus").await;
        let path = format!("/api/v1/claims/{}/approve", ids[0]);

        h.server
            .post(&path)
            .authorization_bearer(token(&h.world.registry))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        h.server
            .post(&path)
            .authorization_bearer(token(&south.coordinator))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_uses_default_scope_and_query() {
        let h = Harness::new().await;
        let (north, lecturer, ids) = seeded_claims(&h).await;
        h.world
            .claims
            .approve_claim(&north.coordinator, ids[0].parse().unwrap())
            .await
            .unwrap();

        let mine = h.server.get("/api/v1/claims").authorization_bearer(token(&lecturer)).await;
        mine.assert_status_ok();
        assert_eq!(mine.json::<Vec<Value>>().len(), 3);

        let approved = h
            .server
            .get("/api/v1/claims")
            .add_query_param("q", "approved")
            .authorization_bearer(token(&north.coordinator))
            .await;
        approved.assert_status_ok();
        assert_eq!(approved.json::<Vec<Value>>().len(), 1);

        let none = h
            .server
            .get("/api/v1/claims")
            .add_query_param("q", "zzz-no-match")
            .authorization_bearer(token(&north.coordinator))
            .await;
        assert!(none.json::<Vec<Value>>().is_empty());
    }

    #[tokio::test]
    async fn test_unassigned_coordinator_lists_nothing() {
        let h = Harness::new().await;
        seeded_claims(&h).await;
        let unassigned = h.world.coordinator().await;

        let response = h.server.get("/api/v1/claims").authorization_bearer(token(&unassigned)).await;
        response.assert_status_ok();
        assert!(response.json::<Vec<Value>>().is_empty());
    }

    #[tokio::test]
    async fn test_registry_must_name_a_scope() {
        let h = Harness::new().await;
        let (north, lecturer, _) = seeded_claims(&h).await;
        let registry = token(&h.world.registry);

        h.server
            .get("/api/v1/claims")
            .authorization_bearer(registry.clone())
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let by_center = h
            .server
            .get("/api/v1/claims")
            .add_query_param("center_id", north.center.id.as_uuid().to_string())
            .authorization_bearer(registry.clone())
            .await;
        assert_eq!(by_center.json::<Vec<Value>>().len(), 3);

        h.server
            .get("/api/v1/claims")
            .add_query_param("center_id", north.center.id.as_uuid().to_string())
            .add_query_param("submitter_id", id_of(&lecturer))
            .authorization_bearer(registry)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Tenant graph
// ============================================================================

mod tenancy_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_creates_users_and_centers() {
        let h = Harness::new().await;
        let registry = token(&h.world.registry);

        let user = h
            .server
            .post("/api/v1/users")
            .authorization_bearer(registry.clone())
            .json(&json!({ "name": "Grace Hopper", "email": "grace@uni.edu", "role": "coordinator" }))
            .await;
        user.assert_status(StatusCode::CREATED);
        let coordinator_id = user.json::<Value>()["id"].as_str().unwrap().to_string();

        h.server
            .post("/api/v1/centers")
            .authorization_bearer(registry.clone())
            .json(&json!({ "name": "West Campus", "coordinator_id": coordinator_id }))
            .await
            .assert_status(StatusCode::CREATED);

        h.server
            .post("/api/v1/users")
            .authorization_bearer(registry.clone())
            .json(&json!({ "name": "Grace Again", "email": "grace@uni.edu", "role": "lecturer" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let invalid = h
            .server
            .post("/api/v1/users")
            .authorization_bearer(registry)
            .json(&json!({ "name": "", "email": "nope", "role": "lecturer" }))
            .await;
        invalid.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.json::<Value>()["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_lecturer_assignment_flow() {
        let h = Harness::new().await;
        let north = h.world.center("North Campus").await;
        let lecturer = h.world.lecturer().await;
        let coordinator = token(&north.coordinator);
        let center_path = format!("/api/v1/lecturers/{}/center", id_of(&lecturer));

        let membership = h.server.get(&center_path).authorization_bearer(coordinator.clone()).await;
        membership.assert_status(StatusCode::NOT_FOUND);

        h.server
            .put(&center_path)
            .authorization_bearer(coordinator.clone())
            .json(&json!({ "center_id": north.center.id.as_uuid() }))
            .await
            .assert_status_ok();

        h.server
            .put(&center_path)
            .authorization_bearer(coordinator.clone())
            .json(&json!({ "center_id": north.center.id.as_uuid() }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let membership = h.server.get(&center_path).authorization_bearer(token(&lecturer)).await;
        membership.assert_status_ok();
        assert_eq!(membership.json::<Value>()["state"], "assigned");
    }

    #[tokio::test]
    async fn test_department_lifecycle() {
        let h = Harness::new().await;
        let north = h.world.center("North Campus").await;
        let lecturer = h.world.lecturer_in(&north).await;
        let coordinator = token(&north.coordinator);
        let departments_path = format!("/api/v1/centers/{}/departments", north.center.id.as_uuid());

        let created = h
            .server
            .post(&departments_path)
            .authorization_bearer(coordinator.clone())
            .json(&json!({ "name": "Physics" }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let department_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

        h.server
            .post(&departments_path)
            .authorization_bearer(coordinator.clone())
            .json(&json!({ "name": "Physics" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        h.server
            .put(&format!("/api/v1/lecturers/{}/department", id_of(&lecturer)))
            .authorization_bearer(coordinator.clone())
            .json(&json!({ "department_id": department_id }))
            .await
            .assert_status_ok();

        let deleted = h
            .server
            .delete(&format!("/api/v1/departments/{}", department_id))
            .authorization_bearer(coordinator.clone())
            .await;
        deleted.assert_status_ok();
        assert_eq!(deleted.json::<Value>()["released_lecturers"], 1);

        let lecturers = h
            .server
            .get(&format!("/api/v1/centers/{}/lecturers", north.center.id.as_uuid()))
            .authorization_bearer(coordinator)
            .await
            .json::<Vec<Value>>();
        assert_eq!(lecturers.len(), 1);
        assert!(lecturers[0]["department_id"].is_null());
    }
}
