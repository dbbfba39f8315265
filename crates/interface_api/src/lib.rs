//! HTTP API Layer
//!
//! This crate provides the REST API for the claims system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for claims, the tenant graph and health
//! - **Middleware**: Session resolution and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! Handlers receive the resolved [`core_kernel::SessionContext`] as a request
//! extension and pass it to the services unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::postgres(pool, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::HealthCheckable;
use domain_claims::{ClaimsPort, ClaimsService};
use domain_tenancy::{TenancyService, TenantPort};
use infra_db::{DatabasePool, PostgresClaimsAdapter, PostgresTenantAdapter};

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{claims, tenancy, health};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub claims: ClaimsService,
    pub tenancy: TenancyService,
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over arbitrary port implementations
    pub fn new(
        tenant_port: Arc<dyn TenantPort>,
        claims_port: Arc<dyn ClaimsPort>,
        health: Arc<dyn HealthCheckable>,
        config: ApiConfig,
    ) -> Self {
        Self {
            claims: ClaimsService::new(claims_port, tenant_port.clone()),
            tenancy: TenancyService::new(tenant_port),
            health,
            config,
        }
    }

    /// Wires the services over PostgreSQL
    pub fn postgres(pool: DatabasePool, config: ApiConfig) -> Self {
        let tenants = Arc::new(PostgresTenantAdapter::new(pool.clone()));
        let claims = Arc::new(PostgresClaimsAdapter::new(pool));
        Self::new(tenants.clone(), claims, tenants, config)
    }
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Claims routes
    let claims_routes = Router::new()
        .route("/", post(claims::create_claim).get(claims::list_claims))
        .route("/:id", get(claims::get_claim))
        .route("/:id/approve", post(claims::approve_claim))
        .route("/:id/reject", post(claims::reject_claim));

    // Center routes
    let center_routes = Router::new()
        .route("/", post(tenancy::create_center).get(tenancy::list_centers))
        .route("/:id", get(tenancy::get_center))
        .route("/:id/coordinator", put(tenancy::assign_coordinator))
        .route(
            "/:id/departments",
            get(tenancy::list_departments).post(tenancy::create_department),
        )
        .route("/:id/lecturers", get(tenancy::list_lecturers));

    // Lecturer membership routes
    let lecturer_routes = Router::new()
        .route("/unassigned", get(tenancy::list_unassigned_lecturers))
        .route(
            "/:id/center",
            get(tenancy::find_center_for_lecturer)
                .put(tenancy::assign_lecturer_to_center)
                .delete(tenancy::unassign_lecturer_from_center),
        )
        .route(
            "/:id/department",
            put(tenancy::assign_lecturer_to_department)
                .delete(tenancy::unassign_lecturer_from_department),
        );

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .nest("/centers", center_routes)
        .nest("/lecturers", lecturer_routes)
        .route("/departments/:id", axum::routing::delete(tenancy::delete_department))
        .route("/coordinators/:id/center", get(tenancy::find_center_for_coordinator))
        .route("/users", post(tenancy::create_user))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .map_response(|res: axum::response::Response<_>| res.map(axum::body::Body::new))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
