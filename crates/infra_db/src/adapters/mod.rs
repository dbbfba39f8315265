//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter owns a
//! repository, converts rows to domain values and reports failures as
//! `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresClaimsAdapter, PostgresTenantAdapter};
//!
//! let tenancy: Arc<dyn TenantPort> = Arc::new(PostgresTenantAdapter::new(pool.clone()));
//! let claims: Arc<dyn ClaimsPort> = Arc::new(PostgresClaimsAdapter::new(pool));
//! ```

pub mod tenancy;
pub mod claims;

pub use tenancy::PostgresTenantAdapter;
pub use claims::PostgresClaimsAdapter;
