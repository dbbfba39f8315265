//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the tenant graph and claims, using SQLx with
//! runtime-checked queries.
//!
//! # Concurrency
//!
//! Invariants that must survive concurrent requests are enforced by the
//! database itself: unique constraints for names and coordinator ownership,
//! and single conditional `UPDATE` statements for claim transitions and
//! lecturer binding.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresClaimsAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
//! run_migrations(&pool).await?;
//! let claims = PostgresClaimsAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresClaimsAdapter, PostgresTenantAdapter};
