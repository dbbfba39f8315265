//! Request handlers, one module per resource

pub mod claims;
pub mod tenancy;
pub mod health;
