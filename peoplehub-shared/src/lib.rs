//! # PeopleHub Shared Library
//!
//! Types, data access and auth primitives used by the PeopleHub API server.
//!
//! ## Module Organization
//!
//! - `tenancy`: tenant resolution, the tenant-scoped query layer and the
//!   ownership guard
//! - `models`: tenants and the tenant-owned HR/recruitment entities
//! - `auth`: password hashing, JWT access tokens, auth middleware
//! - `db`: connection pool and embedded migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod tenancy;

/// Current version of the PeopleHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
