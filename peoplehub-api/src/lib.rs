//! # PeopleHub API Server Library
//!
//! HTTP surface of PeopleHub: every `/v1` request is resolved to a tenant
//! from its `Host` header before it reaches a handler, and every handler
//! works through the tenant-scoped models in `peoplehub-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors with JSON rejections
//! - `middleware`: Tenant resolution, admin guard, security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
