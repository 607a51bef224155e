/// API route handlers, one module per resource
///
/// - `health`: liveness and database check
/// - `admin`: tenant provisioning (admin token)
/// - `auth`: employee login and the current employee
/// - `departments`, `positions`, `teams`, `employees`: organization
/// - `contracts`: employment contracts
/// - `leave_types`, `leave_requests`: leave management
/// - `job_postings`, `candidates`, `interviews`: recruitment
///
/// Every `/v1` handler receives the resolved `TenantContext` as an
/// extension and passes it to the model layer; none of them builds a query
/// without it.

pub mod admin;
pub mod auth;
pub mod candidates;
pub mod contracts;
pub mod departments;
pub mod employees;
pub mod health;
pub mod interviews;
pub mod job_postings;
pub mod leave_requests;
pub mod leave_types;
pub mod positions;
pub mod teams;

use peoplehub_shared::auth::password;

use crate::error::ApiResult;

/// Hashes a password off the async runtime
pub(crate) async fn hash_password(plain: String) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain)).await??;
    Ok(hash)
}

/// Verifies a password off the async runtime
pub(crate) async fn verify_password(plain: String, hash: String) -> ApiResult<bool> {
    let valid = tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash)).await??;
    Ok(valid)
}
