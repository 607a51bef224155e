/// Middleware for the API server
///
/// - `tenant`: resolves the request host to a tenant before anything else
/// - `auth`: employee token, liveness and revocation checks
/// - `admin`: guards the provisioning routes with the admin token
/// - `security`: security response headers

pub mod admin;
pub mod auth;
pub mod security;
pub mod tenant;
