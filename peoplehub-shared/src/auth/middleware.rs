/// Bearer-token checks for tenant-resolved requests
///
/// A request's `Authorization: Bearer` token is validated and its
/// `tenant_id` must equal the tenant the host resolved to. A valid token for
/// another tenant is `403 Forbidden`, never silently accepted.
///
/// These checks are stateless. Whether the employee still exists and whether
/// the token was revoked is decided by [`super::session`] against the
/// database.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::tenancy::TenantContext;

/// Authenticated employee, scoped to the resolved tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub employee_id: Uuid,
    pub tenant_id: Uuid,

    /// `jti` of the presented token
    pub token_id: Uuid,

    pub expires_at: DateTime<Utc>,
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Token was issued for a different tenant than the host resolved to
    #[error("Token is not valid for this tenant")]
    TenantMismatch,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AuthError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AuthError::TenantMismatch => (StatusCode::FORBIDDEN, "forbidden"),
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Extracts the bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Binds validated claims to the resolved tenant
pub fn authorize_claims(claims: &Claims, tenant: &TenantContext) -> Result<AuthContext, AuthError> {
    if !tenant.owns(claims.tenant_id) {
        warn!(
            tenant_id = %tenant.tenant_id,
            token_tenant_id = %claims.tenant_id,
            employee_id = %claims.sub,
            "Rejected token issued for another tenant"
        );
        return Err(AuthError::TenantMismatch);
    }

    Ok(AuthContext {
        employee_id: claims.sub,
        tenant_id: claims.tenant_id,
        token_id: claims.jti,
        expires_at: DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_default(),
    })
}

/// Authenticates request headers against the resolved tenant
pub fn authenticate(
    headers: &HeaderMap,
    secret: &str,
    tenant: &TenantContext,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    authorize_claims(&claims, tenant)
}
