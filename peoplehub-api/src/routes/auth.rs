/// Employee authentication endpoints
///
/// - `POST /v1/auth/login` - exchange email + password for an access token
/// - `GET /v1/auth/me` - the authenticated employee and tenant
/// - `POST /v1/auth/logout` - revoke the presented token
///
/// Login is tenant-resolved: the email is looked up only among the
/// employees of the tenant the `Host` header names, and the issued token
/// carries that tenant's id. The same email may exist in several tenants.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Duration;
use peoplehub_shared::{
    auth::{jwt, middleware::AuthContext, session},
    models::employee::Employee,
    tenancy::{scope, TenantContext},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    extract::AppJson,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,

    /// Seconds until the token expires
    pub expires_in: i64,

    pub employee: Employee,
    pub tenant: TenantContext,
}

/// Current employee
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub employee: Employee,
    pub tenant: TenantContext,
}

/// Login endpoint
///
/// ```text
/// POST /v1/auth/login
/// Host: acme.peoplehub.io
///
/// { "email": "ada@acme.io", "password": "..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password
/// - `403 Forbidden`: the employee account is inactive
/// - `422 Unprocessable Entity`: validation failed
pub async fn login(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_request(&req)?;

    let mut conn = state.db.acquire().await?;
    let employee = Employee::find_for_login(&mut conn, &tenant, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;
    drop(conn);

    if !super::verify_password(req.password, employee.password_hash.clone()).await? {
        warn!(tenant_id = %tenant.tenant_id, employee_id = %employee.id, "Failed login attempt");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    if !employee.is_active {
        return Err(ApiError::Forbidden("Employee account is inactive".to_string()));
    }

    let claims = jwt::Claims::new(
        employee.id,
        tenant.tenant_id,
        Duration::minutes(state.config.jwt.access_token_minutes),
    );
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    info!(tenant_id = %tenant.tenant_id, employee_id = %employee.id, "Employee logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: claims.expires_in_seconds(),
        employee,
        tenant,
    }))
}

/// Current employee endpoint
pub async fn me(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let mut conn = state.db.acquire().await?;
    let employee: Employee = scope::find(&mut conn, &tenant, auth.employee_id).await?;

    Ok(Json(MeResponse { employee, tenant }))
}

/// Logout endpoint
///
/// Revokes the token the request was made with; other tokens of the same
/// employee stay valid. Returns `204 No Content`.
pub async fn logout(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    session::revoke(&mut conn, &tenant, &auth).await?;

    Ok(StatusCode::NO_CONTENT)
}
