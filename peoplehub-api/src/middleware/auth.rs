/// Employee authentication for tenant-resolved routes
///
/// Runs inside tenant resolution. The bearer token must be valid and issued
/// for the resolved tenant, its employee must still be live and active, and
/// the token must not have been logged out. On success the
/// [`AuthContext`] is inserted into the request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use peoplehub_shared::{
    auth::{middleware::{authenticate, AuthContext}, session},
    tenancy::TenantContext,
};

use crate::{app::AppState, error::ApiError};

pub async fn employee_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant = req
        .extensions()
        .get::<TenantContext>()
        .cloned()
        .ok_or_else(|| ApiError::InternalError("Tenant context missing".to_string()))?;

    let auth: AuthContext = authenticate(req.headers(), state.jwt_secret(), &tenant)?;

    let mut conn = state.db.acquire().await?;
    session::ensure_active(&mut conn, &tenant, &auth).await?;
    drop(conn);

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}
