/// Tenant resolution middleware
///
/// Reads the `Host` header (falling back to the URI authority), resolves it
/// through the configured [`TenantDirectory`] and inserts the resulting
/// [`TenantContext`] into the request extensions. An unknown or inactive
/// tenant ends the request with `404 tenant_not_found` before any handler
/// or scoped query runs.
///
/// [`TenantDirectory`]: peoplehub_shared::tenancy::TenantDirectory

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use peoplehub_shared::tenancy::{resolve_tenant, TenantContext};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

/// Host the client addressed, without the port
fn request_host(req: &Request) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().host().map(str::to_string))
}

pub async fn resolve_tenant_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let host = request_host(&req);

    let tenant: TenantContext = resolve_tenant(
        state.tenants.as_ref(),
        host.as_deref(),
        &state.config.api.base_domain,
    )
    .await?;

    debug!(tenant_id = %tenant.tenant_id, subdomain = %tenant.subdomain, "Tenant resolved");
    req.extensions_mut().insert(tenant);

    Ok(next.run(req).await)
}
