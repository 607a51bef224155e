/// Tenant provisioning endpoints
///
/// Guarded by `X-Admin-Token`, not tenant-resolved.
///
/// - `GET /admin/tenants` - list tenants
/// - `POST /admin/tenants` - create a tenant and its first employee
/// - `GET /admin/tenants/:id` - show a tenant
/// - `PUT /admin/tenants/:id` - update name, domain, email or settings
/// - `POST /admin/tenants/:id/activate`
/// - `POST /admin/tenants/:id/deactivate` - stop resolving the tenant;
///   its data is kept
///
/// Tenants are never hard-deleted over HTTP.

use axum::{extract::State, http::StatusCode, Json};
use peoplehub_shared::{
    models::{
        employee::{Employee, NewEmployee},
        tenant::{CreateTenant, Tenant, UpdateTenant},
    },
    tenancy::{resolver::tenant_key_from_host, Page, TenantContext, TenantKey},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
};

/// Tenant plus the employee who will administer it
#[derive(Debug, Deserialize, Validate)]
pub struct ProvisionTenant {
    #[serde(flatten)]
    #[validate(nested)]
    pub tenant: CreateTenant,

    #[validate(nested)]
    pub admin: NewEmployee,
}

#[derive(Debug, Serialize)]
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub admin: Employee,
}

#[derive(Debug, Serialize)]
pub struct TenantList {
    pub tenants: Vec<Tenant>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

fn tenant_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("tenant {} not found", id))
}

/// Refuses a custom domain the resolver would read as a subdomain
///
/// Hosts under the base domain resolve by their first label, so a tenant
/// registered with such a domain could never be reached through it.
fn ensure_resolvable_domain(domain: Option<&str>, base_domain: &str) -> ApiResult<()> {
    match domain.map(|d| tenant_key_from_host(d, base_domain)) {
        None | Some(Some(TenantKey::Domain(_))) => Ok(()),
        Some(_) => Err(ApiError::invalid_field(
            "domain",
            format!("must not be the base domain {} or a host under it", base_domain),
        )),
    }
}

pub async fn list_tenants(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<Page>,
) -> ApiResult<Json<TenantList>> {
    let (limit, offset) = page.clamped();
    let tenants = Tenant::list(&state.db, limit, offset).await?;
    let total = Tenant::count(&state.db).await?;

    Ok(Json(TenantList {
        tenants,
        total,
        limit,
        offset,
    }))
}

/// Creates the tenant and its first employee in one transaction
///
/// # Errors
///
/// - `409 Conflict`: subdomain, domain or employee email already taken
/// - `422 Unprocessable Entity`: validation failed, or the domain lies under
///   the base domain
pub async fn create_tenant(
    State(state): State<AppState>,
    AppJson(req): AppJson<ProvisionTenant>,
) -> ApiResult<(StatusCode, Json<ProvisionedTenant>)> {
    validate_request(&req)?;
    ensure_resolvable_domain(req.tenant.domain.as_deref(), &state.config.api.base_domain)?;

    let ProvisionTenant { tenant, admin } = req;
    let password_hash = super::hash_password(admin.password).await?;

    let mut tx = state.db.begin().await?;

    let tenant = Tenant::create(&mut *tx, tenant).await?;
    let ctx = TenantContext::from_tenant(&tenant);
    let admin = Employee::create(&mut *tx, &ctx, admin.profile, password_hash).await?;

    tx.commit().await?;

    info!(
        tenant_id = %tenant.id,
        subdomain = %tenant.subdomain,
        admin_id = %admin.id,
        "Tenant provisioned"
    );

    Ok((StatusCode::CREATED, Json(ProvisionedTenant { tenant, admin })))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Tenant>> {
    let tenant = Tenant::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| tenant_not_found(id))?;

    Ok(Json(tenant))
}

pub async fn update_tenant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateTenant>,
) -> ApiResult<Json<Tenant>> {
    validate_request(&req)?;
    ensure_resolvable_domain(req.domain.as_deref(), &state.config.api.base_domain)?;

    let tenant = Tenant::update(&state.db, id, req)
        .await?
        .ok_or_else(|| tenant_not_found(id))?;

    Ok(Json(tenant))
}

pub async fn activate_tenant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Tenant>> {
    set_active(&state, id, true).await
}

pub async fn deactivate_tenant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Tenant>> {
    set_active(&state, id, false).await
}

async fn set_active(state: &AppState, id: Uuid, is_active: bool) -> ApiResult<Json<Tenant>> {
    let tenant = Tenant::set_active(&state.db, id, is_active)
        .await?
        .ok_or_else(|| tenant_not_found(id))?;

    info!(tenant_id = %tenant.id, is_active, "Tenant activation changed");
    Ok(Json(tenant))
}
