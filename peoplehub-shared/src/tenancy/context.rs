/// Request-scoped tenant context
///
/// A `TenantContext` is created by the tenant resolver at the start of a
/// request and dropped with the request. It is never stored globally: every
/// scoped operation receives it as an explicit `&TenantContext` argument.

use serde::Serialize;
use uuid::Uuid;

use crate::models::tenant::Tenant;

/// The tenant a request has been resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantContext {
    /// Resolved tenant ID; bound into every scoped query
    pub tenant_id: Uuid,

    /// Subdomain the tenant was resolved from (or registered under)
    pub subdomain: String,

    /// Display name
    pub name: String,
}

impl TenantContext {
    /// Builds a context for a tenant record
    pub fn from_tenant(tenant: &Tenant) -> Self {
        Self {
            tenant_id: tenant.id,
            subdomain: tenant.subdomain.clone(),
            name: tenant.name.clone(),
        }
    }

    /// Whether a row owned by `tenant_id` belongs to this context
    pub fn owns(&self, tenant_id: Uuid) -> bool {
        self.tenant_id == tenant_id
    }
}
