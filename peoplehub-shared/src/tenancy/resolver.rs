/// Tenant resolution from the request host
///
/// A request names its tenant through the `Host` header:
///
/// ```text
/// acme.hr.example.com   -> subdomain "acme"   (base domain hr.example.com)
/// people.acme.io        -> custom domain "people.acme.io"
/// hr.example.com        -> no tenant
/// ```
///
/// Only active tenants resolve. Anything else yields
/// [`ResolveError::TenantNotFound`] before any scoped data is read.
///
/// Lookups go through the [`TenantDirectory`] trait so the HTTP layer can be
/// exercised against [`InMemoryTenantDirectory`] without a database.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::context::TenantContext;
use crate::models::tenant::Tenant;

/// What the host names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantKey {
    /// Single label under the configured base domain
    Subdomain(String),

    /// A tenant's own (custom) domain
    Domain(String),
}

/// Error type for tenant resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No active tenant matches the host
    #[error("No active tenant for host {0:?}")]
    TenantNotFound(String),

    /// Directory lookup failed
    #[error("Tenant lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

/// Source of tenant records for the resolver
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Finds the active tenant matching `key`, if any
    async fn find_active(&self, key: &TenantKey) -> Result<Option<Tenant>, sqlx::Error>;
}

/// Postgres-backed directory
#[derive(Debug, Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    /// Creates a directory over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find_active(&self, key: &TenantKey) -> Result<Option<Tenant>, sqlx::Error> {
        match key {
            TenantKey::Subdomain(subdomain) => {
                Tenant::find_active_by_subdomain(&self.pool, subdomain).await
            }
            TenantKey::Domain(domain) => Tenant::find_active_by_domain(&self.pool, domain).await,
        }
    }
}

/// Fixed set of tenants held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTenantDirectory {
    tenants: Vec<Tenant>,
}

impl InMemoryTenantDirectory {
    /// Creates a directory over `tenants`
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn find_active(&self, key: &TenantKey) -> Result<Option<Tenant>, sqlx::Error> {
        let found = self.tenants.iter().find(|tenant| {
            tenant.is_active
                && match key {
                    TenantKey::Subdomain(subdomain) => tenant.subdomain == *subdomain,
                    TenantKey::Domain(domain) => tenant.domain.as_deref() == Some(domain.as_str()),
                }
        });

        Ok(found.cloned())
    }
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Derives the tenant key from a `Host` header value
///
/// The port is stripped and the host lower-cased. Returns `None` for empty,
/// malformed or bracketed (IPv6) hosts, for the bare base domain, and for
/// hosts nested more than one label below the base domain.
pub fn tenant_key_from_host(host: &str, base_domain: &str) -> Option<TenantKey> {
    let host = host.trim();
    if host.starts_with('[') {
        return None;
    }

    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        Some(_) => return None,
        None => host,
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    if host.is_empty() || !host.split('.').all(is_dns_label) {
        return None;
    }

    let base = base_domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if !base.is_empty() {
        if host == base {
            return None;
        }
        if let Some(prefix) = host.strip_suffix(base.as_str()) {
            if let Some(label) = prefix.strip_suffix('.') {
                return if label.contains('.') {
                    None
                } else {
                    Some(TenantKey::Subdomain(label.to_string()))
                };
            }
        }
    }

    Some(TenantKey::Domain(host))
}

/// Resolves the request host to a tenant context
///
/// # Errors
///
/// - `TenantNotFound` if the host names no active tenant (or is missing)
/// - `Lookup` if the directory fails
pub async fn resolve_tenant(
    directory: &dyn TenantDirectory,
    host: Option<&str>,
    base_domain: &str,
) -> Result<TenantContext, ResolveError> {
    let raw_host = host.unwrap_or_default();

    let Some(key) = tenant_key_from_host(raw_host, base_domain) else {
        debug!(host = raw_host, "Host does not name a tenant");
        return Err(ResolveError::TenantNotFound(raw_host.to_string()));
    };

    match directory.find_active(&key).await? {
        Some(tenant) => Ok(TenantContext::from_tenant(&tenant)),
        None => {
            debug!(host = raw_host, ?key, "No active tenant for host");
            Err(ResolveError::TenantNotFound(raw_host.to_string()))
        }
    }
}
