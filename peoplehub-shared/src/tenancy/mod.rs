/// Tenant resolution and scoped access control
///
/// - `context`: the request-scoped [`TenantContext`]
/// - `resolver`: host → tenant, through the [`TenantDirectory`] seam
/// - `scope`: tenant-filtered queries, reference checks, soft delete
/// - `guard`: ownership check applied to every row loaded by id

pub mod context;
pub mod guard;
pub mod resolver;
pub mod scope;

pub use context::TenantContext;
pub use resolver::{
    resolve_tenant, InMemoryTenantDirectory, PgTenantDirectory, ResolveError, TenantDirectory,
    TenantKey,
};
pub use scope::{EntityKind, Page, ScopeError, Sort, SortDirection, TenantOwned};
