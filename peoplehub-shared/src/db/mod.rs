/// Database layer for PeopleHub
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded sqlx migrations and status reporting
///
/// Tenant-scoped data access lives in [`crate::tenancy::scope`], the models
/// in [`crate::models`].

pub mod migrations;
pub mod pool;
