/// Tenant-scoped query layer
///
/// Every read and write of a tenant-owned row goes through this module or
/// through a model function that takes a [`TenantContext`]. The rules:
///
/// - collection reads filter on `tenant_id = ctx.tenant_id` and hide
///   soft-deleted rows
/// - single-row reads load by id, then pass the row through
///   [`guard::assert_owned_by_current_tenant`]; a row of another tenant is
///   `Forbidden`, an absent row is `NotFound`
/// - updates and deletes repeat `AND tenant_id = $ctx` in their `WHERE`
/// - referenced ids are checked with [`ensure_reference`] before writes;
///   the schema's composite `(tenant_id, fk)` keys back this up
///
/// # Example
///
/// ```no_run
/// use peoplehub_shared::models::department::Department;
/// use peoplehub_shared::tenancy::{scope, TenantContext};
/// use sqlx::PgConnection;
/// use uuid::Uuid;
///
/// # async fn example(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid)
/// #     -> Result<(), scope::ScopeError> {
/// let department: Department = scope::find(conn, ctx, id).await?;
/// let page: Vec<Department> = scope::list(conn, ctx, scope::Page::default()).await?;
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgConnection, Postgres, QueryBuilder, Type};
use tracing::warn;
use uuid::Uuid;

use super::context::TenantContext;
use super::guard;

/// Default page size for collection reads
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: i64 = 200;

/// Kinds of tenant-owned entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Department,
    Position,
    Team,
    Employee,
    Contract,
    LeaveType,
    LeaveRequest,
    JobPosting,
    Candidate,
    Interview,
}

impl EntityKind {
    /// Backing table
    pub const fn table(self) -> &'static str {
        match self {
            EntityKind::Department => "departments",
            EntityKind::Position => "positions",
            EntityKind::Team => "teams",
            EntityKind::Employee => "employees",
            EntityKind::Contract => "contracts",
            EntityKind::LeaveType => "leave_types",
            EntityKind::LeaveRequest => "leave_requests",
            EntityKind::JobPosting => "job_postings",
            EntityKind::Candidate => "candidates",
            EntityKind::Interview => "interviews",
        }
    }

    /// Human-readable name used in error messages
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Department => "department",
            EntityKind::Position => "position",
            EntityKind::Team => "team",
            EntityKind::Employee => "employee",
            EntityKind::Contract => "contract",
            EntityKind::LeaveType => "leave type",
            EntityKind::LeaveRequest => "leave request",
            EntityKind::JobPosting => "job posting",
            EntityKind::Candidate => "candidate",
            EntityKind::Interview => "interview",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row that belongs to exactly one tenant
pub trait TenantOwned: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Entity kind (and therefore table)
    const KIND: EntityKind;

    /// Column list selected for this entity
    const COLUMNS: &'static str;

    /// Primary key
    fn id(&self) -> Uuid;

    /// Owning tenant
    fn tenant_id(&self) -> Uuid;
}

/// Error type for scoped data access
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// No live row with this id
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    /// Row exists but belongs to another tenant
    #[error("{kind} {id} is not accessible to this tenant")]
    Forbidden { kind: EntityKind, id: Uuid },

    /// A referenced id is owned by another tenant
    #[error("{field}: {kind} {id} belongs to another tenant")]
    CrossTenantReference {
        field: &'static str,
        kind: EntityKind,
        id: Uuid,
    },

    /// A referenced id does not exist
    #[error("{field} references unknown {kind} {id}")]
    MissingReference {
        field: &'static str,
        kind: EntityKind,
        id: Uuid,
    },

    /// Composite foreign key rejected the write
    #[error("Reference rejected by constraint {0}")]
    ReferenceViolation(String),

    /// Unique constraint violated
    #[error("{0}")]
    Conflict(String),

    /// Operation not allowed in the entity's current state
    #[error("{0}")]
    InvalidState(String),

    /// `sort` names a column the listing does not sort by
    #[error("Cannot sort by {0}")]
    UnsupportedSort(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ScopeError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            match db.code().as_deref() {
                Some("23505") => {
                    return ScopeError::Conflict(format!(
                        "A record with the same unique value already exists ({constraint})"
                    ))
                }
                Some("23503") => return ScopeError::ReferenceViolation(constraint),
                _ => {}
            }
        }
        ScopeError::Database(err)
    }
}

/// Pagination parameters for collection reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Limit and offset forced into the allowed range
    pub fn clamped(self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE_SIZE), self.offset.max(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    const fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordering requested through `?sort=`
///
/// `sort=title` sorts ascending, `sort=-title` descending. Only columns in
/// the listing's whitelist are accepted, so the column name is never taken
/// from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    /// Parses `raw` against `allowed`; `None` or an empty value means the
    /// default order
    ///
    /// # Errors
    ///
    /// `UnsupportedSort` if the column is not in `allowed`.
    pub fn parse(raw: Option<&str>, allowed: &[&'static str]) -> Result<Option<Self>, ScopeError> {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(None);
        };

        let (name, direction) = match raw.strip_prefix('-') {
            Some(name) => (name, SortDirection::Desc),
            None => (raw, SortDirection::Asc),
        };

        allowed
            .iter()
            .find(|column| **column == name)
            .map(|&column| Some(Sort { column, direction }))
            .ok_or_else(|| ScopeError::UnsupportedSort(name.to_string()))
    }
}

/// Escapes `LIKE` wildcards so `term` matches literally
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `SELECT` over one tenant's live rows with optional filters
///
/// The tenant filter is pushed at construction; there is no way to build a
/// scoped query without it.
pub struct ScopedQuery<'a, T> {
    builder: QueryBuilder<'a, Postgres>,
    sort: Option<Sort>,
    _entity: PhantomData<T>,
}

impl<'a, T: TenantOwned> ScopedQuery<'a, T> {
    /// Starts a query over `ctx`'s live rows
    pub fn new(ctx: &TenantContext) -> Self {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE deleted_at IS NULL AND tenant_id = ",
            T::COLUMNS,
            T::KIND.table()
        ));
        builder.push_bind(ctx.tenant_id);

        Self {
            builder,
            sort: None,
            _entity: PhantomData,
        }
    }

    /// Adds `AND column = value`
    pub fn filter<V>(mut self, column: &'static str, value: V) -> Self
    where
        V: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        self.builder
            .push(" AND ")
            .push(column)
            .push(" = ")
            .push_bind(value);
        self
    }

    /// Adds `AND column = value` when a value is given
    pub fn filter_opt<V>(self, column: &'static str, value: Option<V>) -> Self
    where
        V: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        match value {
            Some(value) => self.filter(column, value),
            None => self,
        }
    }

    /// Adds a case-insensitive substring match when a non-blank term is given
    pub fn filter_like(mut self, column: &'static str, term: Option<String>) -> Self {
        if let Some(term) = term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            self.builder
                .push(" AND ")
                .push(column)
                .push(" ILIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
        self
    }

    /// Adds `AND column >= value` when a value is given
    pub fn filter_at_least<V>(mut self, column: &'static str, value: Option<V>) -> Self
    where
        V: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(" AND ").push(column).push(" >= ").push_bind(value);
        }
        self
    }

    /// Adds `AND column <= value` when a value is given
    pub fn filter_at_most<V>(mut self, column: &'static str, value: Option<V>) -> Self
    where
        V: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(" AND ").push(column).push(" <= ").push_bind(value);
        }
        self
    }

    /// Orders [`fetch_page`](Self::fetch_page) by `sort` instead of newest first
    pub fn sort(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }

    /// Fetches one page, newest first unless a sort was set
    pub async fn fetch_page(
        mut self,
        conn: &mut PgConnection,
        page: Page,
    ) -> Result<Vec<T>, ScopeError> {
        let (limit, offset) = page.clamped();
        match self.sort {
            Some(sort) => {
                self.builder
                    .push(" ORDER BY ")
                    .push(sort.column)
                    .push(" ")
                    .push(sort.direction.sql())
                    .push(" NULLS LAST, id");
            }
            None => {
                self.builder.push(" ORDER BY created_at DESC, id");
            }
        }
        self.builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = self.builder.build_query_as::<T>().fetch_all(conn).await?;
        Ok(rows)
    }

    /// Fetches every matching row ordered by `order_by`
    pub async fn fetch_all_ordered(
        mut self,
        conn: &mut PgConnection,
        order_by: &'static str,
    ) -> Result<Vec<T>, ScopeError> {
        self.builder.push(" ORDER BY ").push(order_by);

        let rows = self.builder.build_query_as::<T>().fetch_all(conn).await?;
        Ok(rows)
    }

    /// Fetches the first matching row, if any
    pub async fn fetch_optional(mut self, conn: &mut PgConnection) -> Result<Option<T>, ScopeError> {
        self.builder.push(" LIMIT 1");

        let row = self
            .builder
            .build_query_as::<T>()
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }
}

/// Lists one page of the tenant's live rows
pub async fn list<T: TenantOwned>(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    page: Page,
) -> Result<Vec<T>, ScopeError> {
    ScopedQuery::<T>::new(ctx).fetch_page(conn, page).await
}

async fn load<T: TenantOwned>(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    id: Uuid,
    lock: bool,
) -> Result<T, ScopeError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1 AND deleted_at IS NULL{}",
        T::COLUMNS,
        T::KIND.table(),
        if lock { " FOR UPDATE" } else { "" }
    );

    let entity = sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(ScopeError::NotFound { kind: T::KIND, id })?;

    guard::assert_owned_by_current_tenant(ctx, &entity)?;
    Ok(entity)
}

/// Loads a live row by id and checks it belongs to `ctx`
///
/// # Errors
///
/// - `NotFound` if no live row has this id
/// - `Forbidden` if the row belongs to another tenant
pub async fn find<T: TenantOwned>(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    id: Uuid,
) -> Result<T, ScopeError> {
    load(conn, ctx, id, false).await
}

/// Like [`find`], locking the row for the rest of the transaction
pub async fn find_for_update<T: TenantOwned>(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    id: Uuid,
) -> Result<T, ScopeError> {
    load(conn, ctx, id, true).await
}

/// Soft-deletes a row after the ownership check
pub async fn soft_delete<T: TenantOwned>(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    id: Uuid,
) -> Result<(), ScopeError> {
    let _: T = find(&mut *conn, ctx, id).await?;

    let sql = format!(
        "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        T::KIND.table()
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(ctx.tenant_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Decides a reference check given the referenced row's owner
///
/// `owner` is the `tenant_id` of the live row with `id`, or `None` if there
/// is no such row.
pub fn check_reference(
    ctx: &TenantContext,
    field: &'static str,
    kind: EntityKind,
    id: Uuid,
    owner: Option<Uuid>,
) -> Result<(), ScopeError> {
    match owner {
        Some(owner) if ctx.owns(owner) => Ok(()),
        Some(owner) => {
            warn!(
                tenant_id = %ctx.tenant_id,
                owner_tenant_id = %owner,
                field,
                kind = kind.label(),
                %id,
                "Rejected cross-tenant reference"
            );
            Err(ScopeError::CrossTenantReference { field, kind, id })
        }
        None => Err(ScopeError::MissingReference { field, kind, id }),
    }
}

/// Checks that `id` names a live `kind` row of the current tenant
///
/// # Errors
///
/// - `CrossTenantReference` if the row belongs to another tenant
/// - `MissingReference` if there is no live row with this id
pub async fn ensure_reference(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    field: &'static str,
    kind: EntityKind,
    id: Uuid,
) -> Result<(), ScopeError> {
    let sql = format!(
        "SELECT tenant_id FROM {} WHERE id = $1 AND deleted_at IS NULL",
        kind.table()
    );
    let owner: Option<Uuid> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    check_reference(ctx, field, kind, id, owner)
}

/// [`ensure_reference`] for nullable references
pub async fn ensure_optional_reference(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    field: &'static str,
    kind: EntityKind,
    id: Option<Uuid>,
) -> Result<(), ScopeError> {
    match id {
        Some(id) => ensure_reference(conn, ctx, field, kind, id).await,
        None => Ok(()),
    }
}

/// Counts the tenant's live `kind` rows whose `column` equals `id`
pub async fn count_referencing(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    kind: EntityKind,
    column: &'static str,
    id: Uuid,
) -> Result<i64, ScopeError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE tenant_id = $1 AND {} = $2 AND deleted_at IS NULL",
        kind.table(),
        column
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(ctx.tenant_id)
        .bind(id)
        .fetch_one(conn)
        .await?;

    Ok(count)
}

/// Whether `target` is `start` or one of its ancestors along `parent_column`
///
/// Used to refuse parent/manager assignments that would close a cycle.
pub async fn ancestry_contains(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    kind: EntityKind,
    parent_column: &'static str,
    start: Uuid,
    target: Uuid,
) -> Result<bool, ScopeError> {
    let table = kind.table();
    let sql = format!(
        r#"
        WITH RECURSIVE chain(id) AS (
            SELECT id FROM {table} WHERE id = $1 AND tenant_id = $2
            UNION
            SELECT t.{parent_column} FROM {table} t
            JOIN chain c ON t.id = c.id
            WHERE t.tenant_id = $2 AND t.{parent_column} IS NOT NULL
        )
        SELECT EXISTS (SELECT 1 FROM chain WHERE id = $3)
        "#
    );

    let found: bool = sqlx::query_scalar(&sql)
        .bind(start)
        .bind(ctx.tenant_id)
        .bind(target)
        .fetch_one(conn)
        .await?;

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TenantContext {
        TenantContext {
            tenant_id: Uuid::new_v4(),
            subdomain: "acme".to_string(),
            name: "Acme".to_string(),
        }
    }

    #[test]
    fn test_reference_in_same_tenant_is_accepted() {
        let ctx = ctx();
        let id = Uuid::new_v4();
        assert!(check_reference(&ctx, "department_id", EntityKind::Department, id, Some(ctx.tenant_id)).is_ok());
    }

    #[test]
    fn test_reference_in_other_tenant_is_rejected() {
        let ctx = ctx();
        let id = Uuid::new_v4();

        let err = check_reference(&ctx, "head_id", EntityKind::Employee, id, Some(Uuid::new_v4()))
            .unwrap_err();
        match err {
            ScopeError::CrossTenantReference { field, kind, id: got } => {
                assert_eq!(field, "head_id");
                assert_eq!(kind, EntityKind::Employee);
                assert_eq!(got, id);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_reference() {
        let ctx = ctx();
        let err = check_reference(&ctx, "parent_id", EntityKind::Department, Uuid::new_v4(), None)
            .unwrap_err();
        assert!(matches!(err, ScopeError::MissingReference { field: "parent_id", .. }));
    }

    #[test]
    fn test_sort_parsing() {
        const ALLOWED: &[&str] = &["title", "created_at"];

        assert_eq!(Sort::parse(None, ALLOWED).unwrap(), None);
        assert_eq!(Sort::parse(Some("  "), ALLOWED).unwrap(), None);
        assert_eq!(
            Sort::parse(Some("title"), ALLOWED).unwrap(),
            Some(Sort { column: "title", direction: SortDirection::Asc })
        );
        assert_eq!(
            Sort::parse(Some("-created_at"), ALLOWED).unwrap(),
            Some(Sort { column: "created_at", direction: SortDirection::Desc })
        );
    }

    #[test]
    fn test_sort_outside_whitelist_is_rejected() {
        const ALLOWED: &[&str] = &["title"];

        for raw in ["password_hash", "-tenant_id", "title; DROP TABLE tenants", "--title"] {
            let err = Sort::parse(Some(raw), ALLOWED).unwrap_err();
            assert!(matches!(err, ScopeError::UnsupportedSort(_)), "{raw}");
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("eng"), "%eng%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn test_filters_render_into_sql() {
        let ctx = ctx();
        let query = ScopedQuery::<crate::models::job_posting::JobPosting>::new(&ctx)
            .filter_like("title", Some(" rust ".to_string()))
            .filter_like("location", Some("   ".to_string()))
            .filter_at_least("salary_max", Some(100_i64))
            .filter_at_most("salary_min", None::<i64>);
        let sql = query.builder.sql().to_string();

        assert!(sql.contains("AND title ILIKE $2 ESCAPE"));
        assert!(sql.contains("AND salary_max >= $3"));
        assert!(!sql.contains("location"));
        assert!(!sql.contains("salary_min <="));
    }

    #[test]
    fn test_page_clamping() {
        assert_eq!(Page::default().clamped(), (50, 0));
        assert_eq!(Page { limit: 10_000, offset: -5 }.clamped(), (200, 0));
        assert_eq!(Page { limit: 0, offset: 20 }.clamped(), (1, 20));
    }

    #[test]
    fn test_page_deserialize_defaults() {
        let page: Page = serde_json::from_str("{}").unwrap();
        assert_eq!(page, Page::default());
    }

    #[test]
    fn test_entity_kind_tables() {
        assert_eq!(EntityKind::LeaveRequest.table(), "leave_requests");
        assert_eq!(EntityKind::JobPosting.to_string(), "job posting");
    }

    #[test]
    fn test_error_messages() {
        let id = Uuid::nil();
        let err = ScopeError::NotFound { kind: EntityKind::Team, id };
        assert_eq!(err.to_string(), format!("team {id} not found"));

        let err = ScopeError::CrossTenantReference {
            field: "manager_id",
            kind: EntityKind::Employee,
            id,
        };
        assert_eq!(
            err.to_string(),
            format!("manager_id: employee {id} belongs to another tenant")
        );
    }

    #[test]
    fn test_non_database_sqlx_error_passes_through() {
        let err = ScopeError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ScopeError::Database(sqlx::Error::RowNotFound)));
    }
}
