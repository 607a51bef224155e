/// Job posting model
///
/// Postings start as drafts, are published (stamping `published_at`) and
/// closed. A closed posting may be published again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::enums::{ContractType, JobPostingStatus, RemoteType};
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, Sort, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub department_id: Uuid,
    pub position_id: Uuid,
    pub title: String,
    pub description: String,

    #[sqlx(try_from = "String")]
    pub job_type: ContractType,

    pub location: Option<String>,

    #[sqlx(try_from = "String")]
    pub remote_type: RemoteType,

    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,

    #[sqlx(try_from = "String")]
    pub status: JobPostingStatus,

    pub published_at: Option<DateTime<Utc>>,
    pub closing_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for JobPosting {
    const KIND: EntityKind = EntityKind::JobPosting;
    const COLUMNS: &'static str = "id, tenant_id, department_id, position_id, title, description, \
         job_type, location, remote_type, salary_min, salary_max, status, published_at, \
         closing_date, is_active, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

fn validate_salary_range(input: &JobPostingInput) -> Result<(), ValidationError> {
    match (input.salary_min, input.salary_max) {
        (Some(min), Some(max)) if max < min => Err(ValidationError::new("salary_range")
            .with_message("salary_max must not be below salary_min".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_salary_range"))]
pub struct JobPostingInput {
    pub department_id: Uuid,
    pub position_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1))]
    pub description: String,

    pub job_type: ContractType,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[serde(default)]
    pub remote_type: RemoteType,

    #[validate(range(min = 0))]
    pub salary_min: Option<i64>,

    #[validate(range(min = 0))]
    pub salary_max: Option<i64>,

    pub closing_date: Option<DateTime<Utc>>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Columns `?sort=` accepts for postings
pub const SORTABLE_COLUMNS: &[&str] = &[
    "title",
    "created_at",
    "published_at",
    "closing_date",
    "salary_min",
    "salary_max",
];

/// Query filters for the posting list
///
/// `title` and `location` match case-insensitive substrings. `salary_from`
/// and `salary_to` keep postings whose advertised range reaches into the
/// given bounds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPostingFilter {
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub status: Option<JobPostingStatus>,
    pub job_type: Option<ContractType>,
    pub remote_type: Option<RemoteType>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub sort: Option<String>,
}

impl JobPosting {
    async fn check_references(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: &JobPostingInput,
    ) -> Result<(), ScopeError> {
        scope::ensure_reference(conn, ctx, "department_id", EntityKind::Department, data.department_id)
            .await?;
        scope::ensure_reference(conn, ctx, "position_id", EntityKind::Position, data.position_id)
            .await?;
        Ok(())
    }

    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: JobPostingFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        let sort = Sort::parse(filter.sort.as_deref(), SORTABLE_COLUMNS)?;

        ScopedQuery::<JobPosting>::new(ctx)
            .filter_opt("department_id", filter.department_id)
            .filter_opt("position_id", filter.position_id)
            .filter_opt("status", filter.status.map(|s| s.as_str()))
            .filter_opt("job_type", filter.job_type.map(|t| t.as_str()))
            .filter_opt("remote_type", filter.remote_type.map(|t| t.as_str()))
            .filter_like("title", filter.title)
            .filter_like("location", filter.location)
            .filter_at_least("salary_max", filter.salary_from)
            .filter_at_most("salary_min", filter.salary_to)
            .sort(sort)
            .fetch_page(conn, page)
            .await
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: JobPostingInput,
    ) -> Result<Self, ScopeError> {
        Self::check_references(conn, ctx, &data).await?;

        let posting = sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            INSERT INTO job_postings (
                tenant_id, department_id, position_id, title, description, job_type, location,
                remote_type, salary_min, salary_max, closing_date, is_active, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'draft')
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.department_id)
        .bind(data.position_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.job_type.as_str())
        .bind(data.location)
        .bind(data.remote_type.as_str())
        .bind(data.salary_min)
        .bind(data.salary_max)
        .bind(data.closing_date)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(posting)
    }

    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: JobPostingInput,
    ) -> Result<Self, ScopeError> {
        scope::find::<JobPosting>(&mut *conn, ctx, id).await?;
        Self::check_references(&mut *conn, ctx, &data).await?;

        let posting = sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            UPDATE job_postings
            SET department_id = $3, position_id = $4, title = $5, description = $6,
                job_type = $7, location = $8, remote_type = $9, salary_min = $10,
                salary_max = $11, closing_date = $12, is_active = $13, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.department_id)
        .bind(data.position_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.job_type.as_str())
        .bind(data.location)
        .bind(data.remote_type.as_str())
        .bind(data.salary_min)
        .bind(data.salary_max)
        .bind(data.closing_date)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(posting)
    }

    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::soft_delete::<JobPosting>(conn, ctx, id).await
    }

    pub async fn publish(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<Self, ScopeError> {
        let current = scope::find::<JobPosting>(&mut *conn, ctx, id).await?;
        if !current.status.can_publish() {
            return Err(ScopeError::InvalidState(
                "Job posting is already published".to_string(),
            ));
        }

        Self::set_status(conn, ctx, id, JobPostingStatus::Published).await
    }

    pub async fn close(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<Self, ScopeError> {
        let current = scope::find::<JobPosting>(&mut *conn, ctx, id).await?;
        if !current.status.can_close() {
            return Err(ScopeError::InvalidState(format!(
                "Only published job postings can be closed (status is {})",
                current.status
            )));
        }

        Self::set_status(conn, ctx, id, JobPostingStatus::Closed).await
    }

    async fn set_status(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        status: JobPostingStatus,
    ) -> Result<Self, ScopeError> {
        let posting = sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            UPDATE job_postings
            SET status = $3,
                published_at = CASE WHEN $3 = 'published' THEN NOW() ELSE published_at END,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(status.as_str())
        .fetch_one(conn)
        .await?;

        Ok(posting)
    }
}
