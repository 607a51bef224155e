/// Candidate model
///
/// A candidate applies to one job posting of the same tenant and moves
/// through the hiring pipeline via its `status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use super::enums::CandidateStatus;
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, Sort, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub job_posting_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    pub expected_salary: Option<i64>,

    #[sqlx(try_from = "String")]
    pub status: CandidateStatus,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Candidate {
    const KIND: EntityKind = EntityKind::Candidate;
    const COLUMNS: &'static str = "id, tenant_id, job_posting_id, first_name, last_name, email, \
         phone, cover_letter, expected_salary, status, is_active, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateInput {
    pub job_posting_id: Uuid,

    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    pub cover_letter: Option<String>,

    #[validate(range(min = 0))]
    pub expected_salary: Option<i64>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateStatusUpdate {
    pub status: CandidateStatus,
}

/// Columns `?sort=` accepts for candidates
pub const SORTABLE_COLUMNS: &[&str] = &["first_name", "last_name", "email", "created_at", "expected_salary"];

/// Query filters for the candidate list; name and email match substrings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateFilter {
    pub job_posting_id: Option<Uuid>,
    pub status: Option<CandidateStatus>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub sort: Option<String>,
}

impl Candidate {
    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: CandidateFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        let sort = Sort::parse(filter.sort.as_deref(), SORTABLE_COLUMNS)?;

        ScopedQuery::<Candidate>::new(ctx)
            .filter_opt("job_posting_id", filter.job_posting_id)
            .filter_opt("status", filter.status.map(|s| s.as_str()))
            .filter_like("first_name", filter.first_name)
            .filter_like("last_name", filter.last_name)
            .filter_like("email", filter.email)
            .sort(sort)
            .fetch_page(conn, page)
            .await
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: CandidateInput,
    ) -> Result<Self, ScopeError> {
        scope::ensure_reference(conn, ctx, "job_posting_id", EntityKind::JobPosting, data.job_posting_id)
            .await?;

        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            INSERT INTO candidates (
                tenant_id, job_posting_id, first_name, last_name, email, phone, cover_letter,
                expected_salary, is_active, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'applied')
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.job_posting_id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email.to_lowercase())
        .bind(data.phone)
        .bind(data.cover_letter)
        .bind(data.expected_salary)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(candidate)
    }

    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: CandidateInput,
    ) -> Result<Self, ScopeError> {
        scope::find::<Candidate>(&mut *conn, ctx, id).await?;
        scope::ensure_reference(&mut *conn, ctx, "job_posting_id", EntityKind::JobPosting, data.job_posting_id)
            .await?;

        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            UPDATE candidates
            SET job_posting_id = $3, first_name = $4, last_name = $5, email = $6, phone = $7,
                cover_letter = $8, expected_salary = $9, is_active = $10, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.job_posting_id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email.to_lowercase())
        .bind(data.phone)
        .bind(data.cover_letter)
        .bind(data.expected_salary)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(candidate)
    }

    pub async fn update_status(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        status: CandidateStatus,
    ) -> Result<Self, ScopeError> {
        scope::find::<Candidate>(&mut *conn, ctx, id).await?;

        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            UPDATE candidates SET status = $3, updated_at = NOW()
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

        Ok(candidate)
    }

    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::soft_delete::<Candidate>(conn, ctx, id).await
    }
}
