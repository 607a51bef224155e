/// Interview model
///
/// Interviews pair a candidate with an interviewing employee. Only scheduled
/// interviews can be edited, completed or cancelled. Completing one moves a
/// candidate still in `applied`/`screening` to `interviewed` in the same
/// transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgConnection};
use uuid::Uuid;
use validator::Validate;

use super::candidate::Candidate;
use super::enums::{CandidateStatus, InterviewStatus, InterviewType};
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub candidate_id: Uuid,
    pub interviewer_id: Uuid,

    #[sqlx(try_from = "String")]
    pub interview_type: InterviewType,

    #[sqlx(try_from = "String")]
    pub status: InterviewStatus,

    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Interview {
    const KIND: EntityKind = EntityKind::Interview;
    const COLUMNS: &'static str = "id, tenant_id, candidate_id, interviewer_id, interview_type, \
         status, scheduled_at, duration_minutes, location, feedback, rating, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InterviewInput {
    pub candidate_id: Uuid,
    pub interviewer_id: Uuid,
    pub interview_type: InterviewType,
    pub scheduled_at: DateTime<Utc>,

    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i32,

    #[validate(length(max = 255))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompleteInterview {
    pub feedback: Option<String>,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewFilter {
    pub candidate_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    pub status: Option<InterviewStatus>,
}

fn ensure_scheduled(interview: &Interview) -> Result<(), ScopeError> {
    if interview.status == InterviewStatus::Scheduled {
        Ok(())
    } else {
        Err(ScopeError::InvalidState(format!(
            "Interview is already {}",
            interview.status
        )))
    }
}

impl Interview {
    async fn check_references(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: &InterviewInput,
    ) -> Result<(), ScopeError> {
        scope::ensure_reference(conn, ctx, "candidate_id", EntityKind::Candidate, data.candidate_id)
            .await?;
        scope::ensure_reference(conn, ctx, "interviewer_id", EntityKind::Employee, data.interviewer_id)
            .await?;
        Ok(())
    }

    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: InterviewFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<Interview>::new(ctx)
            .filter_opt("candidate_id", filter.candidate_id)
            .filter_opt("interviewer_id", filter.interviewer_id)
            .filter_opt("status", filter.status.map(|s| s.as_str()))
            .fetch_page(conn, page)
            .await
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: InterviewInput,
    ) -> Result<Self, ScopeError> {
        Self::check_references(conn, ctx, &data).await?;

        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews (
                tenant_id, candidate_id, interviewer_id, interview_type, scheduled_at,
                duration_minutes, location, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'scheduled')
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.candidate_id)
        .bind(data.interviewer_id)
        .bind(data.interview_type.as_str())
        .bind(data.scheduled_at)
        .bind(data.duration_minutes)
        .bind(data.location)
        .fetch_one(conn)
        .await?;

        Ok(interview)
    }

    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: InterviewInput,
    ) -> Result<Self, ScopeError> {
        let current = scope::find::<Interview>(&mut *conn, ctx, id).await?;
        ensure_scheduled(&current)?;
        Self::check_references(&mut *conn, ctx, &data).await?;

        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews
            SET candidate_id = $3, interviewer_id = $4, interview_type = $5, scheduled_at = $6,
                duration_minutes = $7, location = $8, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.candidate_id)
        .bind(data.interviewer_id)
        .bind(data.interview_type.as_str())
        .bind(data.scheduled_at)
        .bind(data.duration_minutes)
        .bind(data.location)
        .fetch_one(conn)
        .await?;

        Ok(interview)
    }

    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::soft_delete::<Interview>(conn, ctx, id).await
    }

    pub async fn complete(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: CompleteInterview,
    ) -> Result<Self, ScopeError> {
        let mut tx = conn.begin().await?;

        let current = scope::find_for_update::<Interview>(&mut *tx, ctx, id).await?;
        ensure_scheduled(&current)?;

        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews
            SET status = 'completed', feedback = $3, rating = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.feedback)
        .bind(data.rating)
        .fetch_one(&mut *tx)
        .await?;

        let candidate = scope::find_for_update::<Candidate>(&mut *tx, ctx, interview.candidate_id).await?;
        if candidate.status.precedes_interview() {
            Candidate::update_status(&mut *tx, ctx, candidate.id, CandidateStatus::Interviewed).await?;
        }

        tx.commit().await?;
        Ok(interview)
    }

    pub async fn cancel(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<Self, ScopeError> {
        let current = scope::find::<Interview>(&mut *conn, ctx, id).await?;
        ensure_scheduled(&current)?;

        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'scheduled'
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ScopeError::InvalidState("Interview changed concurrently".to_string()))?;

        Ok(interview)
    }
}
