/// Leave request model
///
/// ```text
/// pending ──┬──> approved ──> cancelled
/// in_review ┤
///           └──> rejected
/// pending / in_review ──> cancelled
/// ```
///
/// Requests are edited only while pending. The approver is the
/// authenticated employee and must not be the requester.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::enums::LeaveRequestStatus;
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: f64,
    pub reason: String,

    #[sqlx(try_from = "String")]
    pub status: LeaveRequestStatus,

    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for LeaveRequest {
    const KIND: EntityKind = EntityKind::LeaveRequest;
    const COLUMNS: &'static str = "id, tenant_id, employee_id, leave_type_id, start_date, end_date, \
         days, reason, status, approved_by, approved_at, rejection_reason, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

fn validate_period(input: &LeaveRequestInput) -> Result<(), ValidationError> {
    if input.end_date < input.start_date {
        return Err(ValidationError::new("period")
            .with_message("end_date must not be before start_date".into()));
    }

    // Calendar span caps the requested days; half days are allowed.
    let span = (input.end_date - input.start_date).num_days() + 1;
    if input.days > span as f64 {
        return Err(ValidationError::new("days")
            .with_message("days exceed the requested period".into()));
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_period"))]
pub struct LeaveRequestInput {
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[validate(range(min = 0.5))]
    pub days: f64,

    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectLeaveRequest {
    #[validate(length(min = 1))]
    pub rejection_reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveRequestFilter {
    pub employee_id: Option<Uuid>,
    pub leave_type_id: Option<Uuid>,
    pub status: Option<LeaveRequestStatus>,
}

/// Checks an approval or rejection is allowed
pub fn check_decision(request: &LeaveRequest, decided_by: Uuid) -> Result<(), ScopeError> {
    if !request.status.awaiting_decision() {
        return Err(ScopeError::InvalidState(format!(
            "Leave request is already {}",
            request.status
        )));
    }
    if request.employee_id == decided_by {
        return Err(ScopeError::InvalidState(
            "Employees cannot decide on their own leave requests".to_string(),
        ));
    }
    Ok(())
}

impl LeaveRequest {
    async fn check_references(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: &LeaveRequestInput,
    ) -> Result<(), ScopeError> {
        scope::ensure_reference(conn, ctx, "employee_id", EntityKind::Employee, data.employee_id)
            .await?;
        scope::ensure_reference(conn, ctx, "leave_type_id", EntityKind::LeaveType, data.leave_type_id)
            .await?;
        Ok(())
    }

    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: LeaveRequestFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<LeaveRequest>::new(ctx)
            .filter_opt("employee_id", filter.employee_id)
            .filter_opt("leave_type_id", filter.leave_type_id)
            .filter_opt("status", filter.status.map(|s| s.as_str()))
            .fetch_page(conn, page)
            .await
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: LeaveRequestInput,
    ) -> Result<Self, ScopeError> {
        Self::check_references(conn, ctx, &data).await?;

        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            INSERT INTO leave_requests (
                tenant_id, employee_id, leave_type_id, start_date, end_date, days, reason, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.employee_id)
        .bind(data.leave_type_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.days)
        .bind(data.reason)
        .bind(LeaveRequestStatus::Pending.as_str())
        .fetch_one(conn)
        .await?;

        Ok(request)
    }

    /// Replaces a pending request
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: LeaveRequestInput,
    ) -> Result<Self, ScopeError> {
        let current = scope::find::<LeaveRequest>(&mut *conn, ctx, id).await?;
        if !current.status.can_edit() {
            return Err(ScopeError::InvalidState(format!(
                "Only pending leave requests can be edited (status is {})",
                current.status
            )));
        }
        Self::check_references(&mut *conn, ctx, &data).await?;

        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            UPDATE leave_requests
            SET employee_id = $3, leave_type_id = $4, start_date = $5, end_date = $6, days = $7,
                reason = $8, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL AND status = 'pending'
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.employee_id)
        .bind(data.leave_type_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.days)
        .bind(data.reason)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ScopeError::InvalidState("Leave request changed concurrently".to_string()))?;

        Ok(request)
    }

    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::soft_delete::<LeaveRequest>(conn, ctx, id).await
    }

    async fn set_status(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        from: LeaveRequestStatus,
        status: LeaveRequestStatus,
        approved_by: Option<Uuid>,
        rejection_reason: Option<String>,
    ) -> Result<Self, ScopeError> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            UPDATE leave_requests
            SET status = $4,
                approved_by = COALESCE($5, approved_by),
                approved_at = CASE WHEN $5::uuid IS NULL THEN approved_at ELSE NOW() END,
                rejection_reason = COALESCE($6, rejection_reason),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = $3 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(from.as_str())
        .bind(status.as_str())
        .bind(approved_by)
        .bind(rejection_reason)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ScopeError::InvalidState("Leave request changed concurrently".to_string()))?;

        Ok(request)
    }

    /// Approves a request on behalf of `approver_id`
    pub async fn approve(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        approver_id: Uuid,
    ) -> Result<Self, ScopeError> {
        let current = scope::find::<LeaveRequest>(&mut *conn, ctx, id).await?;
        check_decision(&current, approver_id)?;
        scope::ensure_reference(&mut *conn, ctx, "approved_by", EntityKind::Employee, approver_id)
            .await?;

        let request = Self::set_status(
            conn,
            ctx,
            id,
            current.status,
            LeaveRequestStatus::Approved,
            Some(approver_id),
            None,
        )
        .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            leave_request_id = %id,
            approved_by = %approver_id,
            "Leave request approved"
        );
        Ok(request)
    }

    pub async fn reject(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        decided_by: Uuid,
        rejection_reason: String,
    ) -> Result<Self, ScopeError> {
        let current = scope::find::<LeaveRequest>(&mut *conn, ctx, id).await?;
        check_decision(&current, decided_by)?;

        Self::set_status(
            conn,
            ctx,
            id,
            current.status,
            LeaveRequestStatus::Rejected,
            None,
            Some(rejection_reason),
        )
        .await
    }

    pub async fn cancel(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<Self, ScopeError> {
        let current = scope::find::<LeaveRequest>(&mut *conn, ctx, id).await?;
        if !current.status.can_cancel() {
            return Err(ScopeError::InvalidState(format!(
                "A {} leave request cannot be cancelled",
                current.status
            )));
        }

        Self::set_status(
            conn,
            ctx,
            id,
            current.status,
            LeaveRequestStatus::Cancelled,
            None,
            None,
        )
        .await
    }
}
