/// Leave type model (annual, sick, parental...)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveType {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub default_days: i32,
    pub is_paid: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for LeaveType {
    const KIND: EntityKind = EntityKind::LeaveType;
    const COLUMNS: &'static str =
        "id, tenant_id, name, description, default_days, is_paid, is_active, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LeaveTypeInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0, max = 366))]
    pub default_days: i32,

    #[serde(default = "default_true")]
    pub is_paid: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveTypeFilter {
    pub is_active: Option<bool>,
}

impl LeaveType {
    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: LeaveTypeFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<LeaveType>::new(ctx)
            .filter_opt("is_active", filter.is_active)
            .fetch_page(conn, page)
            .await
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: LeaveTypeInput,
    ) -> Result<Self, ScopeError> {
        let leave_type = sqlx::query_as::<_, LeaveType>(&format!(
            r#"
            INSERT INTO leave_types (tenant_id, name, description, default_days, is_paid, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.default_days)
        .bind(data.is_paid)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(leave_type)
    }

    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: LeaveTypeInput,
    ) -> Result<Self, ScopeError> {
        scope::find::<LeaveType>(&mut *conn, ctx, id).await?;

        let leave_type = sqlx::query_as::<_, LeaveType>(&format!(
            r#"
            UPDATE leave_types
            SET name = $3, description = $4, default_days = $5, is_paid = $6, is_active = $7,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.default_days)
        .bind(data.is_paid)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(leave_type)
    }

    /// Soft-deletes a leave type no live request uses
    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::find::<LeaveType>(&mut *conn, ctx, id).await?;

        let requests =
            scope::count_referencing(&mut *conn, ctx, EntityKind::LeaveRequest, "leave_type_id", id)
                .await?;
        if requests > 0 {
            return Err(ScopeError::InvalidState(
                "Leave type is used by leave requests".to_string(),
            ));
        }

        scope::soft_delete::<LeaveType>(conn, ctx, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let input: LeaveTypeInput = serde_json::from_str(r#"{"name": "Sick leave"}"#).unwrap();
        assert_eq!(input.default_days, 0);
        assert!(input.is_paid);
        assert!(input.is_active);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_negative_days_rejected() {
        let input: LeaveTypeInput =
            serde_json::from_str(r#"{"name": "Annual", "default_days": -3}"#).unwrap();
        assert!(input.validate().is_err());
    }
}
