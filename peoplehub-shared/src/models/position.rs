/// Position model
///
/// A position belongs to one department of the same tenant and carries a
/// salary band in minor currency units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::department::Department;
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Position {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub department_id: Uuid,
    pub title: String,
    pub code: String,
    pub description: Option<String>,
    pub level: i32,
    pub min_salary: i64,
    pub max_salary: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Position {
    const KIND: EntityKind = EntityKind::Position;
    const COLUMNS: &'static str = "id, tenant_id, department_id, title, code, description, level, \
         min_salary, max_salary, is_active, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

fn validate_salary_band(input: &PositionInput) -> Result<(), ValidationError> {
    if input.max_salary > input.min_salary {
        Ok(())
    } else {
        Err(ValidationError::new("salary_band")
            .with_message("max_salary must be greater than min_salary".into()))
    }
}

/// Create/replace payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_salary_band"))]
pub struct PositionInput {
    pub department_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1, max = 20))]
    pub code: String,

    pub description: Option<String>,

    #[serde(default = "default_level")]
    #[validate(range(min = 1))]
    pub level: i32,

    #[validate(range(min = 0))]
    pub min_salary: i64,

    pub max_salary: i64,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_level() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionFilter {
    pub department_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl Position {
    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: PositionFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<Position>::new(ctx)
            .filter_opt("department_id", filter.department_id)
            .filter_opt("is_active", filter.is_active)
            .fetch_page(conn, page)
            .await
    }

    /// Positions of one department; the department must be visible
    pub async fn in_department(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        department_id: Uuid,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        scope::find::<Department>(&mut *conn, ctx, department_id).await?;

        let filter = PositionFilter {
            department_id: Some(department_id),
            is_active: None,
        };
        Self::list(conn, ctx, filter, page).await
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: PositionInput,
    ) -> Result<Self, ScopeError> {
        scope::ensure_reference(conn, ctx, "department_id", EntityKind::Department, data.department_id)
            .await?;

        let position = sqlx::query_as::<_, Position>(&format!(
            r#"
            INSERT INTO positions (
                tenant_id, department_id, title, code, description, level,
                min_salary, max_salary, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.department_id)
        .bind(data.title)
        .bind(data.code)
        .bind(data.description)
        .bind(data.level)
        .bind(data.min_salary)
        .bind(data.max_salary)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(position)
    }

    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: PositionInput,
    ) -> Result<Self, ScopeError> {
        scope::find::<Position>(&mut *conn, ctx, id).await?;
        scope::ensure_reference(&mut *conn, ctx, "department_id", EntityKind::Department, data.department_id)
            .await?;

        let position = sqlx::query_as::<_, Position>(&format!(
            r#"
            UPDATE positions
            SET department_id = $3, title = $4, code = $5, description = $6, level = $7,
                min_salary = $8, max_salary = $9, is_active = $10, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.department_id)
        .bind(data.title)
        .bind(data.code)
        .bind(data.description)
        .bind(data.level)
        .bind(data.min_salary)
        .bind(data.max_salary)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(position)
    }

    /// Soft-deletes a position nobody holds
    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::find::<Position>(&mut *conn, ctx, id).await?;

        let holders =
            scope::count_referencing(&mut *conn, ctx, EntityKind::Employee, "position_id", id).await?;
        if holders > 0 {
            return Err(ScopeError::InvalidState(
                "Position is still held by employees".to_string(),
            ));
        }

        scope::soft_delete::<Position>(conn, ctx, id).await
    }
}
