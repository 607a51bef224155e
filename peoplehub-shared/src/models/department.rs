/// Department model
///
/// Departments form a forest per tenant through `parent_id`. Each may name
/// a head employee. Both references are checked against the request tenant
/// before any write, and a parent change that would make a department its
/// own ancestor is refused.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::tenancy::scope::{self, EntityKind, ScopeError, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub head_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Department {
    const KIND: EntityKind = EntityKind::Department;
    const COLUMNS: &'static str =
        "id, tenant_id, name, code, description, parent_id, head_id, is_active, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

/// Create/replace payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DepartmentInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 10))]
    pub code: String,

    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub head_id: Option<Uuid>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// A department with its sub-departments
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentNode {
    #[serde(flatten)]
    pub department: Department,
    pub children: Vec<DepartmentNode>,
}

/// Arranges departments into trees ordered by name
///
/// Departments whose parent is absent from `departments` become roots.
pub fn build_tree(departments: Vec<Department>) -> Vec<DepartmentNode> {
    let ids: Vec<Uuid> = departments.iter().map(|d| d.id).collect();
    let mut by_parent: HashMap<Option<Uuid>, Vec<Department>> = HashMap::new();

    for department in departments {
        let parent = department.parent_id.filter(|p| ids.contains(p));
        by_parent.entry(parent).or_default().push(department);
    }

    fn attach(
        parent: Option<Uuid>,
        by_parent: &mut HashMap<Option<Uuid>, Vec<Department>>,
    ) -> Vec<DepartmentNode> {
        let mut level = by_parent.remove(&parent).unwrap_or_default();
        level.sort_by(|a, b| a.name.cmp(&b.name));

        level
            .into_iter()
            .map(|department| {
                let children = attach(Some(department.id), by_parent);
                DepartmentNode {
                    department,
                    children,
                }
            })
            .collect()
    }

    attach(None, &mut by_parent)
}

impl Department {
    async fn check_references(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: &DepartmentInput,
    ) -> Result<(), ScopeError> {
        scope::ensure_optional_reference(conn, ctx, "parent_id", EntityKind::Department, data.parent_id)
            .await?;
        scope::ensure_optional_reference(conn, ctx, "head_id", EntityKind::Employee, data.head_id)
            .await?;
        Ok(())
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: DepartmentInput,
    ) -> Result<Self, ScopeError> {
        Self::check_references(conn, ctx, &data).await?;

        let department = sqlx::query_as::<_, Department>(&format!(
            r#"
            INSERT INTO departments (tenant_id, name, code, description, parent_id, head_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.name)
        .bind(data.code)
        .bind(data.description)
        .bind(data.parent_id)
        .bind(data.head_id)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(department)
    }

    /// Replaces a department's fields
    ///
    /// # Errors
    ///
    /// `InvalidState` if the new parent is the department itself or one of
    /// its descendants.
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: DepartmentInput,
    ) -> Result<Self, ScopeError> {
        scope::find::<Department>(&mut *conn, ctx, id).await?;
        Self::check_references(&mut *conn, ctx, &data).await?;

        if let Some(parent_id) = data.parent_id {
            if scope::ancestry_contains(
                &mut *conn,
                ctx,
                EntityKind::Department,
                "parent_id",
                parent_id,
                id,
            )
            .await?
            {
                return Err(ScopeError::InvalidState(
                    "A department cannot be placed under itself or one of its sub-departments"
                        .to_string(),
                ));
            }
        }

        let department = sqlx::query_as::<_, Department>(&format!(
            r#"
            UPDATE departments
            SET name = $3, code = $4, description = $5, parent_id = $6, head_id = $7,
                is_active = $8, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.name)
        .bind(data.code)
        .bind(data.description)
        .bind(data.parent_id)
        .bind(data.head_id)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(department)
    }

    /// Soft-deletes a department that has no sub-departments or employees
    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::find::<Department>(&mut *conn, ctx, id).await?;

        let children =
            scope::count_referencing(&mut *conn, ctx, EntityKind::Department, "parent_id", id).await?;
        if children > 0 {
            return Err(ScopeError::InvalidState(
                "Department still has sub-departments".to_string(),
            ));
        }

        let employees =
            scope::count_referencing(&mut *conn, ctx, EntityKind::Employee, "department_id", id)
                .await?;
        if employees > 0 {
            return Err(ScopeError::InvalidState(
                "Department still has employees".to_string(),
            ));
        }

        scope::soft_delete::<Department>(conn, ctx, id).await
    }

    /// All live departments of the tenant as a forest
    pub async fn tree(conn: &mut PgConnection, ctx: &TenantContext) -> Result<Vec<DepartmentNode>, ScopeError> {
        let departments = scope::ScopedQuery::<Department>::new(ctx)
            .fetch_all_ordered(conn, "name")
            .await?;

        Ok(build_tree(departments))
    }
}
