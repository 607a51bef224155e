/// Team model
///
/// Membership is the employee's `team_id`; adding or removing a member
/// writes the employee row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgConnection};
use uuid::Uuid;
use validator::Validate;

use super::employee::Employee;
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub leader_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Team {
    const KIND: EntityKind = EntityKind::Team;
    const COLUMNS: &'static str = "id, tenant_id, department_id, name, code, description, leader_id, \
         is_active, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

/// A team with its members
#[derive(Debug, Clone, Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<Employee>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TeamInput {
    pub department_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 10))]
    pub code: String,

    pub description: Option<String>,
    pub leader_id: Option<Uuid>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Body of the member add/remove endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMember {
    pub employee_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamFilter {
    pub department_id: Option<Uuid>,
}

impl Team {
    async fn check_references(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: &TeamInput,
    ) -> Result<(), ScopeError> {
        scope::ensure_reference(conn, ctx, "department_id", EntityKind::Department, data.department_id)
            .await?;
        scope::ensure_optional_reference(conn, ctx, "leader_id", EntityKind::Employee, data.leader_id)
            .await?;
        Ok(())
    }

    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: TeamFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<Team>::new(ctx)
            .filter_opt("department_id", filter.department_id)
            .fetch_page(conn, page)
            .await
    }

    pub async fn detail(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<TeamDetail, ScopeError> {
        let team = scope::find::<Team>(&mut *conn, ctx, id).await?;
        let members = Employee::in_team(conn, ctx, id).await?;

        Ok(TeamDetail { team, members })
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: TeamInput,
    ) -> Result<Self, ScopeError> {
        Self::check_references(conn, ctx, &data).await?;

        let team = sqlx::query_as::<_, Team>(&format!(
            r#"
            INSERT INTO teams (tenant_id, department_id, name, code, description, leader_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.department_id)
        .bind(data.name)
        .bind(data.code)
        .bind(data.description)
        .bind(data.leader_id)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(team)
    }

    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: TeamInput,
    ) -> Result<Self, ScopeError> {
        scope::find::<Team>(&mut *conn, ctx, id).await?;
        Self::check_references(&mut *conn, ctx, &data).await?;

        let team = sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE teams
            SET department_id = $3, name = $4, code = $5, description = $6, leader_id = $7,
                is_active = $8, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(data.department_id)
        .bind(data.name)
        .bind(data.code)
        .bind(data.description)
        .bind(data.leader_id)
        .bind(data.is_active)
        .fetch_one(conn)
        .await?;

        Ok(team)
    }

    /// Soft-deletes a team without members
    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        scope::find::<Team>(&mut *conn, ctx, id).await?;

        let members = scope::count_referencing(&mut *conn, ctx, EntityKind::Employee, "team_id", id).await?;
        if members > 0 {
            return Err(ScopeError::InvalidState("Team still has members".to_string()));
        }

        scope::soft_delete::<Team>(conn, ctx, id).await
    }

    /// Moves an employee into the team
    pub async fn add_member(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        employee_id: Uuid,
    ) -> Result<TeamDetail, ScopeError> {
        let mut tx = conn.begin().await?;

        scope::find_for_update::<Team>(&mut *tx, ctx, id).await?;
        scope::ensure_reference(&mut *tx, ctx, "employee_id", EntityKind::Employee, employee_id).await?;

        sqlx::query(
            r#"
            UPDATE employees SET team_id = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id)
        .bind(ctx.tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let detail = Self::detail(&mut *tx, ctx, id).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Takes an employee out of the team
    ///
    /// # Errors
    ///
    /// `InvalidState` if the employee is not a member.
    pub async fn remove_member(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        employee_id: Uuid,
    ) -> Result<TeamDetail, ScopeError> {
        let mut tx = conn.begin().await?;

        scope::find_for_update::<Team>(&mut *tx, ctx, id).await?;
        let employee = scope::find::<Employee>(&mut *tx, ctx, employee_id).await?;
        if employee.team_id != Some(id) {
            return Err(ScopeError::InvalidState(
                "Employee is not a member of this team".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE employees SET team_id = NULL, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(employee_id)
        .bind(ctx.tenant_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE teams SET leader_id = NULL, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND leader_id = $3
            "#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

        let detail = Self::detail(&mut *tx, ctx, id).await?;
        tx.commit().await?;

        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation() {
        let input: TeamInput = serde_json::from_value(serde_json::json!({
            "department_id": Uuid::new_v4(),
            "name": "Platform",
            "code": "PLT",
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert!(input.leader_id.is_none());

        let blank = TeamInput {
            name: String::new(),
            ..input
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_member_body() {
        let id = Uuid::new_v4();
        let member: TeamMember =
            serde_json::from_value(serde_json::json!({ "employee_id": id })).unwrap();
        assert_eq!(member.employee_id, id);
    }
}
