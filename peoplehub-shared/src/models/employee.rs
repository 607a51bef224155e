/// Employee model
///
/// Employees are also the tenant's users: they log in with email and
/// password against the tenant the request resolved to. Managers form a
/// forest through `manager_id`; a manager change that would close a cycle is
/// refused.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgConnection};
use uuid::Uuid;
use validator::Validate;

use super::enums::{EmploymentStatus, EmploymentType};
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,

    /// Argon2id hash (never serialized)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub hire_date: Option<NaiveDate>,

    #[sqlx(try_from = "String")]
    pub employment_status: EmploymentStatus,

    #[sqlx(try_from = "String")]
    pub employment_type: EmploymentType,

    /// Minor currency units
    pub salary: i64,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Employee {
    const KIND: EntityKind = EntityKind::Employee;
    const COLUMNS: &'static str = "id, tenant_id, email, password_hash, employee_code, first_name, \
         last_name, phone, department_id, position_id, team_id, manager_id, hire_date, \
         employment_status, employment_type, salary, is_active, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

/// Profile fields shared by create and replace
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmployeeProfile {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 20))]
    pub employee_code: String,

    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub hire_date: Option<NaiveDate>,

    #[serde(default = "default_status")]
    pub employment_status: EmploymentStatus,

    #[serde(default = "default_type")]
    pub employment_type: EmploymentType,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub salary: i64,
}

fn default_status() -> EmploymentStatus {
    EmploymentStatus::Active
}

fn default_type() -> EmploymentType {
    EmploymentType::FullTime
}

/// Payload for creating an employee
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewEmployee {
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: EmployeeProfile,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Payload for replacing an employee; the password changes only if given
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceEmployee {
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: EmployeeProfile,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

/// Collection filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    pub department_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub employment_status: Option<EmploymentStatus>,
}

impl Employee {
    async fn check_references(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        profile: &EmployeeProfile,
    ) -> Result<(), ScopeError> {
        scope::ensure_optional_reference(conn, ctx, "department_id", EntityKind::Department, profile.department_id)
            .await?;
        scope::ensure_optional_reference(conn, ctx, "position_id", EntityKind::Position, profile.position_id)
            .await?;
        scope::ensure_optional_reference(conn, ctx, "team_id", EntityKind::Team, profile.team_id)
            .await?;
        scope::ensure_optional_reference(conn, ctx, "manager_id", EntityKind::Employee, profile.manager_id)
            .await?;
        Ok(())
    }

    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: EmployeeFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<Employee>::new(ctx)
            .filter_opt("department_id", filter.department_id)
            .filter_opt("position_id", filter.position_id)
            .filter_opt("team_id", filter.team_id)
            .filter_opt("employment_status", filter.employment_status.map(|s| s.as_str()))
            .fetch_page(conn, page)
            .await
    }

    /// Inserts an employee with an already hashed password
    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        profile: EmployeeProfile,
        password_hash: String,
    ) -> Result<Self, ScopeError> {
        Self::check_references(conn, ctx, &profile).await?;

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (
                tenant_id, email, password_hash, employee_code, first_name, last_name, phone,
                department_id, position_id, team_id, manager_id, hire_date,
                employment_status, employment_type, salary, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(profile.email.to_lowercase())
        .bind(password_hash)
        .bind(profile.employee_code)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .bind(profile.phone)
        .bind(profile.department_id)
        .bind(profile.position_id)
        .bind(profile.team_id)
        .bind(profile.manager_id)
        .bind(profile.hire_date)
        .bind(profile.employment_status.as_str())
        .bind(profile.employment_type.as_str())
        .bind(profile.salary)
        .bind(profile.employment_status.keeps_account_active())
        .fetch_one(conn)
        .await?;

        Ok(employee)
    }

    /// Replaces an employee's profile, and password hash when given
    ///
    /// # Errors
    ///
    /// `InvalidState` if the new manager is the employee or one of their
    /// reports.
    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        profile: EmployeeProfile,
        password_hash: Option<String>,
    ) -> Result<Self, ScopeError> {
        scope::find::<Employee>(&mut *conn, ctx, id).await?;
        Self::check_references(&mut *conn, ctx, &profile).await?;

        if let Some(manager_id) = profile.manager_id {
            if scope::ancestry_contains(&mut *conn, ctx, EntityKind::Employee, "manager_id", manager_id, id)
                .await?
            {
                return Err(ScopeError::InvalidState(
                    "An employee cannot report to themselves or to one of their reports".to_string(),
                ));
            }
        }

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET email = $3, employee_code = $4, first_name = $5, last_name = $6, phone = $7,
                department_id = $8, position_id = $9, team_id = $10, manager_id = $11,
                hire_date = $12, employment_status = $13, employment_type = $14, salary = $15,
                is_active = $16, password_hash = COALESCE($17, password_hash), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(profile.email.to_lowercase())
        .bind(profile.employee_code)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .bind(profile.phone)
        .bind(profile.department_id)
        .bind(profile.position_id)
        .bind(profile.team_id)
        .bind(profile.manager_id)
        .bind(profile.hire_date)
        .bind(profile.employment_status.as_str())
        .bind(profile.employment_type.as_str())
        .bind(profile.salary)
        .bind(profile.employment_status.keeps_account_active())
        .bind(password_hash)
        .fetch_one(conn)
        .await?;

        Ok(employee)
    }

    /// Sets the employment status; `terminated` also deactivates the account
    pub async fn update_status(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        status: EmploymentStatus,
    ) -> Result<Self, ScopeError> {
        scope::find::<Employee>(&mut *conn, ctx, id).await?;

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET employment_status = $3, is_active = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(status.as_str())
        .bind(status.keeps_account_active())
        .fetch_one(conn)
        .await?;

        Ok(employee)
    }

    /// Soft-deletes an employee and clears the roles they held
    ///
    /// Department head, team leader and manager links pointing at the
    /// employee are reset in the same transaction.
    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        let mut tx = conn.begin().await?;

        scope::soft_delete::<Employee>(&mut *tx, ctx, id).await?;

        for sql in [
            "UPDATE departments SET head_id = NULL, updated_at = NOW() WHERE tenant_id = $1 AND head_id = $2",
            "UPDATE teams SET leader_id = NULL, updated_at = NOW() WHERE tenant_id = $1 AND leader_id = $2",
            "UPDATE employees SET manager_id = NULL, updated_at = NOW() WHERE tenant_id = $1 AND manager_id = $2",
        ] {
            sqlx::query(sql)
                .bind(ctx.tenant_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_by_code(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        code: &str,
    ) -> Result<Option<Self>, ScopeError> {
        ScopedQuery::<Employee>::new(ctx)
            .filter("employee_code", code.to_string())
            .fetch_optional(conn)
            .await
    }

    /// Looks up a login candidate by email within the request tenant
    pub async fn find_for_login(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        email: &str,
    ) -> Result<Option<Self>, ScopeError> {
        ScopedQuery::<Employee>::new(ctx)
            .filter("email", email.trim().to_lowercase())
            .fetch_optional(conn)
            .await
    }

    /// Team members, by last name
    pub async fn in_team(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        team_id: Uuid,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<Employee>::new(ctx)
            .filter("team_id", team_id)
            .fetch_all_ordered(conn, "last_name, first_name")
            .await
    }
}
