/// Employment contract model
///
/// A contract binds an employee to a position. While a contract is (or
/// becomes) `active`, the employee's `position_id` follows it; both rows are
/// written in one transaction so a failure leaves neither changed.
///
/// Lifecycle:
///
/// ```text
/// draft --(both parties sign)--> active --(terminate)--> terminated
///   \----------------------(terminate)-------------------^
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgConnection};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::employee::Employee;
use super::enums::{ContractStatus, ContractType, Signatory};
use crate::tenancy::scope::{self, EntityKind, Page, ScopeError, ScopedQuery, TenantOwned};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contract {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub position_id: Uuid,
    pub contract_number: String,

    #[sqlx(try_from = "String")]
    pub contract_type: ContractType,

    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,

    /// Minor currency units
    pub salary: i64,

    pub benefits: Option<String>,
    pub terms: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: ContractStatus,

    pub signed_by_employee: bool,
    pub signed_by_employer: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub termination_date: Option<NaiveDate>,
    pub termination_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Contract {
    const KIND: EntityKind = EntityKind::Contract;
    const COLUMNS: &'static str = "id, tenant_id, employee_id, position_id, contract_number, \
         contract_type, start_date, end_date, salary, benefits, terms, status, signed_by_employee, \
         signed_by_employer, signed_at, termination_date, termination_reason, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }
}

fn validate_period(terms: &ContractTerms) -> Result<(), ValidationError> {
    match terms.end_date {
        Some(end) if end <= terms.start_date => Err(ValidationError::new("period")
            .with_message("end_date must be after start_date".into())),
        _ => Ok(()),
    }
}

/// Fields that may be set on create and replaced on update
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_period"))]
pub struct ContractTerms {
    pub position_id: Uuid,

    #[validate(length(min = 1, max = 50))]
    pub contract_number: String,

    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 0))]
    pub salary: i64,

    pub benefits: Option<String>,
    pub terms: Option<String>,

    #[serde(default = "default_status")]
    pub status: ContractStatus,
}

fn default_status() -> ContractStatus {
    ContractStatus::Draft
}

/// Create payload; the employee cannot be changed afterwards
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewContract {
    pub employee_id: Uuid,

    #[serde(flatten)]
    #[validate(nested)]
    pub terms: ContractTerms,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignContract {
    pub signed_by: Signatory,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TerminateContract {
    pub termination_date: NaiveDate,

    #[validate(length(min = 1))]
    pub termination_reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractFilter {
    pub employee_id: Option<Uuid>,
    pub status: Option<ContractStatus>,
}

/// Status after a signature is recorded
pub fn status_after_signing(
    current: ContractStatus,
    signed_by_employee: bool,
    signed_by_employer: bool,
) -> ContractStatus {
    if signed_by_employee && signed_by_employer {
        ContractStatus::Active
    } else {
        current
    }
}

async fn assign_position(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    employee_id: Uuid,
    position_id: Uuid,
) -> Result<(), ScopeError> {
    sqlx::query(
        r#"
        UPDATE employees SET position_id = $3, updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(employee_id)
    .bind(ctx.tenant_id)
    .bind(position_id)
    .execute(conn)
    .await?;

    Ok(())
}

impl Contract {
    pub async fn list(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        filter: ContractFilter,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        ScopedQuery::<Contract>::new(ctx)
            .filter_opt("employee_id", filter.employee_id)
            .filter_opt("status", filter.status.map(|s| s.as_str()))
            .fetch_page(conn, page)
            .await
    }

    /// Contracts of one employee; the employee must be visible
    pub async fn for_employee(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        employee_id: Uuid,
        page: Page,
    ) -> Result<Vec<Self>, ScopeError> {
        scope::find::<Employee>(&mut *conn, ctx, employee_id).await?;

        let filter = ContractFilter {
            employee_id: Some(employee_id),
            status: None,
        };
        Self::list(conn, ctx, filter, page).await
    }

    pub async fn create(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        data: NewContract,
    ) -> Result<Self, ScopeError> {
        let mut tx = conn.begin().await?;

        scope::ensure_reference(&mut *tx, ctx, "employee_id", EntityKind::Employee, data.employee_id)
            .await?;
        scope::ensure_reference(&mut *tx, ctx, "position_id", EntityKind::Position, data.terms.position_id)
            .await?;

        let terms = data.terms;
        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            INSERT INTO contracts (
                tenant_id, employee_id, position_id, contract_number, contract_type,
                start_date, end_date, salary, benefits, terms, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(ctx.tenant_id)
        .bind(data.employee_id)
        .bind(terms.position_id)
        .bind(terms.contract_number)
        .bind(terms.contract_type.as_str())
        .bind(terms.start_date)
        .bind(terms.end_date)
        .bind(terms.salary)
        .bind(terms.benefits)
        .bind(terms.terms)
        .bind(terms.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if contract.status == ContractStatus::Active {
            assign_position(&mut *tx, ctx, contract.employee_id, contract.position_id).await?;
        }

        tx.commit().await?;
        Ok(contract)
    }

    pub async fn update(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        terms: ContractTerms,
    ) -> Result<Self, ScopeError> {
        let mut tx = conn.begin().await?;

        scope::find_for_update::<Contract>(&mut *tx, ctx, id).await?;
        scope::ensure_reference(&mut *tx, ctx, "position_id", EntityKind::Position, terms.position_id)
            .await?;

        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET position_id = $3, contract_number = $4, contract_type = $5, start_date = $6,
                end_date = $7, salary = $8, benefits = $9, terms = $10, status = $11,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(terms.position_id)
        .bind(terms.contract_number)
        .bind(terms.contract_type.as_str())
        .bind(terms.start_date)
        .bind(terms.end_date)
        .bind(terms.salary)
        .bind(terms.benefits)
        .bind(terms.terms)
        .bind(terms.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if contract.status == ContractStatus::Active {
            assign_position(&mut *tx, ctx, contract.employee_id, contract.position_id).await?;
        }

        tx.commit().await?;
        Ok(contract)
    }

    /// Soft-deletes a draft contract
    pub async fn delete(conn: &mut PgConnection, ctx: &TenantContext, id: Uuid) -> Result<(), ScopeError> {
        let contract = scope::find::<Contract>(&mut *conn, ctx, id).await?;
        if !contract.status.can_delete() {
            return Err(ScopeError::InvalidState(format!(
                "Only draft contracts can be deleted (status is {})",
                contract.status
            )));
        }

        scope::soft_delete::<Contract>(conn, ctx, id).await
    }

    /// Records a signature; the second signature activates the contract
    pub async fn sign(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        signed_by: Signatory,
    ) -> Result<Self, ScopeError> {
        let mut tx = conn.begin().await?;

        let current = scope::find_for_update::<Contract>(&mut *tx, ctx, id).await?;
        if !current.status.can_sign() {
            return Err(ScopeError::InvalidState(format!(
                "A {} contract cannot be signed",
                current.status
            )));
        }

        let signed_by_employee = current.signed_by_employee || signed_by == Signatory::Employee;
        let signed_by_employer = current.signed_by_employer || signed_by == Signatory::Employer;
        let status = status_after_signing(current.status, signed_by_employee, signed_by_employer);

        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET signed_by_employee = $3, signed_by_employer = $4, status = $5,
                signed_at = CASE WHEN $3 AND $4 THEN COALESCE(signed_at, NOW()) ELSE signed_at END,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(signed_by_employee)
        .bind(signed_by_employer)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if contract.status == ContractStatus::Active && current.status != ContractStatus::Active {
            assign_position(&mut *tx, ctx, contract.employee_id, contract.position_id).await?;
            info!(
                tenant_id = %ctx.tenant_id,
                contract_id = %contract.id,
                employee_id = %contract.employee_id,
                "Contract activated"
            );
        }

        tx.commit().await?;
        Ok(contract)
    }

    pub async fn terminate(
        conn: &mut PgConnection,
        ctx: &TenantContext,
        id: Uuid,
        data: TerminateContract,
    ) -> Result<Self, ScopeError> {
        let mut tx = conn.begin().await?;

        let current = scope::find_for_update::<Contract>(&mut *tx, ctx, id).await?;
        if !current.status.can_terminate() {
            return Err(ScopeError::InvalidState(format!(
                "A {} contract cannot be terminated",
                current.status
            )));
        }
        if data.termination_date < current.start_date {
            return Err(ScopeError::InvalidState(
                "termination_date is before the contract start".to_string(),
            ));
        }

        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET status = $3, termination_date = $4, termination_reason = $5, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {}
            "#,
            Self::COLUMNS
        ))
        .bind(id)
        .bind(ctx.tenant_id)
        .bind(ContractStatus::Terminated.as_str())
        .bind(data.termination_date)
        .bind(data.termination_reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(contract)
    }
}
