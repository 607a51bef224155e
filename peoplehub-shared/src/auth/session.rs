/// Server-side session state behind stateless tokens
///
/// A token that passed [`super::middleware::authenticate`] is only honoured
/// while its employee is live and active and its `jti` has not been revoked.
/// Soft-deleting or terminating an employee therefore ends their sessions on
/// the next request, and logout ends one session immediately.

use sqlx::PgConnection;
use tracing::{debug, info};

use super::middleware::AuthContext;
use crate::models::employee::Employee;
use crate::tenancy::scope::{self, ScopeError};
use crate::tenancy::TenantContext;

/// Error type for session checks
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Token has been revoked")]
    Revoked,

    /// Employee was deleted after the token was issued
    #[error("Employee no longer exists")]
    EmployeeGone,

    #[error("Employee account is inactive")]
    EmployeeInactive,

    #[error(transparent)]
    Scope(ScopeError),
}

impl From<ScopeError> for SessionError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::NotFound { .. } => SessionError::EmployeeGone,
            other => SessionError::Scope(other),
        }
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        SessionError::Scope(ScopeError::from(err))
    }
}

/// Whether `auth`'s token has been revoked
pub async fn is_revoked(conn: &mut PgConnection, auth: &AuthContext) -> Result<bool, SessionError> {
    let revoked: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1 AND tenant_id = $2)",
    )
    .bind(auth.token_id)
    .bind(auth.tenant_id)
    .fetch_one(conn)
    .await?;

    Ok(revoked)
}

/// Loads the token's employee, failing if the session may no longer be used
///
/// # Errors
///
/// - `Revoked` if the token was logged out
/// - `EmployeeGone` if the employee was deleted
/// - `EmployeeInactive` if the employee was deactivated or terminated
pub async fn ensure_active(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    auth: &AuthContext,
) -> Result<Employee, SessionError> {
    if is_revoked(&mut *conn, auth).await? {
        debug!(tenant_id = %ctx.tenant_id, token_id = %auth.token_id, "Rejected revoked token");
        return Err(SessionError::Revoked);
    }

    let employee: Employee = scope::find(conn, ctx, auth.employee_id).await?;
    if !employee.is_active {
        debug!(tenant_id = %ctx.tenant_id, employee_id = %employee.id, "Rejected token of inactive employee");
        return Err(SessionError::EmployeeInactive);
    }

    Ok(employee)
}

/// Revokes `auth`'s token and purges revocations that have expired
///
/// Revoking the same token twice is a no-op.
pub async fn revoke(
    conn: &mut PgConnection,
    ctx: &TenantContext,
    auth: &AuthContext,
) -> Result<(), SessionError> {
    sqlx::query(
        r#"
        INSERT INTO revoked_tokens (jti, tenant_id, employee_id, expires_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (jti) DO NOTHING
        "#,
    )
    .bind(auth.token_id)
    .bind(ctx.tenant_id)
    .bind(auth.employee_id)
    .bind(auth.expires_at)
    .execute(&mut *conn)
    .await?;

    let purged = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
        .execute(conn)
        .await?
        .rows_affected();

    info!(
        tenant_id = %ctx.tenant_id,
        employee_id = %auth.employee_id,
        purged,
        "Token revoked"
    );
    Ok(())
}
