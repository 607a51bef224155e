/// Tenant model and database operations
///
/// Tenants are the isolation boundary: every scoped row carries the id of
/// the tenant that owns it. Tenants are provisioned and managed through the
/// admin API, resolved per request by host, and deactivated rather than
/// deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tenants (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     subdomain VARCHAR(63) NOT NULL UNIQUE,
///     domain VARCHAR(255) UNIQUE,
///     email VARCHAR(255),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     settings JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use peoplehub_shared::models::tenant::{CreateTenant, Tenant};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = pool.acquire().await?;
/// let tenant = Tenant::create(
///     &mut conn,
///     CreateTenant {
///         name: "Acme Corp".to_string(),
///         subdomain: "acme".to_string(),
///         domain: None,
///         email: None,
///         settings: None,
///     },
/// )
/// .await?;
///
/// Tenant::set_active(&pool, tenant.id, false).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::{Validate, ValidationError};

const COLUMNS: &str =
    "id, name, subdomain, domain, email, is_active, settings, created_at, updated_at";

/// Tenant record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    /// Unique tenant ID
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// Label under the base domain (`acme` in `acme.hr.example.com`)
    pub subdomain: String,

    /// Optional custom domain
    pub domain: Option<String>,

    /// Contact email
    pub email: Option<String>,

    /// Inactive tenants do not resolve
    pub is_active: bool,

    /// Tenant-specific configuration (JSONB object)
    pub settings: JsonValue,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subdomains are single lower-case DNS labels
pub fn validate_subdomain(subdomain: &str) -> Result<(), ValidationError> {
    let valid = !subdomain.is_empty()
        && subdomain.len() <= 63
        && !subdomain.starts_with('-')
        && !subdomain.ends_with('-')
        && subdomain
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("subdomain")
            .with_message("must be a lower-case DNS label (a-z, 0-9, '-')".into()))
    }
}

/// Custom domains need at least two labels and no scheme, port or path
pub fn validate_domain(domain: &str) -> Result<(), ValidationError> {
    let labels: Vec<&str> = domain.split('.').collect();
    let valid = domain.len() <= 255
        && labels.len() >= 2
        && labels.iter().all(|label| validate_subdomain(label).is_ok());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("domain").with_message("must be a lower-case host name".into()))
    }
}

fn validate_settings(settings: &JsonValue) -> Result<(), ValidationError> {
    if settings.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("settings").with_message("must be a JSON object".into()))
    }
}

/// Input for creating a tenant
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTenant {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(custom(function = "validate_subdomain"))]
    pub subdomain: String,

    #[validate(custom(function = "validate_domain"))]
    pub domain: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(custom(function = "validate_settings"))]
    pub settings: Option<JsonValue>,
}

/// Input for updating a tenant
///
/// Only present fields change. Settings are merged into the stored object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTenant {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_domain"))]
    pub domain: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(custom(function = "validate_settings"))]
    pub settings: Option<JsonValue>,
}

impl Tenant {
    /// Inserts a tenant
    ///
    /// Takes a connection so provisioning can run it inside the same
    /// transaction as the first employee.
    ///
    /// # Errors
    ///
    /// Returns an error if the subdomain or domain is already taken.
    pub async fn create(conn: &mut PgConnection, data: CreateTenant) -> Result<Self, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            r#"
            INSERT INTO tenants (name, subdomain, domain, email, settings)
            VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb))
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.subdomain.to_ascii_lowercase())
        .bind(data.domain.map(|d| d.to_ascii_lowercase()))
        .bind(data.email)
        .bind(data.settings)
        .fetch_one(conn)
        .await?;

        Ok(tenant)
    }

    /// Finds a tenant by ID, active or not
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {COLUMNS} FROM tenants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Finds the active tenant registered under `subdomain`
    pub async fn find_active_by_subdomain(
        pool: &PgPool,
        subdomain: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {COLUMNS} FROM tenants WHERE subdomain = $1 AND is_active"
        ))
        .bind(subdomain)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Finds the active tenant using `domain` as its custom domain
    pub async fn find_active_by_domain(
        pool: &PgPool,
        domain: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {COLUMNS} FROM tenants WHERE domain = $1 AND is_active"
        ))
        .bind(domain)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Updates an existing tenant
    ///
    /// Returns `None` if the tenant doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTenant,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tenants SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.domain.is_some() {
            bind_count += 1;
            query.push_str(&format!(", domain = ${bind_count}"));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${bind_count}"));
        }
        if data.settings.is_some() {
            bind_count += 1;
            query.push_str(&format!(", settings = settings || ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, Tenant>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(domain) = data.domain {
            q = q.bind(domain.to_ascii_lowercase());
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(settings) = data.settings {
            q = q.bind(settings);
        }

        let tenant = q.fetch_optional(pool).await?;

        Ok(tenant)
    }

    /// Activates or deactivates a tenant
    ///
    /// A deactivated tenant stops resolving on the next request; its data is
    /// kept.
    pub async fn set_active(
        pool: &PgPool,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            r#"
            UPDATE tenants
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Lists tenants, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tenants = sqlx::query_as::<_, Tenant>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM tenants
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tenants)
    }

    /// Counts all tenants
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tenants")
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Deletes a tenant and, by cascade, all of its data
    ///
    /// Not exposed over HTTP; used to clean up after integration tests.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subdomain() {
        assert!(validate_subdomain("acme").is_ok());
        assert!(validate_subdomain("acme-2").is_ok());
        assert!(validate_subdomain("").is_err());
        assert!(validate_subdomain("Acme").is_err());
        assert!(validate_subdomain("-acme").is_err());
        assert!(validate_subdomain("acme.corp").is_err());
        assert!(validate_subdomain(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("people.acme.io").is_ok());
        assert!(validate_domain("localhost").is_err());
        assert!(validate_domain("https://acme.io").is_err());
        assert!(validate_domain("acme.io:8080").is_err());
    }

    #[test]
    fn test_create_tenant_validation() {
        let data = CreateTenant {
            name: "Acme".to_string(),
            subdomain: "acme".to_string(),
            domain: Some("people.acme.io".to_string()),
            email: Some("hr@acme.io".to_string()),
            settings: Some(serde_json::json!({"timezone": "UTC"})),
        };
        assert!(data.validate().is_ok());

        let bad = CreateTenant {
            subdomain: "Not Valid".to_string(),
            settings: Some(serde_json::json!([1, 2])),
            ..data
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("subdomain"));
        assert!(fields.contains_key("settings"));
    }

    #[test]
    fn test_update_tenant_default_is_empty() {
        let update = UpdateTenant::default();
        assert!(update.name.is_none());
        assert!(update.validate().is_ok());
    }
}
