/// Configuration management for the API server
///
/// Values are layered with the `config` crate, later layers winning:
///
/// 1. built-in defaults
/// 2. `PEOPLEHUB_*` environment variables, nested with `__`
///    (for example `PEOPLEHUB_JWT__ACCESS_TOKEN_MINUTES=30`)
/// 3. the well-known variables below
///
/// A `.env` file is loaded first when present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: secret for signing access tokens, 32+ characters (required)
/// - `ADMIN_TOKEN`: token for `/admin` provisioning routes, 16+ characters (required)
/// - `BASE_DOMAIN`: domain under which tenants get subdomains (default: `localhost`)
/// - `API_HOST`: host to bind to (default: `0.0.0.0`)
/// - `API_PORT`: port to bind to (default: `8080`)
/// - `RUST_LOG`, `LOG_FORMAT`: read by the binary's tracing setup
///
/// # Example
///
/// ```no_run
/// use peoplehub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;

use anyhow::Context as _;
use config::{Environment, Map};
use peoplehub_shared::db::pool::DatabaseConfig as PoolConfig;
use serde::{Deserialize, Serialize};

/// Environment variables that override their nested key directly
const OVERRIDES: [(&str, &str); 6] = [
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "jwt.secret"),
    ("ADMIN_TOKEN", "admin.token"),
    ("BASE_DOMAIN", "api.base_domain"),
    ("API_HOST", "api.host"),
    ("API_PORT", "api.port"),
];

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Tenants are addressed as `{subdomain}.{base_domain}`
    pub base_domain: String,

    /// Comma-separated allowed origins, `*` for any
    pub cors_origins: String,

    /// Enables HSTS and strict CORS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    pub max_connections: u32,
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_seconds: u64,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime
    pub access_token_minutes: i64,
}

/// Provisioning API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Expected value of the `X-Admin-Token` header
    pub token: String,
}

impl Config {
    /// Loads configuration from `.env` and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is missing, a value does not
    /// parse, or [`Config::validate`] rejects the result.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let overrides = OVERRIDES
            .iter()
            .filter_map(|(var, key)| env::var(var).ok().map(|value| (key.to_string(), value)))
            .collect();

        Self::load(Environment::with_prefix("PEOPLEHUB"), overrides)
    }

    /// Builds the configuration from an environment source and overrides
    ///
    /// Tests pass an [`Environment`] with an explicit source map so the
    /// process environment is never read.
    pub fn load(environment: Environment, overrides: Map<String, String>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080)?
            .set_default("api.base_domain", "localhost")?
            .set_default("api.cors_origins", "*")?
            .set_default("api.production", false)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_seconds", 30)?
            .set_default("jwt.access_token_minutes", 60)?
            .add_source(environment.prefix_separator("_").separator("__"));

        for (key, value) in overrides {
            builder = builder.set_override(key, value)?;
        }

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("invalid or missing configuration (DATABASE_URL, JWT_SECRET and ADMIN_TOKEN are required)")?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects weak secrets and nonsensical values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        if self.admin.token.len() < 16 {
            anyhow::bail!("ADMIN_TOKEN must be at least 16 characters long");
        }
        if self.jwt.access_token_minutes <= 0 {
            anyhow::bail!("jwt.access_token_minutes must be positive");
        }
        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }
        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Allowed CORS origins; `None` means any origin
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .api
            .cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }

    /// Pool settings for [`peoplehub_shared::db::pool`]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            acquire_timeout_seconds: self.database.acquire_timeout_seconds,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn env_source(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("PEOPLEHUB").source(Some(map))
    }

    fn required() -> Map<String, String> {
        [
            ("database.url", "postgresql://localhost/peoplehub_test"),
            ("jwt.secret", SECRET),
            ("admin.token", "admin-token-0123456789"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::load(env_source(&[]), required()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.base_domain, "localhost");
        assert_eq!(config.jwt.access_token_minutes, 60);
        assert_eq!(config.database.max_connections, 10);
        assert!(!config.api.production);
        assert_eq!(config.cors_origins(), None);
    }

    #[test]
    fn test_prefixed_environment() {
        let config = Config::load(
            env_source(&[
                ("PEOPLEHUB_API__PORT", "9090"),
                ("PEOPLEHUB_API__BASE_DOMAIN", "peoplehub.io"),
                ("PEOPLEHUB_API__CORS_ORIGINS", "https://a.io, https://b.io"),
                ("PEOPLEHUB_JWT__ACCESS_TOKEN_MINUTES", "15"),
            ]),
            required(),
        )
        .unwrap();

        assert_eq!(config.api.port, 9090);
        assert_eq!(config.api.base_domain, "peoplehub.io");
        assert_eq!(config.jwt.access_token_minutes, 15);
        assert_eq!(
            config.cors_origins(),
            Some(vec!["https://a.io".to_string(), "https://b.io".to_string()])
        );
    }

    #[test]
    fn test_overrides_win() {
        let mut overrides = required();
        overrides.insert("api.port".to_string(), "7070".to_string());

        let config = Config::load(env_source(&[("PEOPLEHUB_API__PORT", "9090")]), overrides).unwrap();
        assert_eq!(config.api.port, 7070);
    }

    #[test]
    fn test_short_secrets_rejected() {
        let mut overrides = required();
        overrides.insert("jwt.secret".to_string(), "short".to_string());
        assert!(Config::load(env_source(&[]), overrides).is_err());

        let mut overrides = required();
        overrides.insert("admin.token".to_string(), "short".to_string());
        assert!(Config::load(env_source(&[]), overrides).is_err());
    }

    #[test]
    fn test_missing_database_url() {
        let mut overrides = required();
        overrides.remove("database.url");
        assert!(Config::load(env_source(&[]), overrides).is_err());
    }
}
