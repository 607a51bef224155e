/// Authentication primitives for employees
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: access tokens bound to an employee and a tenant
/// - [`middleware`]: bearer-token checks that bind the token's tenant to
///   the tenant resolved from the request host
/// - [`session`]: employee liveness and token revocation
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use peoplehub_shared::auth::jwt::{create_token, Claims};
/// use peoplehub_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("employee password")?;
/// assert!(verify_password("employee password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), Duration::minutes(60));
/// let token = create_token(&claims, "a-secret-of-at-least-thirty-two-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;
