/// JWT access tokens for employees
///
/// A token names an employee (`sub`) and the tenant that employee belongs to
/// (`tenant_id`). The tenant claim is what lets the API refuse a token
/// presented on another tenant's host: the resolved tenant and the claim
/// must be equal.
///
/// # Security
///
/// - **Algorithm**: HS256
/// - **Issuer**: always `peoplehub`, checked on validation
/// - **Lifetime**: set by the caller (configured in minutes)
/// - **Revocation**: each token carries a random `jti`; logout records it
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use peoplehub_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-of-at-least-thirty-two-bytes";
/// let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), Duration::minutes(60));
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.tenant_id, claims.tenant_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every token
pub const ISSUER: &str = "peoplehub";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer or format rejected
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Employee ID
    pub sub: Uuid,

    /// Issuer, always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Token ID, recorded when the token is revoked
    pub jti: Uuid,

    /// Tenant the employee belongs to
    pub tenant_id: Uuid,
}

impl Claims {
    /// Claims for `employee_id` of `tenant_id`, valid for `expires_in`
    pub fn new(employee_id: Uuid, tenant_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: employee_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
            tenant_id,
        }
    }

    /// Seconds until expiry, zero once expired
    pub fn expires_in_seconds(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies signature, issuer, expiry and not-before, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}
