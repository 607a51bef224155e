/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; every error renders as
///
/// ```json
/// { "error": "forbidden", "message": "...", "details": [...] }
/// ```
///
/// `details` is only present for validation failures. Internal errors are
/// logged and replaced by a generic message.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use peoplehub_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError, session::SessionError},
    tenancy::{ResolveError, ScopeError},
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (400)
    BadRequest(String),

    /// Missing or invalid credentials (401)
    Unauthorized(String),

    /// Entity or token belongs to another tenant (403)
    Forbidden(String),

    /// Host names no active tenant (404)
    TenantNotFound(String),

    /// Not found (404)
    NotFound(String),

    /// Unique constraint hit (409)
    Conflict(String),

    /// Referenced id belongs to another tenant (422)
    CrossTenantReference(String),

    /// Field validation failed (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Operation not allowed in the entity's current state (422)
    InvalidState(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation, `__all__` for cross-field checks
    pub field: String,

    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g. `tenant_not_found`, `cross_tenant_reference`)
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        }])
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::TenantNotFound(_) => (StatusCode::NOT_FOUND, "tenant_not_found"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::CrossTenantReference(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "cross_tenant_reference")
            }
            ApiError::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ApiError::InvalidState(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_state"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::TenantNotFound(host) => write!(f, "No active tenant for host '{}'", host),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::CrossTenantReference(msg) => write!(f, "Cross-tenant reference: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match self {
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::TenantNotFound(host) => (format!("No active tenant for host '{}'", host), None),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::CrossTenantReference(msg)
            | ApiError::InvalidState(msg) => (msg, None),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<ScopeError> for ApiError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ScopeError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
            ScopeError::CrossTenantReference { .. } | ScopeError::ReferenceViolation(_) => {
                ApiError::CrossTenantReference(err.to_string())
            }
            ScopeError::MissingReference { field, .. } => ApiError::invalid_field(field, err.to_string()),
            ScopeError::Conflict(msg) => ApiError::Conflict(msg),
            ScopeError::InvalidState(msg) => ApiError::InvalidState(msg),
            ScopeError::UnsupportedSort(_) => ApiError::invalid_field("sort", err.to_string()),
            ScopeError::Database(e) => ApiError::InternalError(format!("Database error: {}", e)),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::TenantNotFound(host) => ApiError::TenantNotFound(host),
            ResolveError::Lookup(e) => ApiError::InternalError(format!("Tenant lookup failed: {}", e)),
        }
    }
}

/// For tenant-directory writes, which bypass the scoped layer
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ScopeError::from(err).into()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::TenantMismatch => ApiError::Forbidden(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Scope(err) => err.into(),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::Invalid(_) => ApiError::Unauthorized(err.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("Blocking task failed: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = Vec::new();
        collect_details(&errors, None, &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

/// Flattens nested validator errors into `field` / `parent.field` entries
fn collect_details(errors: &ValidationErrors, prefix: Option<&str>, out: &mut Vec<ValidationErrorDetail>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(parent) => format!("{}.{}", parent, field),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|error| ValidationErrorDetail {
                    field: path.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation failed: {}", error.code)),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_details(nested, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_details(nested, Some(&format!("{}[{}]", path, index)), out);
                }
            }
        }
    }
}

/// Runs the `validator` derive and maps failures to a 422
pub fn validate_request<T: Validate>(value: &T) -> ApiResult<()> {
    value.validate().map_err(ApiError::from)
}
