/// Admin token middleware for tenant provisioning
///
/// The `/admin` routes sit outside tenant resolution. They require the
/// `X-Admin-Token` header to equal the configured admin token.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{app::AppState, error::ApiError};

/// Header carrying the provisioning token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Compares without short-circuiting on the first differing byte
fn token_matches(given: &[u8], expected: &[u8]) -> bool {
    if given.len() != expected.len() {
        return false;
    }
    given
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

pub async fn admin_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing admin token".to_string()))?;

    if !token_matches(token.as_bytes(), state.config.admin.token.as_bytes()) {
        warn!(path = %req.uri().path(), "Rejected admin request with wrong token");
        return Err(ApiError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(next.run(req).await)
}
