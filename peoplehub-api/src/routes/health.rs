/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// Not tenant-resolved. Reports `degraded` instead of failing when the
/// database does not answer, so load balancers can tell the two apart.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// ```

use axum::{extract::State, Json};
use peoplehub_shared::db::pool;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}
