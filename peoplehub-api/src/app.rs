/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use peoplehub_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use peoplehub_shared::tenancy::{PgTenantDirectory, TenantDirectory};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    middleware::{
        admin::admin_auth_layer, auth::employee_auth_layer, security::SecurityHeadersLayer,
        tenant::resolve_tenant_layer,
    },
    routes,
};

/// Shared application state
///
/// Cloned per request; everything inside is a handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Where host names are looked up
    pub tenants: Arc<dyn TenantDirectory>,

    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by the Postgres tenant directory
    pub fn new(db: PgPool, config: Config) -> Self {
        let tenants = Arc::new(PgTenantDirectory::new(db.clone()));
        Self::with_directory(db, tenants, config)
    }

    /// State with an explicit tenant directory
    pub fn with_directory(db: PgPool, tenants: Arc<dyn TenantDirectory>, config: Config) -> Self {
        Self {
            db,
            tenants,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                              public
/// /admin/tenants[/:id[/activate|/deactivate]]   X-Admin-Token
/// /v1/auth/login                       tenant resolved from Host
/// /v1/...                              tenant resolved + JWT for that tenant
/// ```
///
/// Under `/v1` tenant resolution runs first, so an unknown host is a 404
/// even when no token is sent; the auth layer then rejects a token issued
/// for a different tenant with 403, and a logged-out token or one whose
/// employee is gone or inactive with 401.
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/tenants",
            get(routes::admin::list_tenants).post(routes::admin::create_tenant),
        )
        .route(
            "/tenants/:id",
            get(routes::admin::get_tenant).put(routes::admin::update_tenant),
        )
        .route("/tenants/:id/activate", post(routes::admin::activate_tenant))
        .route("/tenants/:id/deactivate", post(routes::admin::deactivate_tenant))
        .layer(from_fn_with_state(state.clone(), admin_auth_layer));

    let v1_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .merge(protected_routes(&state))
        .layer(from_fn_with_state(state.clone(), resolve_tenant_layer));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/admin", admin_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Everything that needs an employee token
fn protected_routes(state: &AppState) -> Router<AppState> {
    use routes::{
        auth, candidates, contracts, departments, employees, interviews, job_postings, leave_requests,
        leave_types, positions, teams,
    };

    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // organization
        .route("/departments", get(departments::list).post(departments::create))
        .route("/departments/tree", get(departments::tree))
        .route(
            "/departments/:id",
            get(departments::show).put(departments::update).delete(departments::destroy),
        )
        .route("/departments/:id/positions", get(departments::positions))
        .route("/positions", get(positions::list).post(positions::create))
        .route("/positions/active", get(positions::active))
        .route(
            "/positions/:id",
            get(positions::show).put(positions::update).delete(positions::destroy),
        )
        .route("/teams", get(teams::list).post(teams::create))
        .route(
            "/teams/:id",
            get(teams::show).put(teams::update).delete(teams::destroy),
        )
        .route(
            "/teams/:id/members",
            post(teams::add_member).delete(teams::remove_member),
        )
        .route("/employees", get(employees::list).post(employees::create))
        .route("/employees/code/:code", get(employees::show_by_code))
        .route(
            "/employees/:id",
            get(employees::show).put(employees::update).delete(employees::destroy),
        )
        .route("/employees/:id/status", patch(employees::update_status))
        .route("/employees/:id/contracts", get(employees::contracts))
        // contracts
        .route("/contracts", get(contracts::list).post(contracts::create))
        .route("/contracts/active", get(contracts::active))
        .route(
            "/contracts/:id",
            get(contracts::show).put(contracts::update).delete(contracts::destroy),
        )
        .route("/contracts/:id/sign", post(contracts::sign))
        .route("/contracts/:id/terminate", post(contracts::terminate))
        // leave
        .route("/leave-types", get(leave_types::list).post(leave_types::create))
        .route(
            "/leave-types/:id",
            get(leave_types::show).put(leave_types::update).delete(leave_types::destroy),
        )
        .route("/leave-requests", get(leave_requests::list).post(leave_requests::create))
        .route(
            "/leave-requests/:id",
            get(leave_requests::show)
                .put(leave_requests::update)
                .delete(leave_requests::destroy),
        )
        .route("/leave-requests/:id/approve", post(leave_requests::approve))
        .route("/leave-requests/:id/reject", post(leave_requests::reject))
        .route("/leave-requests/:id/cancel", post(leave_requests::cancel))
        // recruitment
        .route("/job-postings", get(job_postings::list).post(job_postings::create))
        .route(
            "/job-postings/:id",
            get(job_postings::show).put(job_postings::update).delete(job_postings::destroy),
        )
        .route("/job-postings/:id/publish", post(job_postings::publish))
        .route("/job-postings/:id/close", post(job_postings::close))
        .route("/candidates", get(candidates::list).post(candidates::create))
        .route(
            "/candidates/:id",
            get(candidates::show).put(candidates::update).delete(candidates::destroy),
        )
        .route("/candidates/:id/status", patch(candidates::update_status))
        .route("/interviews", get(interviews::list).post(interviews::create))
        .route(
            "/interviews/:id",
            get(interviews::show).put(interviews::update).delete(interviews::destroy),
        )
        .route("/interviews/:id/complete", post(interviews::complete))
        .route("/interviews/:id/cancel", post(interviews::cancel))
        .layer(from_fn_with_state(state.clone(), employee_auth_layer))
}

fn cors_layer(config: &Config) -> CorsLayer {
    match config.cors_origins() {
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-admin-token"),
                ])
                .max_age(Duration::from_secs(3600))
        }
    }
}
