//! # PeopleHub API Server
//!
//! Multi-tenant HR and recruitment API. Tenants are resolved from the
//! request host (`acme.peoplehub.io` or a custom domain) and every query
//! is scoped to the resolved tenant.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/peoplehub \
//! JWT_SECRET=... ADMIN_TOKEN=... \
//! cargo run -p peoplehub-api
//! ```
//!
//! Set `LOG_FORMAT=json` for structured logs.

use anyhow::Context;
use peoplehub_api::{
    app::{build_router, AppState},
    config::Config,
};
use peoplehub_shared::db::{migrations::run_migrations, pool};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("PeopleHub API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;

    let db = pool::create_pool(&config.pool_config())
        .await
        .context("Failed to connect to database")?;
    run_migrations(&db).await.context("Failed to run migrations")?;

    let address = config.bind_address();
    let base_domain = config.api.base_domain.clone();
    let app = build_router(AppState::new(db.clone(), config));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(%address, %base_domain, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "peoplehub_api=debug,peoplehub_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
