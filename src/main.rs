//! Gatekeeper Server - site access management
//!
//! REST API server for visitor approval, gate check-in and vehicle movements.

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gatekeeper_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Gatekeeper Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    if !config.email.enabled {
        tracing::warn!("Email is disabled, notifications will only be logged");
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state)?;

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Console output (pretty or JSON) plus an optional daily rolling file
fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("gatekeeper_server={},tower_http=debug", config.level).into()
    });

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "gatekeeper.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().json().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if config.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    guard
}

/// Create the application router with all routes
fn create_router(state: AppState) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The approval links are unauthenticated, so they are rate limited per client IP
    let approval = &state.config.approval;
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(approval.rate_limit_per_second.max(1))
        .burst_size(approval.rate_limit_burst.max(1))
        .finish()
        .context("Invalid approval rate limit configuration")?;

    let approvals = Router::new()
        .route(
            "/visit-approvals/:token",
            get(api::approvals::resolve_email_approval),
        )
        .layer(GovernorLayer {
            config: Arc::new(governor_conf),
        });

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Visits
        .route(
            "/visits",
            get(api::visits::list_visits).post(api::visits::create_visit),
        )
        .route("/visits/today", get(api::visits::today_counters))
        .route(
            "/visits/:id",
            get(api::visits::get_visit).delete(api::visits::delete_visit),
        )
        .route("/visits/:id/approve", post(api::visits::approve_visit))
        .route("/visits/:id/reject", post(api::visits::reject_visit))
        .route("/visits/:id/check-in", post(api::visits::check_in_visit))
        .route("/visits/:id/confirm", post(api::visits::confirm_visit))
        .route("/visits/:id/check-out", post(api::visits::check_out_visit))
        // Fleet movements
        .route(
            "/vehicle-movements",
            get(api::vehicles::list_movements).post(api::vehicles::record_movement),
        )
        .route(
            "/vehicle-movements/:id",
            put(api::vehicles::update_movement).delete(api::vehicles::delete_movement),
        )
        .route("/vehicles/on-site/stats", get(api::vehicles::on_site_stats))
        .route("/vehicles/status", get(api::vehicles::vehicle_status))
        // External movements
        .route(
            "/external-movements",
            get(api::external_movements::list_external_movements)
                .post(api::external_movements::record_external_movement),
        )
        .route(
            "/external-movements/on-site",
            get(api::external_movements::external_on_site),
        )
        .route(
            "/movements/recent",
            get(api::external_movements::recent_movements),
        )
        // Audit
        .route("/audit-logs", get(api::audit::list_audit_logs))
        .merge(approvals)
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Ok(Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}
