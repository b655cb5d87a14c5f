use analytics::AnalyticsEngine;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};
use chrono::{DateTime, Utc};
use configuration::Config;
use database::{DbRepository, ResellerRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod handlers;
pub mod report;

pub use auth::{require_reseller, Principal, SessionClaims, SessionVerifier};
pub use error::AppError;

/// Source of "now" for the reporting window.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ResellerRepository>,
    pub sessions: SessionVerifier,
    pub engine: AnalyticsEngine,
    pub window_days: u32,
    clock: Clock,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ResellerRepository>,
        sessions: SessionVerifier,
        engine: AnalyticsEngine,
        window_days: u32,
    ) -> Self {
        Self {
            repository,
            sessions,
            engine,
            window_days,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock, e.g. to pin the reporting window in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// Defines the application routes on top of the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/reseller/analytics", get(handlers::get_analytics))
        .route("/api/reseller/store", get(handlers::get_store))
        .route(
            "/api/reseller/store/settings",
            patch(handlers::update_store_settings),
        )
        .route("/reseller/analytics", get(handlers::analytics_page))
        .route("/reseller/settings", get(handlers::settings_page))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Connects to the database, builds the state and serves until Ctrl-C.
///
/// Tracing must already be initialized by the caller.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let db_pool = database::connect(&config.database).await?;
    if config.database.run_migrations {
        database::run_migrations(&db_pool).await?;
    }

    let repository: Arc<dyn ResellerRepository> = Arc::new(DbRepository::new(db_pool.clone()));
    let state = AppState::new(
        repository,
        SessionVerifier::from_settings(&config.auth),
        AnalyticsEngine::new(config.analytics.top_products_limit),
        config.analytics.window_days,
    );
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
    }
}
