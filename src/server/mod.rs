pub mod error;
pub mod handlers;
pub mod models;
pub mod upload;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::inference::engine::{load_engine, EngineSlot};
use crate::jobs::JobSupervisor;
use crate::utils::config::AppConfig;
use models::ImageLimits;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineSlot>,
    pub jobs: Arc<JobSupervisor>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, engine: Arc<EngineSlot>) -> Self {
        let jobs = Arc::new(JobSupervisor::from_config(Arc::clone(&engine), &config));
        Self {
            engine,
            jobs,
            config: Arc::new(config),
        }
    }

    pub fn image_limits(&self) -> ImageLimits {
        ImageLimits {
            max_bytes: self.config.max_image_size,
            max_pixels: self.config.max_pixels,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/ocr", post(handlers::recognize))
        .route("/v1/ocr/jobs", post(handlers::create_job))
        .route("/v1/ocr/jobs/:job_id", get(handlers::get_job))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Loads the models on the blocking pool and publishes them to `engine`.
///
/// The server keeps answering while this runs; a failed load leaves the
/// engine unavailable and is logged.
pub fn spawn_engine_load(config: Arc<AppConfig>, engine: Arc<EngineSlot>) {
    tokio::task::spawn_blocking(move || match load_engine(&config) {
        Ok(assembler) => {
            engine.install(assembler);
            tracing::info!("Recognition engine ready.");
        }
        Err(e) => {
            tracing::error!("Failed to load recognition engine: {}", e);
        }
    });
}

/// Periodically evicts expired jobs, when a retention period is set.
pub fn spawn_retention_sweep(jobs: Arc<JobSupervisor>) {
    let Some(retention) = jobs.retention() else {
        return;
    };
    let period = (retention / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            jobs.purge_expired();
        }
    });
}

pub async fn start_server(
    addr: SocketAddr,
    config: AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting server on {}", addr);

    let engine = Arc::new(EngineSlot::new());
    let state = AppState::new(config, Arc::clone(&engine));

    spawn_engine_load(Arc::clone(&state.config), engine);
    spawn_retention_sweep(Arc::clone(&state.jobs));

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoint: http://{}/v1/ocr", addr);
    tracing::info!("Jobs endpoint: http://{}/v1/ocr/jobs", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped.");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
