use crate::signaling::{SignalingService, ws_handler};
use crate::{LivenessMonitor, ServerConfig, ServerError};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use tandem_core::IceServerConfig;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

#[derive(Debug, Serialize)]
struct HealthReport {
    rooms: usize,
    connections: usize,
}

async fn health(State(service): State<SignalingService>) -> Json<HealthReport> {
    Json(HealthReport {
        rooms: service.rooms().room_count(),
        connections: service.connections().len(),
    })
}

async fn ice_servers(State(service): State<SignalingService>) -> Json<Vec<IceServerConfig>> {
    Json(service.get_ice_servers())
}

/// Signaling socket, ICE config and health routes; everything else is static.
pub fn build_router(service: SignalingService, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/ice-servers", get(ice_servers))
        .route("/healthz", get(health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(service)
}

pub async fn serve<F>(config: ServerConfig, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .map_err(ServerError::Bind)?;
    serve_with_listener(listener, config, shutdown).await
}

pub async fn serve_with_listener<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let service = SignalingService::new(&config);
    let monitor =
        LivenessMonitor::new(service.connections().clone(), config.liveness_interval).spawn();
    let app = build_router(service, &config.static_dir);

    let addr = listener.local_addr().map_err(ServerError::Bind)?;
    info!("Signaling server listening on http://{}", addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    monitor.abort();
    info!("Signaling server stopped");
    result.map_err(ServerError::Serve)
}
