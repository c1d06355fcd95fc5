use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use thiserror::Error;
use uuid::Uuid;
use log::info;
use anyhow::Context;
use anyhow::Error as AnyhowError;

use models::CloudNode;

pub mod config;
pub mod manager;
pub mod notifications;

pub use crate::config::{load_compute_config, ComputeConfig};
pub use crate::manager::{ComputeError, NodeManager};
pub use crate::notifications::{ComputeEvent, NotificationHub};

// Define the compute API error enum
#[derive(Debug, Error)]
pub enum ComputeApiError {
    #[error(transparent)]
    Compute(#[from] ComputeError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Implement IntoResponse for ComputeApiError to convert it into an HTTP response
impl IntoResponse for ComputeApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ComputeApiError::Compute(e @ ComputeError::NodeNotFound { .. }) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            ComputeApiError::Compute(e @ ComputeError::NotStoppable { .. }) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ComputeApiError::Compute(ComputeError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ComputeApiError::Compute(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ComputeApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ComputeApiError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("IO error: {}", e)),
        };

        let body = Json(json!({
            "status": "error",
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

// Shared state for the Axum application
#[derive(Clone)]
pub struct AppState {
    pub manager: NodeManager,
}

#[derive(Debug, Deserialize)]
struct UpdateNodeRequest {
    name: String,
}

// Handler for PUT /v2/compute/projects/:project_id/cloud/nodes/:node_id
async fn update_node_handler(
    State(state): State<AppState>,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateNodeRequest>, JsonRejection>,
) -> Result<Json<CloudNode>, ComputeApiError> {
    let Json(payload) =
        payload.map_err(|e| ComputeApiError::InvalidInput(format!("Invalid node body: {}", e)))?;

    let node = state
        .manager
        .rename_node(&project_id, &node_id, &payload.name)
        .await?;
    Ok(Json(node))
}

// Handler for POST /v2/compute/projects/:project_id/cloud/nodes/:node_id/stop
async fn stop_node_handler(
    State(state): State<AppState>,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ComputeApiError> {
    state.manager.stop_node(&project_id, &node_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Builds the compute router: rename and stop for cloud nodes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::PUT, Method::POST])
        .allow_origin(Any);

    Router::new()
        .route(
            "/v2/compute/projects/:project_id/cloud/nodes/:node_id",
            put(update_node_handler),
        )
        .route(
            "/v2/compute/projects/:project_id/cloud/nodes/:node_id/stop",
            post(stop_node_handler),
        )
        .with_state(state)
        .layer(cors)
}

// Main function to start the compute API server
pub async fn start_server(
    config: &ComputeConfig,
    manager: NodeManager,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), AnyhowError> {
    let app = create_router(AppState { manager });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid compute API listen address")?;
    info!("Compute API server listening on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .context("Compute API server failed to start or run")?;

    info!("Compute API server stopped.");
    Ok(())
}
