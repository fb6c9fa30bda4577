//! Synchronous REST control surface: the catalog and invocation engine
//! exposed over conventional HTTP, mirroring the MCP operations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{Catalog, ToolConfig, DEFAULT_SERVER_NAME};
use crate::core::invoker::{InvokeResult, Invoker};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared handler state: the read-only catalog and the same invoker the
/// MCP runtime uses, so both transports behave identically.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub invoker: Invoker,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/server/info", get(server_info_handler))
        .route("/api/tools", get(tools_handler))
        .route("/api/tools/{name}", get(tool_handler))
        .route("/api/tools/{name}/execute", post(execute_handler))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ServerError> {
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "REST control surface listening");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "UP", "service": DEFAULT_SERVER_NAME }))
}

async fn server_info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.catalog.server_name(),
        "description": state.catalog.server_description(),
        "version": state.catalog.server_version(),
    }))
}

async fn tools_handler(State(state): State<AppState>) -> Json<Vec<ToolConfig>> {
    Json(state.catalog.tools.clone())
}

async fn tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ToolConfig>, StatusCode> {
    state
        .catalog
        .tool(&name)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn execute_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(args): Json<Map<String, Value>>,
) -> Result<Json<InvokeResult>, StatusCode> {
    let Some(tool) = state.catalog.tool(&name) else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(state.invoker.invoke(tool, &args).await))
}
