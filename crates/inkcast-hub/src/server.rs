//! Axum-based WebSocket server.

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use inkcast_core::config::ServerConfig;

use crate::connection::handle_ws_connection;
use crate::hub::Hub;

/// Build the router: the WebSocket endpoint at `ws_path` plus `/health`.
pub fn router(hub: Arc<Hub>, ws_path: &str) -> Router {
    Router::new()
        .route(ws_path, get(ws_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(hub: Arc<Hub>, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");
    serve(listener, hub, &config.path).await
}

/// Serve on an already-bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, hub: Arc<Hub>, ws_path: &str) -> anyhow::Result<()> {
    #[allow(unused_mut)]
    let mut app = router(hub, ws_path);

    #[cfg(feature = "metrics")]
    {
        let handle = crate::metrics::install_prometheus_recorder()?;
        app = app.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );
    }

    if let Ok(addr) = listener.local_addr() {
        info!(path = ws_path, "WebSocket endpoint ws://{addr}{ws_path}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(hub, socket))
}

async fn health_handler(State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": hub.subscriber_count().await,
        "log_len": hub.log_len().await,
    }))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(%e, "Failed to install Ctrl-C handler, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
