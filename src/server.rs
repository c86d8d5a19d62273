use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header::ORIGIN, HeaderMap, Method},
    routing::any,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::payload::RequestBody;
use crate::relay::{InboundRequest, Relay, RelayResponse};

pub const RELAY_PATH: &str = "/api/send-telegram";

pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route(RELAY_PATH, any(send_telegram))
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

async fn send_telegram(
    State(relay): State<Arc<Relay>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> RelayResponse {
    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    relay
        .handle(InboundRequest {
            method,
            origin,
            body: RequestBody::raw(body),
        })
        .await
}

/// Bind and serve until SIGINT or SIGTERM.
pub async fn run(relay: Arc<Relay>) -> Result<()> {
    let addr = relay.config().server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Contact relay listening on http://{addr}{RELAY_PATH}");

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Contact relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
