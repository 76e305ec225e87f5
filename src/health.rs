use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{error, info};

pub const LIVENESS_TEXT: &str = "Bot is running!";

pub fn router() -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/healthz", get(healthz))
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Binds synchronously so a bad address fails startup, then serves on a
/// dedicated single-threaded runtime. Returns the bound address.
pub fn spawn_health_server(addr: SocketAddr) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = StdTcpListener::bind(addr)
        .with_context(|| format!("failed to bind health listener on {addr}"))?;
    listener
        .set_nonblocking(true)
        .context("failed to make health listener non-blocking")?;
    let local = listener.local_addr().context("health listener has no address")?;

    let handle = thread::Builder::new()
        .name("health".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    error!(error = %err, "health runtime failed to start");
                    return;
                }
            };
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(l) => l,
                    Err(err) => {
                        error!(error = %err, "health listener rejected by runtime");
                        return;
                    }
                };
                info!(addr = %local, "health endpoint listening");
                if let Err(err) = axum::serve(listener, router()).await {
                    error!(error = %err, "health server stopped");
                }
            });
        })
        .context("failed to spawn health thread")?;

    Ok((local, handle))
}
