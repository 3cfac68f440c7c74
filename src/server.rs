// src/server.rs

//! Keep-alive HTTP endpoint.
//!
//! Hosting platforms that idle out silent processes poll `GET /`; the
//! response carries no monitor state.

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

use crate::error::Result;

pub const LIVENESS_PAYLOAD: &str = "stockwatch is running";

/// Build the liveness router.
pub fn router() -> Router {
    Router::new().route("/", get(liveness))
}

async fn liveness() -> &'static str {
    LIVENESS_PAYLOAD
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Liveness endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Run the endpoint in the background; failures are logged, never fatal.
pub fn spawn(addr: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(&addr).await {
            log::error!("Liveness endpoint on {} stopped: {}", addr, e);
        }
    })
}
