//! Registry Module
//!
//! The discovery rendezvous: workers heartbeat here from anywhere, and the
//! registry relays each announcement to every gateway it currently knows.
//! Gateways register themselves with their own heartbeat and are evicted
//! after `HB_TTL` of silence.
//!
//! The registry holds no routing state of its own; its only job is keeping
//! gateway rings warm.

pub mod handlers;
pub mod service;

pub use service::RegistryState;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};

use crate::config::env_or;
use crate::discovery::protocol::{ENDPOINT_GATEWAY_HEARTBEAT, ENDPOINT_WORKER_HEARTBEAT};
use crate::metrics;


/// Wires up the registry process: heartbeat endpoints, the dead-gateway
/// sweeper, and the metrics listener.
pub async fn run() -> Result<()> {
    let state = Arc::new(RegistryState::new());

    let sweeper = state.clone();
    tokio::spawn(async move {
        sweeper.cleanup_loop().await;
    });

    let metrics_port = env_or("METRICS_PORT", "9090");
    let metrics_app = Router::new().route(
        "/metrics",
        get(|| async { metrics::render(&metrics::registry_metrics().registry) }),
    );
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", metrics_port);
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, metrics_app).await {
                    tracing::error!("metrics server failed: {}", e);
                }
            }
            Err(e) => tracing::error!("failed to bind metrics listener on {}: {}", addr, e),
        }
    });

    let app = Router::new()
        .route(ENDPOINT_WORKER_HEARTBEAT, post(handlers::handle_worker_heartbeat))
        .route(ENDPOINT_GATEWAY_HEARTBEAT, post(handlers::handle_gateway_heartbeat))
        .layer(Extension(state));

    let port = env_or("PORT", "50051");
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("registry listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
