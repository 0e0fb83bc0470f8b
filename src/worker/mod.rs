//! Worker Storage Module
//!
//! The leaf of the cluster: owns a shard of geohash prefixes and counts
//! pings in a TTL-bounded, time-bucketed trie.
//!
//! ## Core Concepts
//! - **Time wheel**: a fixed array of one-second slots indexed by
//!   `timestamp mod TTL`. A slot is overwritten when its second comes
//!   around again, so memory is bounded without any reference counting.
//! - **Counting trie**: inside each bucket, a base-32 trie keyed by geohash
//!   bytes; every node holds the count of pings sharing its prefix.
//! - **Expiry by read filter**: reads skip buckets older than `now - TTL`.
//!   The janitor only releases memory; correctness never depends on it.

pub mod handlers;
pub mod protocol;
pub mod store;

pub use store::TimeWheel;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use uuid::Uuid;

use crate::config::{PING_TTL_SECS, advertised_address, env_or, wall_clock_secs};
use crate::discovery::client::worker_heartbeat_loop;
use crate::metrics;

#[cfg(test)]
mod tests;

/// RPC router served to gateways.
pub fn router(wheel: Arc<TimeWheel>) -> Router {
    Router::new()
        .route(protocol::ENDPOINT_SEND_PING, post(handlers::handle_send_ping))
        .route(
            &format!("{}/:geohash", protocol::ENDPOINT_GET_PINGS),
            get(handlers::handle_get_pings),
        )
        .route(protocol::ENDPOINT_PING_AREA, post(handlers::handle_ping_area))
        .layer(Extension(wheel))
}

/// Wires up the worker process: the storage engine, its janitor, the
/// registry heartbeat and the RPC listener.
pub async fn run() -> Result<()> {
    let wheel = Arc::new(TimeWheel::new());

    // the janitor only reclaims memory; reads filter stale buckets anyway
    let sweeper = wheel.clone();
    tokio::spawn(async move {
        let interval_secs = (5 * PING_TTL_SECS) / 2;
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs as u64));
        loop {
            interval.tick().await;
            sweeper.sweep(wall_clock_secs());
        }
    });

    let port = env_or("PORT", "50051");
    let registry_address = env_or("REGISTRY_ADDRESS", "registry:50051");
    let worker_id = Uuid::new_v4().to_string();
    let address = advertised_address("WORKER_ADDRESS", &port);
    tokio::spawn(worker_heartbeat_loop(registry_address, worker_id, address));

    let metrics_port = env_or("METRICS_PORT", "9090");
    let metrics_app = Router::new().route(
        "/metrics",
        get(|| async { metrics::render(&metrics::worker_metrics().registry) }),
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

    let app = router(wheel);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("worker RPC server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
