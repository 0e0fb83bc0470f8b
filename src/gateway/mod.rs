//! Gateway Module
//!
//! The client-facing router and fan-out planner. Keeps a consistent-hash
//! ring of workers fresh through forwarded heartbeats, routes writes to the
//! owner of a geohash prefix, and answers box queries by fanning out to the
//! responsible shards (or broadcasting when the cover is coarser than the
//! sharding key) and merging the partial counts.

pub mod handlers;
pub mod planner;
pub mod state;

pub use state::GatewayState;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router, middleware,
    extract::Extension,
    routing::{get, post},
};
use uuid::Uuid;

use crate::config::{HB_TTL, advertised_address, env_or, wall_clock_secs};
use crate::discovery::client::gateway_heartbeat_loop;
use crate::discovery::protocol::ENDPOINT_WORKER_HEARTBEAT;
use crate::metrics::gateway_metrics;


/// Client API router: ping write/read, box query, metrics, CORS.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(
            "/ping",
            post(handlers::handle_post_ping).get(handlers::handle_get_ping),
        )
        .route("/pingArea", get(handlers::handle_get_ping_area))
        .route(
            "/metrics",
            get(|| async { crate::metrics::render(&gateway_metrics().registry) }),
        )
        .layer(middleware::from_fn(handlers::track_metrics))
        .layer(middleware::from_fn(handlers::cors))
        .layer(Extension(state))
}

/// Internal router receiving forwarded worker heartbeats.
pub fn heartbeat_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(ENDPOINT_WORKER_HEARTBEAT, post(handlers::handle_worker_heartbeat))
        .layer(Extension(state))
}

/// Wires up the gateway process: both listeners, the ring eviction sweep
/// and the self-registration heartbeat.
pub async fn run() -> Result<()> {
    let state = Arc::new(GatewayState::new());

    // ring eviction at half the liveness window
    let evictor = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HB_TTL / 2);
        loop {
            interval.tick().await;
            evictor
                .evict_stale_workers(HB_TTL.as_secs() as i64, wall_clock_secs())
                .await;
        }
    });

    // self-registration so the registry forwards worker heartbeats here
    let heartbeat_port = env_or("HEARTBEAT_PORT", "50051");
    let registry_address = env_or("REGISTRY_ADDRESS", "registry:50051");
    let gateway_id = Uuid::new_v4().to_string();
    let address = advertised_address("GATEWAY_ADDRESS", &heartbeat_port);
    tokio::spawn(gateway_heartbeat_loop(
        registry_address,
        gateway_id,
        address,
    ));

    let hb_app = heartbeat_router(state.clone());
    let hb_addr = format!("0.0.0.0:{}", heartbeat_port);
    let hb_listener = tokio::net::TcpListener::bind(&hb_addr).await?;
    tracing::info!("gateway heartbeat listener on {}", hb_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(hb_listener, hb_app).await {
            tracing::error!("heartbeat server failed: {}", e);
        }
    });

    let app = router(state);
    let port = env_or("PORT", "8080");
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gateway HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
