//! Worker RPC Handlers
//!
//! HTTP endpoints exposing the `TimeWheel` to gateways. Handlers trust the
//! gateway to have validated client input; they only guard the parameters
//! that would make the engine misbehave.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};

use super::protocol::{
    GeohashCount, GetPingsResponse, PingAck, PingAreaRequest, PingAreaResponse, SendPingRequest,
};
use super::store::TimeWheel;
use crate::config::{MAX_GH_PRECISION, wall_clock_secs};
use crate::geo::Bbox;
use crate::metrics::worker_metrics;

pub async fn handle_send_ping(
    Extension(wheel): Extension<Arc<TimeWheel>>,
    Json(req): Json<SendPingRequest>,
) -> (StatusCode, Json<PingAck>) {
    tracing::debug!("received ping for geohash {}", req.geohash);

    wheel.insert(&req.geohash, wall_clock_secs());

    let prefix = &req.geohash[..req.geohash.len().min(3)];
    let m = worker_metrics();
    m.pings_stored_total.with_label_values(&[prefix]).inc();
    m.rpc_requests_total
        .with_label_values(&["SendPing", "success"])
        .inc();

    (StatusCode::OK, Json(PingAck { success: true }))
}

pub async fn handle_get_pings(
    Extension(wheel): Extension<Arc<TimeWheel>>,
    Path(geohash): Path<String>,
) -> (StatusCode, Json<GetPingsResponse>) {
    let now = wall_clock_secs();
    let count = wheel.point_count(&geohash, now);

    worker_metrics()
        .rpc_requests_total
        .with_label_values(&["GetPings", "success"])
        .inc();

    (
        StatusCode::OK,
        Json(GetPingsResponse {
            count,
            timestamp: now,
        }),
    )
}

pub async fn handle_ping_area(
    Extension(wheel): Extension<Arc<TimeWheel>>,
    Json(req): Json<PingAreaRequest>,
) -> (StatusCode, Json<PingAreaResponse>) {
    let precision = req.precision as usize;
    let agg_precision = req.agg_precision as usize;
    if precision == 0
        || precision > MAX_GH_PRECISION
        || agg_precision == 0
        || agg_precision > MAX_GH_PRECISION
    {
        worker_metrics()
            .rpc_requests_total
            .with_label_values(&["GetPingArea", "failure"])
            .inc();
        return (
            StatusCode::BAD_REQUEST,
            Json(PingAreaResponse { counts: Vec::new() }),
        );
    }

    let query = Bbox::new(req.min_lat, req.max_lat, req.min_lng, req.max_lng);
    let merged = wheel.box_count(
        precision,
        agg_precision,
        &query,
        &req.geohashes,
        wall_clock_secs(),
    );

    let counts = merged
        .into_iter()
        .map(|(geohash, count)| GeohashCount { geohash, count })
        .collect();

    worker_metrics()
        .rpc_requests_total
        .with_label_values(&["GetPingArea", "success"])
        .inc();

    (StatusCode::OK, Json(PingAreaResponse { counts }))
}
