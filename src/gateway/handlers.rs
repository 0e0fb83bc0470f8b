//! Gateway HTTP Handlers
//!
//! The client-facing surface: ping writes, point reads, box queries. These
//! handlers validate input, route through the ring, and translate RPC
//! failures into HTTP statuses. Middleware for CORS and per-endpoint
//! metrics lives here too.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    extract::{Extension, MatchedPath, Query, Request, rejection::JsonRejection},
    http::{Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::planner;
use super::state::{GatewayState, RpcError};
use crate::config::{MAX_GH_PRECISION, SHARDING_PRECISION, wall_clock_secs};
use crate::discovery::protocol::{HeartbeatAck, WorkerHeartbeat};
use crate::geo::Bbox;
use crate::geo::geohash::encode;
use crate::metrics::gateway_metrics;

#[derive(Debug, Deserialize)]
pub struct PingBody {
    lat: Option<f64>,
    lng: Option<f64>,
}

// --- middleware ---

/// Allow-any-origin CORS; preflights are answered with 204 and never reach
/// the handlers.
pub async fn cors(req: Request, next: Next) -> Response {
    let preflight = req.method() == Method::OPTIONS;
    let mut response = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

/// Per-endpoint request counter and latency histogram.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().clone();

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    let status = response.status().as_u16().to_string();
    let m = gateway_metrics();
    m.http_requests_total
        .with_label_values(&[&endpoint, &status])
        .inc();
    m.http_latency
        .with_label_values(&[&endpoint])
        .observe(elapsed.as_secs_f64());

    tracing::debug!(
        "{} {} -> {} in {:?}",
        method,
        endpoint,
        response.status(),
        elapsed
    );
    response
}

// --- client API ---

pub async fn handle_post_ping(
    Extension(state): Extension<Arc<GatewayState>>,
    payload: Result<Json<PingBody>, JsonRejection>,
) -> Response {
    let Ok(Json(ping)) = payload else {
        return (StatusCode::BAD_REQUEST, "Invalid request body").into_response();
    };

    let (Some(lat), Some(lng)) = (ping.lat, ping.lng) else {
        return (StatusCode::BAD_REQUEST, "Missing lat or lng").into_response();
    };

    if !lat.is_finite() || !lng.is_finite() {
        return (StatusCode::BAD_REQUEST, "Invalid lat or lng value").into_response();
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return (
            StatusCode::BAD_REQUEST,
            "Latitude or longitude out of bounds",
        )
            .into_response();
    }

    let gh = encode(lat, lng, MAX_GH_PRECISION);
    let shard_key = &gh[..SHARDING_PRECISION];

    let Some(address) = state.ring.lookup(shard_key).await else {
        return (StatusCode::SERVICE_UNAVAILABLE, "No workers available").into_response();
    };

    gateway_metrics()
        .geohash_requests_total
        .with_label_values(&[&address, "routed"])
        .inc();

    match state.send_ping(&address, &gh).await {
        Ok(()) => (StatusCode::CREATED, format!("Ping sent, geohash: {}", gh)).into_response(),
        Err(RpcError::Connect(e)) => {
            tracing::error!("no connection to worker {}: {}", address, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to connect to worker",
            )
                .into_response()
        }
        Err(RpcError::Call(e)) => {
            tracing::error!("ping to worker {} failed: {}", address, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to contact worker",
            )
                .into_response()
        }
    }
}

pub async fn handle_get_ping(
    Extension(state): Extension<Arc<GatewayState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (Some(lat_q), Some(lng_q)) = (params.get("lat"), params.get("lng")) else {
        return (StatusCode::BAD_REQUEST, "Missing query parameters").into_response();
    };

    let Ok(lat) = lat_q.parse::<f64>() else {
        return (StatusCode::BAD_REQUEST, "Invalid latitude").into_response();
    };
    let Ok(lng) = lng_q.parse::<f64>() else {
        return (StatusCode::BAD_REQUEST, "Invalid longitude").into_response();
    };

    if !lat.is_finite() || !lng.is_finite() {
        return (StatusCode::BAD_REQUEST, "Invalid lat or lng value").into_response();
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return (
            StatusCode::BAD_REQUEST,
            "Latitude or longitude out of bounds",
        )
            .into_response();
    }

    let gh = encode(lat, lng, MAX_GH_PRECISION);
    let shard_key = &gh[..SHARDING_PRECISION];

    let Some(address) = state.ring.lookup(shard_key).await else {
        return (StatusCode::SERVICE_UNAVAILABLE, "No workers available").into_response();
    };

    gateway_metrics()
        .geohash_requests_total
        .with_label_values(&[&address, "routed"])
        .inc();

    match state.get_pings(&address, &gh).await {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(RpcError::Connect(e)) => {
            tracing::error!("no connection to worker {}: {}", address, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to connect to worker",
            )
                .into_response()
        }
        Err(RpcError::Call(e)) => {
            tracing::error!("point count from worker {} failed: {}", address, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get pings from worker",
            )
                .into_response()
        }
    }
}

pub async fn handle_get_ping_area(
    Extension(state): Extension<Arc<GatewayState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (Some(min_lat_q), Some(max_lat_q), Some(min_lng_q), Some(max_lng_q), Some(precision_q)) = (
        params.get("minLat"),
        params.get("maxLat"),
        params.get("minLng"),
        params.get("maxLng"),
        params.get("precision"),
    ) else {
        return (StatusCode::BAD_REQUEST, "Missing query parameters").into_response();
    };

    let Ok(min_lat) = min_lat_q.parse::<f64>() else {
        return (StatusCode::BAD_REQUEST, "Invalid minimum latitude").into_response();
    };
    let Ok(max_lat) = max_lat_q.parse::<f64>() else {
        return (StatusCode::BAD_REQUEST, "Invalid maximum latitude").into_response();
    };
    let Ok(min_lng) = min_lng_q.parse::<f64>() else {
        return (StatusCode::BAD_REQUEST, "Invalid minimum longitude").into_response();
    };
    let Ok(max_lng) = max_lng_q.parse::<f64>() else {
        return (StatusCode::BAD_REQUEST, "Invalid maximum longitude").into_response();
    };
    let precision = match precision_q.parse::<usize>() {
        Ok(p) if (1..=MAX_GH_PRECISION).contains(&p) => p,
        _ => return (StatusCode::BAD_REQUEST, "Invalid precision").into_response(),
    };

    let finite = min_lat.is_finite() && max_lat.is_finite() && min_lng.is_finite() && max_lng.is_finite();
    if !finite
        || min_lat < -90.0
        || max_lat > 90.0
        || min_lat > max_lat
        || min_lng < -180.0
        || max_lng > 180.0
        || min_lng > max_lng
    {
        return (StatusCode::BAD_REQUEST, "Invalid bounding box").into_response();
    }

    let bbox = Bbox::new(min_lat, max_lat, min_lng, max_lng);
    match planner::ping_area(&state, &bbox, precision).await {
        Ok(combined) => (StatusCode::OK, Json(combined)).into_response(),
        Err(e) => e.into_response(),
    }
}

// --- internal surface ---

/// Forwarded worker heartbeat from the registry.
pub async fn handle_worker_heartbeat(
    Extension(state): Extension<Arc<GatewayState>>,
    Json(hb): Json<WorkerHeartbeat>,
) -> (StatusCode, Json<HeartbeatAck>) {
    state
        .observe_heartbeat(&hb.worker_id, &hb.address, wall_clock_secs())
        .await;
    (StatusCode::OK, Json(HeartbeatAck { acknowledged: true }))
}
