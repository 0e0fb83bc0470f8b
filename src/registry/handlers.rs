//! Registry HTTP handlers.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode};

use super::service::RegistryState;
use crate::discovery::protocol::{GatewayHeartbeat, HeartbeatAck, WorkerHeartbeat};

/// Worker liveness announcement: relayed to every known gateway. Forwarding
/// failures never fail the worker's own heartbeat.
pub async fn handle_worker_heartbeat(
    Extension(state): Extension<Arc<RegistryState>>,
    Json(hb): Json<WorkerHeartbeat>,
) -> (StatusCode, Json<HeartbeatAck>) {
    state.forward_worker_heartbeat(&hb).await;
    (StatusCode::OK, Json(HeartbeatAck { acknowledged: true }))
}

/// Gateway self-registration.
pub async fn handle_gateway_heartbeat(
    Extension(state): Extension<Arc<RegistryState>>,
    Json(hb): Json<GatewayHeartbeat>,
) -> (StatusCode, Json<HeartbeatAck>) {
    state.register_gateway(&hb.gateway_id, &hb.address);
    (StatusCode::OK, Json(HeartbeatAck { acknowledged: true }))
}
