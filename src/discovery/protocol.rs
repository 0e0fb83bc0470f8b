//! Heartbeat Protocol
//!
//! Endpoint paths and DTOs shared by the registry, gateways and the
//! heartbeat clients.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Worker liveness announcements. Served by the registry, which forwards
/// each one verbatim to every known gateway on the same path.
pub const ENDPOINT_WORKER_HEARTBEAT: &str = "/internal/heartbeat/worker";
/// Gateway self-registration with the registry.
pub const ENDPOINT_GATEWAY_HEARTBEAT: &str = "/internal/heartbeat/gateway";

// --- Data Transfer Objects ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    pub worker_id: String,
    /// Address the worker serves RPCs on.
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayHeartbeat {
    pub gateway_id: String,
    /// Address the gateway receives forwarded heartbeats on.
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatAck {
    pub acknowledged: bool,
}
