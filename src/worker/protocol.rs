//! Worker RPC Protocol
//!
//! Endpoint paths and DTOs for the gateway -> worker RPC surface. These
//! structures are serialized as JSON over HTTP.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Stores one ping by its full-precision geohash.
pub const ENDPOINT_SEND_PING: &str = "/internal/ping";
/// Point count lookup; the geohash travels as a path segment.
pub const ENDPOINT_GET_PINGS: &str = "/internal/pings";
/// Aggregated counts over a set of cover cells.
pub const ENDPOINT_PING_AREA: &str = "/internal/pingArea";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct SendPingRequest {
    pub geohash: String,
}

/// Acknowledgment for a stored ping.
#[derive(Debug, Serialize, Deserialize)]
pub struct PingAck {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetPingsResponse {
    pub count: i64,
    /// Worker wall clock at read time, for client-side staleness checks.
    pub timestamp: i64,
}

/// A box-count request. `geohashes` is the subset of the cover the gateway
/// routed to this worker; `agg_precision` is the precision those cells were
/// computed at, `precision` the granularity of the reply keys.
#[derive(Debug, Serialize, Deserialize)]
pub struct PingAreaRequest {
    pub precision: u32,
    pub agg_precision: u32,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub geohashes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeohashCount {
    pub geohash: String,
    pub count: i64,
}

/// Per-prefix counts, sorted by geohash.
#[derive(Debug, Serialize, Deserialize)]
pub struct PingAreaResponse {
    pub counts: Vec<GeohashCount>,
}
