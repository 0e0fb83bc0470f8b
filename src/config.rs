//! Cluster-wide tunables and environment configuration.
//!
//! The constants here are part of the wire contract: every gateway and worker
//! must agree on `SHARDING_PRECISION` and `V` or routing diverges across the
//! fleet. Change them only together with a full redeploy.

use std::time::Duration;

/// Lifetime of a stored ping, in seconds. Also the number of slots in the
/// worker time wheel.
pub const PING_TTL_SECS: i64 = 10;

/// Heartbeat liveness window. A worker or gateway silent for longer is
/// evicted. Independent from `PING_TTL_SECS` even though both default to 10.
pub const HB_TTL: Duration = Duration::from_secs(10);

/// Virtual nodes per physical worker on the consistent-hash ring.
/// Compile-time constant so the vnode hash set for a worker id is identical
/// on every gateway.
pub const VIRTUAL_NODES: usize = 256;

/// Maximum geohash precision stored and queried.
pub const MAX_GH_PRECISION: usize = 8;

/// Geohash prefix length used as the routing key on the ring.
pub const SHARDING_PRECISION: usize = 7;

/// Upper bound on the estimated cover size of a `/pingArea` query.
pub const MAX_PINGAREA_GEOHASHES: i64 = 5000;

/// Interval between heartbeats sent by workers and gateways.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);

/// Timeout for an outbound heartbeat RPC.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for ping / box-query RPCs from gateway to worker.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(1);

/// Tick of the registry's dead-gateway sweep.
pub const GATEWAY_CLEANUP_TICK: Duration = Duration::from_secs(5);

/// Reads an env var and falls back to `default` when unset or empty.
pub fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Self-reported address for heartbeats: explicit env override if set
/// (pod IP under Kubernetes), otherwise the hostname (Docker Compose DNS).
pub fn advertised_address(override_var: &str, port: &str) -> String {
    let host = match std::env::var(override_var) {
        Ok(v) if !v.is_empty() => v,
        _ => hostname(),
    };
    format!("{}:{}", host, port)
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

/// `DEBUG=true` raises log verbosity and enables request logging.
pub fn debug_enabled() -> bool {
    std::env::var("DEBUG").map(|v| v == "true").unwrap_or(false)
}

pub fn wall_clock_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
