//! Gateway state: the worker ring, the RPC handle pool, and the typed
//! client calls the planner uses.

use std::time::Instant;

use crate::config::RPC_TIMEOUT;
use crate::metrics::{gateway_metrics, observe_gateway_rpc};
use crate::ring::{AddOutcome, RpcPool, WorkerRing};
use crate::worker::protocol::{
    ENDPOINT_GET_PINGS, ENDPOINT_PING_AREA, ENDPOINT_SEND_PING, GetPingsResponse, PingAck,
    PingAreaRequest, PingAreaResponse, SendPingRequest,
};

/// Where an outbound RPC failed. The planner treats a missing connection
/// differently from a worker that answered badly or not at all.
#[derive(Debug)]
pub enum RpcError {
    Connect(anyhow::Error),
    Call(anyhow::Error),
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcError::Connect(e) => write!(f, "connect: {}", e),
            RpcError::Call(e) => write!(f, "call: {}", e),
        }
    }
}

pub struct GatewayState {
    pub ring: WorkerRing,
    pub pool: RpcPool,
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            ring: WorkerRing::new(),
            pool: RpcPool::new(),
        }
    }

    /// Feeds one forwarded heartbeat into the ring and keeps the pool and
    /// the worker gauge in sync with it.
    pub async fn observe_heartbeat(&self, worker_id: &str, address: &str, now: i64) {
        let outcome = self.ring.add_or_refresh(worker_id, address, now).await;
        if let AddOutcome::Readdressed { old_address } = &outcome {
            self.pool.remove(old_address).await;
        }
        if outcome != AddOutcome::Refreshed {
            let count = self.ring.worker_count().await;
            gateway_metrics().worker_nodes_total.set(count as i64);
        }
    }

    /// Drops stale workers from the ring and closes their pooled handles.
    /// Ring lock first, pool lock after; never both at once.
    pub async fn evict_stale_workers(&self, ttl_secs: i64, now: i64) {
        let evicted = self.ring.evict_stale(ttl_secs, now).await;
        if evicted.is_empty() {
            return;
        }
        for (_, address) in &evicted {
            self.pool.remove(address).await;
        }
        let count = self.ring.worker_count().await;
        gateway_metrics().worker_nodes_total.set(count as i64);
    }

    /// `SendPing` RPC to one worker.
    pub async fn send_ping(&self, address: &str, geohash: &str) -> Result<(), RpcError> {
        let client = self.pool.get(address).await.map_err(RpcError::Connect)?;
        let url = format!("http://{}{}", address, ENDPOINT_SEND_PING);
        let body = SendPingRequest {
            geohash: geohash.to_string(),
        };

        let start = Instant::now();
        let result = async {
            let resp = client
                .post(&url)
                .json(&body)
                .timeout(RPC_TIMEOUT)
                .send()
                .await?;
            let ack: PingAck = resp.error_for_status()?.json().await?;
            anyhow::ensure!(ack.success, "worker rejected ping");
            Ok(())
        }
        .await;

        observe_gateway_rpc(
            "SendPing",
            address,
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        result.map_err(RpcError::Call)
    }

    /// `GetPings` RPC: point count for one full-precision geohash.
    pub async fn get_pings(
        &self,
        address: &str,
        geohash: &str,
    ) -> Result<GetPingsResponse, RpcError> {
        let client = self.pool.get(address).await.map_err(RpcError::Connect)?;
        let url = format!("http://{}{}/{}", address, ENDPOINT_GET_PINGS, geohash);

        let start = Instant::now();
        let result = async {
            let resp = client.get(&url).timeout(RPC_TIMEOUT).send().await?;
            let counts: GetPingsResponse = resp.error_for_status()?.json().await?;
            anyhow::Ok(counts)
        }
        .await;

        observe_gateway_rpc(
            "GetPings",
            address,
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        result.map_err(RpcError::Call)
    }

    /// `GetPingArea` RPC: aggregated counts for one worker's share of the
    /// cover.
    pub async fn get_ping_area(
        &self,
        address: &str,
        request: &PingAreaRequest,
    ) -> Result<PingAreaResponse, RpcError> {
        let client = self.pool.get(address).await.map_err(RpcError::Connect)?;
        let url = format!("http://{}{}", address, ENDPOINT_PING_AREA);

        let start = Instant::now();
        let result = async {
            let resp = client
                .post(&url)
                .json(request)
                .timeout(RPC_TIMEOUT)
                .send()
                .await?;
            let counts: PingAreaResponse = resp.error_for_status()?.json().await?;
            anyhow::Ok(counts)
        }
        .await;

        observe_gateway_rpc(
            "GetPingArea",
            address,
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        result.map_err(RpcError::Call)
    }
}
