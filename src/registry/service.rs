//! Gateway table and heartbeat fan-out.

use dashmap::DashMap;

use crate::config::{GATEWAY_CLEANUP_TICK, HB_TTL, RPC_TIMEOUT, wall_clock_secs};
use crate::discovery::protocol::{ENDPOINT_WORKER_HEARTBEAT, WorkerHeartbeat};
use crate::metrics::registry_metrics;

/// One registered gateway.
#[derive(Debug, Clone)]
pub struct GatewayRecord {
    pub address: String,
    pub last_seen: i64,
}

/// The registry's entire state: who the gateways are and how to reach them.
/// The table and the handle pool are separate maps so closing a stale
/// connection never blocks heartbeat bookkeeping.
pub struct RegistryState {
    gateways: DashMap<String, GatewayRecord>,
    clients: DashMap<String, reqwest::Client>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self {
            gateways: DashMap::new(),
            clients: DashMap::new(),
        }
    }

    /// Gateway self-registration. A new id or a changed address drops the
    /// old outbound handle and opens one to the new address; either way
    /// `last_seen` is refreshed.
    pub fn register_gateway(&self, gateway_id: &str, address: &str) {
        let now = wall_clock_secs();

        let previous = self.gateways.insert(
            gateway_id.to_string(),
            GatewayRecord {
                address: address.to_string(),
                last_seen: now,
            },
        );

        match previous {
            Some(old) if old.address == address => {}
            Some(old) => {
                tracing::info!(
                    "gateway {} moved from {} to {}",
                    gateway_id,
                    old.address,
                    address
                );
                self.clients.remove(&old.address);
                self.ensure_client(address);
            }
            None => {
                tracing::info!("registered gateway {} at {}", gateway_id, address);
                self.ensure_client(address);
                registry_metrics().registered_gateways.inc();
            }
        }
    }

    /// Relays a worker announcement to every known gateway. Delivery is
    /// best-effort per gateway; a failure leaves the worker visible to the
    /// gateways that did receive it.
    pub async fn forward_worker_heartbeat(&self, hb: &WorkerHeartbeat) {
        let targets: Vec<(String, reqwest::Client)> = self
            .gateways
            .iter()
            .filter_map(|entry| {
                let address = entry.value().address.clone();
                let client = self.ensure_client(&address)?;
                Some((address, client))
            })
            .collect();

        for (address, client) in targets {
            let url = format!("http://{}{}", address, ENDPOINT_WORKER_HEARTBEAT);
            let result = client
                .post(&url)
                .json(hb)
                .timeout(RPC_TIMEOUT)
                .send()
                .await;

            if let Err(e) = result {
                tracing::warn!("failed to forward heartbeat to gateway {}: {}", address, e);
            }
        }
    }

    /// Evicts gateways silent past `HB_TTL` and drops their handles.
    pub fn cleanup_dead_gateways(&self, ttl_secs: i64, now: i64) -> usize {
        let dead: Vec<(String, String)> = self
            .gateways
            .iter()
            .filter(|entry| now - entry.value().last_seen > ttl_secs)
            .map(|entry| (entry.key().clone(), entry.value().address.clone()))
            .collect();

        for (gateway_id, address) in &dead {
            self.gateways.remove(gateway_id);
            self.clients.remove(address);
            registry_metrics().registered_gateways.dec();
            tracing::info!("evicted dead gateway {} at {}", gateway_id, address);
        }
        dead.len()
    }

    pub async fn cleanup_loop(&self) {
        let mut interval = tokio::time::interval(GATEWAY_CLEANUP_TICK);
        loop {
            interval.tick().await;
            self.cleanup_dead_gateways(HB_TTL.as_secs() as i64, wall_clock_secs());
        }
    }

    pub fn gateway_count(&self) -> usize {
        self.gateways.len()
    }

    pub fn gateway_address(&self, gateway_id: &str) -> Option<String> {
        self.gateways.get(gateway_id).map(|r| r.address.clone())
    }

    pub fn has_client(&self, address: &str) -> bool {
        self.clients.contains_key(address)
    }

    fn ensure_client(&self, address: &str) -> Option<reqwest::Client> {
        if let Some(client) = self.clients.get(address) {
            return Some(client.clone());
        }

        match reqwest::Client::builder().build() {
            Ok(client) => {
                let client = self
                    .clients
                    .entry(address.to_string())
                    .or_insert(client)
                    .clone();
                Some(client)
            }
            Err(e) => {
                tracing::warn!("failed to create client for gateway {}: {}", address, e);
                None
            }
        }
    }
}
