//! Consistent-hash ring over the live worker set.

use std::collections::HashMap;

use tokio::sync::RwLock;
use xxhash_rust::xxh3::xxh3_64;

use crate::config::VIRTUAL_NODES;

/// One virtual placement of a worker on the ring.
#[derive(Debug, Clone)]
struct RingNode {
    hash: u64,
    address: String,
}

#[derive(Default)]
struct RingState {
    /// Virtual nodes sorted ascending by hash.
    ring: Vec<RingNode>,
    /// worker id -> unix seconds of the last heartbeat.
    last_seen: HashMap<String, i64>,
    /// worker id -> currently advertised address.
    addresses: HashMap<String, String>,
}

/// Result of feeding one heartbeat into the ring.
#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// Known worker, same address: only `last_seen` moved.
    Refreshed,
    /// First heartbeat of this worker id.
    Added,
    /// Known worker came back under a new address; the old one was evicted
    /// and the caller must drop its pooled connection.
    Readdressed { old_address: String },
}

/// The ring is mutated rarely (join, eviction) and read on every request,
/// so it lives under a single reader-writer lock.
pub struct WorkerRing {
    state: RwLock<RingState>,
}

/// Ring placement for a key. Hashes the raw key string so routing does not
/// shift when geohash truncation rules change.
pub fn ring_hash(key: &str) -> u64 {
    xxh3_64(key.as_bytes())
}

fn vnode_hash(worker_id: &str, index: usize) -> u64 {
    ring_hash(&format!("{}#{}", worker_id, index))
}

impl WorkerRing {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RingState::default()),
        }
    }

    /// Registers or refreshes a worker. Idempotent: a repeated heartbeat for
    /// a known (id, address) pair only bumps `last_seen`. All virtual nodes
    /// are inserted under one write lock so a concurrent lookup never sees a
    /// partially added worker.
    pub async fn add_or_refresh(&self, worker_id: &str, address: &str, now: i64) -> AddOutcome {
        let mut state = self.state.write().await;

        let existing = state.addresses.get(worker_id).cloned();
        let outcome = match existing {
            Some(known) if known == address => {
                state.last_seen.insert(worker_id.to_string(), now);
                return AddOutcome::Refreshed;
            }
            Some(known) => {
                remove_worker_nodes(&mut state, worker_id);
                AddOutcome::Readdressed { old_address: known }
            }
            None => AddOutcome::Added,
        };

        for i in 0..VIRTUAL_NODES {
            state.ring.push(RingNode {
                hash: vnode_hash(worker_id, i),
                address: address.to_string(),
            });
        }
        state.ring.sort_by_key(|n| n.hash);
        state.last_seen.insert(worker_id.to_string(), now);
        state
            .addresses
            .insert(worker_id.to_string(), address.to_string());

        tracing::info!("Added worker {} at {} to the ring", worker_id, address);
        outcome
    }

    /// Removes every worker whose last heartbeat is older than `ttl_secs`.
    /// Returns the evicted (worker id, address) pairs so the caller can drop
    /// their pooled connections after releasing the ring lock.
    pub async fn evict_stale(&self, ttl_secs: i64, now: i64) -> Vec<(String, String)> {
        let mut state = self.state.write().await;

        let stale: Vec<String> = state
            .last_seen
            .iter()
            .filter(|&(_, &seen)| now - seen > ttl_secs)
            .map(|(id, _)| id.clone())
            .collect();

        let mut evicted = Vec::with_capacity(stale.len());
        for worker_id in stale {
            if let Some(address) = remove_worker_nodes(&mut state, &worker_id) {
                tracing::info!("Evicted stale worker {} at {}", worker_id, address);
                evicted.push((worker_id, address));
            }
        }
        evicted
    }

    /// Maps a key to the worker owning it: first virtual node with
    /// `hash >= hash(key)`, wrapping to the start of the ring.
    /// `None` when no workers are known.
    pub async fn lookup(&self, key: &str) -> Option<String> {
        let state = self.state.read().await;
        if state.ring.is_empty() {
            return None;
        }

        let hash = ring_hash(key);
        let idx = state.ring.partition_point(|n| n.hash < hash);
        let idx = if idx == state.ring.len() { 0 } else { idx };
        Some(state.ring[idx].address.clone())
    }

    /// Distinct physical worker addresses, deduplicated across virtual
    /// nodes, in ring order. Used for broadcast reads.
    pub async fn distinct_addresses(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for node in &state.ring {
            if seen.insert(node.address.clone()) {
                out.push(node.address.clone());
            }
        }
        out
    }

    /// Number of known physical workers.
    pub async fn worker_count(&self) -> usize {
        self.state.read().await.addresses.len()
    }
}

/// Drops all virtual nodes, the address and the liveness entry of one
/// worker. Returns its address if it was known.
fn remove_worker_nodes(state: &mut RingState, worker_id: &str) -> Option<String> {
    let address = state.addresses.remove(worker_id)?;
    state.last_seen.remove(worker_id);

    let mut hashes: Vec<u64> = (0..VIRTUAL_NODES)
        .map(|i| vnode_hash(worker_id, i))
        .collect();
    hashes.sort_unstable();
    state
        .ring
        .retain(|node| hashes.binary_search(&node.hash).is_err() || node.address != address);

    Some(address)
}
