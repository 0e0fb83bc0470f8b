use super::pool::RpcPool;
use super::ring::{AddOutcome, WorkerRing};
use crate::config::VIRTUAL_NODES;

// ============================================================
// RING MEMBERSHIP
// ============================================================

#[tokio::test]
async fn test_add_is_idempotent() {
    let ring = WorkerRing::new();

    let first = ring.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;
    assert_eq!(first, AddOutcome::Added);

    let second = ring.add_or_refresh("worker-1", "10.0.0.1:50051", 105).await;
    assert_eq!(second, AddOutcome::Refreshed);

    assert_eq!(ring.worker_count().await, 1);
    assert_eq!(ring.distinct_addresses().await, vec!["10.0.0.1:50051"]);
}

#[tokio::test]
async fn test_lookup_empty_ring_is_none() {
    let ring = WorkerRing::new();
    assert_eq!(ring.lookup("ezs42ghj").await, None);
}

#[tokio::test]
async fn test_lookup_single_worker_owns_everything() {
    let ring = WorkerRing::new();
    ring.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;

    for key in ["ezs42gh", "u4pruyd", "0000000", "zzzzzzz"] {
        assert_eq!(ring.lookup(key).await.as_deref(), Some("10.0.0.1:50051"));
    }
}

#[tokio::test]
async fn test_lookup_is_deterministic_across_rings() {
    let a = WorkerRing::new();
    let b = WorkerRing::new();

    // same workers, different arrival order
    a.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;
    a.add_or_refresh("worker-2", "10.0.0.2:50051", 100).await;
    a.add_or_refresh("worker-3", "10.0.0.3:50051", 100).await;
    b.add_or_refresh("worker-3", "10.0.0.3:50051", 100).await;
    b.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;
    b.add_or_refresh("worker-2", "10.0.0.2:50051", 100).await;

    for i in 0..200 {
        let key = format!("geohash{}", i);
        assert_eq!(a.lookup(&key).await, b.lookup(&key).await);
    }
}

#[tokio::test]
async fn test_virtual_nodes_spread_load() {
    let ring = WorkerRing::new();
    ring.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;
    ring.add_or_refresh("worker-2", "10.0.0.2:50051", 100).await;
    ring.add_or_refresh("worker-3", "10.0.0.3:50051", 100).await;

    let mut counts = std::collections::HashMap::new();
    for i in 0..3000 {
        let addr = ring.lookup(&format!("key{}", i)).await.unwrap();
        *counts.entry(addr).or_insert(0) += 1;
    }

    // with 256 vnodes each, every worker should own a visible share
    assert_eq!(counts.len(), 3);
    for (addr, count) in counts {
        assert!(count > 300, "{} owns only {} of 3000 keys", addr, count);
    }
}

#[tokio::test]
async fn test_eviction_removes_all_virtual_nodes() {
    let ring = WorkerRing::new();
    ring.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;
    ring.add_or_refresh("worker-2", "10.0.0.2:50051", 109).await;

    let evicted = ring.evict_stale(10, 120).await;
    assert_eq!(
        evicted,
        vec![("worker-1".to_string(), "10.0.0.1:50051".to_string())]
    );

    // no key may route to the evicted worker anymore
    assert_eq!(ring.worker_count().await, 1);
    for i in 0..500 {
        let addr = ring.lookup(&format!("key{}", i)).await.unwrap();
        assert_eq!(addr, "10.0.0.2:50051");
    }
}

#[tokio::test]
async fn test_heartbeat_within_ttl_keeps_worker() {
    let ring = WorkerRing::new();
    ring.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;

    assert!(ring.evict_stale(10, 110).await.is_empty());
    assert_eq!(ring.worker_count().await, 1);
}

#[tokio::test]
async fn test_address_change_evicts_and_readds() {
    let ring = WorkerRing::new();
    ring.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;

    let outcome = ring.add_or_refresh("worker-1", "10.0.0.9:50051", 101).await;
    assert_eq!(
        outcome,
        AddOutcome::Readdressed {
            old_address: "10.0.0.1:50051".to_string()
        }
    );

    assert_eq!(ring.worker_count().await, 1);
    assert_eq!(ring.distinct_addresses().await, vec!["10.0.0.9:50051"]);
    assert_eq!(
        ring.lookup("anything").await.as_deref(),
        Some("10.0.0.9:50051")
    );
}

#[tokio::test]
async fn test_distinct_addresses_dedup_virtual_nodes() {
    let ring = WorkerRing::new();
    ring.add_or_refresh("worker-1", "10.0.0.1:50051", 100).await;
    ring.add_or_refresh("worker-2", "10.0.0.2:50051", 100).await;

    let addrs = ring.distinct_addresses().await;
    assert_eq!(addrs.len(), 2);
    assert!(addrs.contains(&"10.0.0.1:50051".to_string()));
    assert!(addrs.contains(&"10.0.0.2:50051".to_string()));
}

#[test]
fn test_vnode_count_constant() {
    // the vnode count is part of the routing contract across gateways
    assert_eq!(VIRTUAL_NODES, 256);
}

// ============================================================
// CONNECTION POOL
// ============================================================

#[tokio::test]
async fn test_pool_reuses_handles() {
    let pool = RpcPool::new();
    pool.get("10.0.0.1:50051").await.unwrap();
    pool.get("10.0.0.1:50051").await.unwrap();
    assert_eq!(pool.len().await, 1);
}

#[tokio::test]
async fn test_pool_remove_then_recreate() {
    let pool = RpcPool::new();
    pool.get("10.0.0.1:50051").await.unwrap();
    pool.remove("10.0.0.1:50051").await;
    assert_eq!(pool.len().await, 0);

    pool.get("10.0.0.1:50051").await.unwrap();
    assert_eq!(pool.len().await, 1);
}
