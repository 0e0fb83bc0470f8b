//! Box-query planner: cover computation, fan-out strategy, and the merge
//! of partial worker answers.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::state::{GatewayState, RpcError};
use crate::config::{MAX_PINGAREA_GEOHASHES, SHARDING_PRECISION};
use crate::error::GeostreamError;
use crate::geo::Bbox;
use crate::geo::cover::{choose_aggregated_precision, cover_set, estimate_cover_count};
use crate::metrics::gateway_metrics;
use crate::worker::protocol::PingAreaRequest;

/// One merged cell of a box-query answer. `server` attributes the first
/// worker that reported the cell; diagnostic only.
#[derive(Debug, Serialize, PartialEq)]
pub struct AreaEntry {
    #[serde(rename = "Count")]
    pub count: i64,
    #[serde(rename = "Server")]
    pub server: String,
}

/// Fan-out decision for a validated box query.
#[derive(Debug, PartialEq, Eq)]
pub enum FanOut {
    /// Cover cells grouped by the worker owning their sharding prefix.
    Routed(Vec<(String, Vec<String>)>),
    /// The whole cover goes to every distinct worker.
    Broadcast(Vec<String>),
}

/// Chooses between targeted fan-out and broadcast. Cells are groupable only
/// when the cover is at least as fine as the sharding key, because only then
/// does a cell determine its owner. Cover cells with no responsible worker
/// are skipped.
pub async fn plan_fan_out(
    state: &GatewayState,
    cover: &[String],
    prec_used: usize,
) -> FanOut {
    if prec_used >= SHARDING_PRECISION {
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for gh in cover {
            let shard_key = &gh[..SHARDING_PRECISION.min(gh.len())];
            let Some(address) = state.ring.lookup(shard_key).await else {
                continue;
            };
            gateway_metrics()
                .geohash_requests_total
                .with_label_values(&[&address, "routed"])
                .inc();
            grouped.entry(address).or_default().push(gh.clone());
        }
        let mut groups: Vec<(String, Vec<String>)> = grouped.into_iter().collect();
        groups.sort();
        FanOut::Routed(groups)
    } else {
        let addresses = state.ring.distinct_addresses().await;
        for address in &addresses {
            gateway_metrics()
                .geohash_requests_total
                .with_label_values(&[address, "broadcast"])
                .inc();
        }
        FanOut::Broadcast(addresses)
    }
}

/// Answers a validated box query end to end: bound the cover, choose the
/// aggregation precision, fan out, and merge the partial counts.
pub async fn ping_area(
    state: &GatewayState,
    bbox: &Bbox,
    precision: usize,
) -> Result<BTreeMap<String, AreaEntry>, GeostreamError> {
    if state.ring.worker_count().await == 0 {
        return Err(GeostreamError::Unavailable(
            "No workers available".to_string(),
        ));
    }

    let estimated = estimate_cover_count(bbox, precision);
    if estimated > MAX_PINGAREA_GEOHASHES {
        return Err(GeostreamError::Overflow(
            "Requested area too large for precision".to_string(),
        ));
    }

    let Some(prec_used) = choose_aggregated_precision(precision, bbox) else {
        return Err(GeostreamError::Validation(
            "Bounding box too small for available precisions".to_string(),
        ));
    };

    let cover = cover_set(bbox, prec_used);

    let request_for = |geohashes: Vec<String>| PingAreaRequest {
        precision: precision as u32,
        agg_precision: prec_used as u32,
        min_lat: bbox.min_lat,
        max_lat: bbox.max_lat,
        min_lng: bbox.min_lng,
        max_lng: bbox.max_lng,
        geohashes,
    };

    let mut results = Vec::new();
    match plan_fan_out(state, &cover, prec_used).await {
        FanOut::Routed(groups) => {
            for (address, geohashes) in groups {
                let request = request_for(geohashes);
                match state.get_ping_area(&address, &request).await {
                    Ok(partial) => results.push((address, partial)),
                    Err(RpcError::Connect(e)) => {
                        tracing::error!("no connection to worker {}: {}", address, e);
                        return Err(GeostreamError::Downstream(
                            "Failed to connect to worker".to_string(),
                        ));
                    }
                    // skip the failed worker and keep the partial answer
                    Err(RpcError::Call(e)) => {
                        tracing::warn!("box query to {} failed: {}", address, e);
                    }
                }
            }
        }
        FanOut::Broadcast(addresses) => {
            for address in addresses {
                let request = request_for(cover.clone());
                match state.get_ping_area(&address, &request).await {
                    Ok(partial) => results.push((address, partial)),
                    Err(e) => {
                        tracing::warn!("broadcast box query to {} failed: {}", address, e);
                    }
                }
            }
        }
    }

    Ok(merge_partial_counts(results))
}

/// Sums per-prefix counts across workers. The recorded server is the first
/// one that reported each prefix.
pub fn merge_partial_counts(
    results: Vec<(String, crate::worker::protocol::PingAreaResponse)>,
) -> BTreeMap<String, AreaEntry> {
    let mut combined: BTreeMap<String, AreaEntry> = BTreeMap::new();
    for (server, partial) in results {
        for item in partial.counts {
            combined
                .entry(item.geohash)
                .or_insert_with(|| AreaEntry {
                    count: 0,
                    server: server.clone(),
                })
                .count += item.count;
        }
    }
    combined
}
