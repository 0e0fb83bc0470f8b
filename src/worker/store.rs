//! TTL-bounded trie-over-time-wheel storage engine.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::config::PING_TTL_SECS;
use crate::geo::Bbox;
use crate::geo::geohash::decode_bbox;

/// One node of the counting trie. `count` is the number of pings in this
/// bucket whose geohash starts with the node's path.
#[derive(Default)]
struct TrieNode {
    children: HashMap<u8, TrieNode>,
    count: i64,
}

impl TrieNode {
    /// Increments the count along the whole path for `geohash`, creating
    /// children on demand. The root ends up holding the bucket total.
    fn increment(&mut self, geohash: &str) {
        self.count += 1;

        let mut current = self;
        for &byte in geohash.as_bytes() {
            current = current.children.entry(byte).or_default();
            current.count += 1;
        }
    }

    /// Count at the node reached by following `geohash`; 0 when the path
    /// does not exist.
    fn count_at(&self, geohash: &str) -> i64 {
        self.descend(geohash).map_or(0, |node| node.count)
    }

    fn descend(&self, path: &str) -> Option<&TrieNode> {
        let mut current = self;
        for &byte in path.as_bytes() {
            current = current.children.get(&byte)?;
        }
        Some(current)
    }
}

/// All pings observed during one wall-clock second.
struct TimeBucket {
    timestamp: i64,
    root: TrieNode,
}

/// The worker's store: `TTL` one-second slots, each under its own
/// reader-writer lock so inserts into different seconds and concurrent
/// reads do not contend.
pub struct TimeWheel {
    slots: Vec<RwLock<Option<TimeBucket>>>,
}

impl TimeWheel {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(PING_TTL_SECS as usize);
        for _ in 0..PING_TTL_SECS {
            slots.push(RwLock::new(None));
        }
        Self { slots }
    }

    /// Records one ping at wall-second `now`. A slot left over from an
    /// earlier lap of the wheel is replaced by a fresh bucket.
    pub fn insert(&self, geohash: &str, now: i64) {
        let idx = (now.rem_euclid(PING_TTL_SECS)) as usize;
        let mut slot = self.slots[idx].write().expect("slot lock poisoned");

        let lapped = !matches!(slot.as_ref(), Some(bucket) if bucket.timestamp == now);
        if lapped {
            *slot = Some(TimeBucket {
                timestamp: now,
                root: TrieNode::default(),
            });
        }
        if let Some(bucket) = slot.as_mut() {
            bucket.root.increment(geohash);
        }
    }

    /// Sum over all live buckets of the count at `geohash`. A bucket is live
    /// while `timestamp >= now - TTL`; stale buckets are skipped even if the
    /// janitor has not cleared them yet.
    pub fn point_count(&self, geohash: &str, now: i64) -> i64 {
        let cutoff = now - PING_TTL_SECS;
        let mut total = 0;

        for slot in &self.slots {
            let slot = slot.read().expect("slot lock poisoned");
            if let Some(bucket) = slot.as_ref()
                && bucket.timestamp >= cutoff
            {
                total += bucket.root.count_at(geohash);
            }
        }
        total
    }

    /// Aggregated counts over the cover cells routed to this worker.
    ///
    /// `precision` is the reporting granularity, `agg_precision` the cover
    /// granularity. Coarser-or-equal reporting re-keys each cover cell's
    /// count under its truncated prefix; finer reporting DFS-expands each
    /// cover cell down to `precision`, pruning subtrees whose cell does not
    /// strictly overlap the query box.
    pub fn box_count(
        &self,
        precision: usize,
        agg_precision: usize,
        query: &Bbox,
        geohashes: &[String],
        now: i64,
    ) -> BTreeMap<String, i64> {
        let cutoff = now - PING_TTL_SECS;
        let mut out = BTreeMap::new();

        for slot in &self.slots {
            let slot = slot.read().expect("slot lock poisoned");
            let Some(bucket) = slot.as_ref() else {
                continue;
            };
            if bucket.timestamp < cutoff {
                continue;
            }

            for gh in geohashes {
                let cell_path = if gh.len() > agg_precision {
                    &gh[..agg_precision]
                } else {
                    gh.as_str()
                };
                let Some(cell) = decode_bbox(cell_path) else {
                    continue;
                };
                if !cell.intersects(query) {
                    continue;
                }

                if precision <= agg_precision {
                    // Re-keying under the coarser prefix must go through the
                    // cover cells: summing the coarse node directly would
                    // double-count across cover cells sharing the prefix and
                    // drag in pings outside the box.
                    let count = bucket.root.count_at(cell_path);
                    if count > 0 {
                        let key = &cell_path[..precision.min(cell_path.len())];
                        *out.entry(key.to_string()).or_insert(0) += count;
                    }
                } else if let Some(node) = bucket.root.descend(cell_path) {
                    dfs_count(node, cell_path, precision, query, &mut out);
                }
            }
        }

        out
    }

    /// Releases buckets older than the TTL window. Reads stay correct
    /// without it through the timestamp cutoff.
    pub fn sweep(&self, now: i64) {
        let cutoff = now - PING_TTL_SECS;
        for (idx, slot) in self.slots.iter().enumerate() {
            let mut slot = slot.write().expect("slot lock poisoned");
            let stale = matches!(slot.as_ref(), Some(bucket) if bucket.timestamp < cutoff);
            if stale {
                *slot = None;
                tracing::debug!("removed stale bucket at slot {}", idx);
            }
        }
    }
}

/// Expands a subtree from `prefix` down to `precision`, adding leaf-depth
/// counts keyed by their full prefix. Children whose cell does not strictly
/// overlap the query are pruned, which keeps the box half-open on its north
/// and east edges.
fn dfs_count(
    node: &TrieNode,
    prefix: &str,
    precision: usize,
    query: &Bbox,
    out: &mut BTreeMap<String, i64>,
) {
    if prefix.len() == precision {
        if node.count > 0 {
            *out.entry(prefix.to_string()).or_insert(0) += node.count;
        }
        return;
    }

    for (&byte, child) in &node.children {
        let mut child_prefix = String::with_capacity(prefix.len() + 1);
        child_prefix.push_str(prefix);
        child_prefix.push(byte as char);

        let Some(cell) = decode_bbox(&child_prefix) else {
            continue;
        };
        if cell.intersects(query) {
            dfs_count(child, &child_prefix, precision, query, out);
        }
    }
}
