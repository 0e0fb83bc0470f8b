//! Cover planning: how many cells a box query needs, at which precision,
//! and which cells they are.

use std::collections::{BTreeSet, HashSet, VecDeque};

use super::bbox::{Bbox, lat_for_min_width};
use super::geohash::{cell_dims_degrees, cell_dims_meters, decode_bbox, encode};
use crate::config::MAX_GH_PRECISION;

/// Conservative upper bound on the number of cells covering `bbox` at
/// `precision`. Cell width is measured at the latitude farthest from the
/// equator, where cells are narrowest, so the estimate never undercounts.
pub fn estimate_cover_count(bbox: &Bbox, precision: usize) -> i64 {
    if precision == 0 {
        return 0;
    }
    let (bbox_w, bbox_h) = bbox.dims_meters();
    let lat_width = lat_for_min_width(bbox.min_lat, bbox.max_lat);
    let (cell_w, cell_h) = cell_dims_meters(precision, lat_width);
    if cell_w <= 0.0 || cell_h <= 0.0 {
        return 0;
    }

    let w = ((bbox_w / cell_w).ceil() as i64).max(1);
    let h = ((bbox_h / cell_h).ceil() as i64).max(1);
    w * h
}

/// Picks the precision actually used for the cover: the coarsest `p` in
/// `max(1, requested - 2) ..= requested` whose cell fits inside the bbox in
/// both dimensions. When the bbox is smaller than the requested cell, falls
/// forward through `requested + 1 ..= MAX_GH_PRECISION`. `None` when nothing
/// fits.
pub fn choose_aggregated_precision(requested: usize, bbox: &Bbox) -> Option<usize> {
    let (bbox_w, bbox_h) = bbox.dims_meters();
    let lat_width = super::bbox::lat_for_max_width(bbox.min_lat, bbox.max_lat);

    let start = requested.saturating_sub(2).max(1);
    for p in start..=requested {
        let (w, h) = cell_dims_meters(p, lat_width);
        if w <= bbox_w && h <= bbox_h {
            return Some(p);
        }
    }

    for p in (requested + 1)..=MAX_GH_PRECISION {
        let (w, h) = cell_dims_meters(p, lat_width);
        if w <= bbox_w && h <= bbox_h {
            return Some(p);
        }
    }

    None
}

/// All cells at `precision` whose rectangle strictly overlaps `bbox`,
/// sorted and deduplicated.
///
/// Seeds from the bbox center and flood-fills through the 8 neighbors,
/// shifting the cell center by one cell dimension in degrees per step.
pub fn cover_set(bbox: &Bbox, precision: usize) -> Vec<String> {
    let (seed_lat, seed_lng) = bbox.center();
    let seed = encode(seed_lat, seed_lng, precision);
    if seed.is_empty() {
        return Vec::new();
    }

    let (lon_step, lat_step) = cell_dims_degrees(precision);
    if lon_step <= 0.0 || lat_step <= 0.0 {
        return Vec::new();
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut in_set: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(seed);

    while let Some(gh) = queue.pop_front() {
        if !visited.insert(gh.clone()) {
            continue;
        }

        let Some(cell) = decode_bbox(&gh) else {
            continue;
        };
        if !cell.intersects(bbox) {
            continue;
        }

        in_set.insert(gh);

        let (c_lat, c_lng) = cell.center();
        for d_lat in [-1.0, 0.0, 1.0] {
            for d_lng in [-1.0, 0.0, 1.0] {
                if d_lat == 0.0 && d_lng == 0.0 {
                    continue;
                }
                let n_lat = c_lat + d_lat * lat_step;
                let n_lng = c_lng + d_lng * lon_step;
                if !(-90.0..=90.0).contains(&n_lat) || !(-180.0..=180.0).contains(&n_lng) {
                    continue;
                }
                let ngh = encode(n_lat, n_lng, precision);
                if !visited.contains(&ngh) {
                    queue.push_back(ngh);
                }
            }
        }
    }

    in_set.into_iter().collect()
}
