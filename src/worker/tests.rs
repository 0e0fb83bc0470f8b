use super::store::TimeWheel;
use crate::geo::geohash::{decode_bbox, encode};

/// Full-precision geohash of the center of a coarser cell. Shares the
/// cell's prefix by construction.
fn center_geohash(cell: &str) -> String {
    let bbox = decode_bbox(cell).unwrap();
    let (lat, lng) = bbox.center();
    let gh = encode(lat, lng, 8);
    assert!(gh.starts_with(cell));
    gh
}

// ============================================================
// INSERT / POINT COUNT
// ============================================================

#[test]
fn test_insert_then_point_count() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");

    wheel.insert(&gh, 100);

    assert_eq!(wheel.point_count(&gh, 100), 1);
    assert_eq!(wheel.point_count("ezs42", 100), 1);
    assert_eq!(wheel.point_count("e", 100), 1);
    assert_eq!(wheel.point_count("u4pru", 100), 0);
}

#[test]
fn test_counts_aggregate_along_prefixes() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");

    for _ in 0..5 {
        wheel.insert(&gh, 100);
    }

    for p in 1..=8 {
        assert_eq!(wheel.point_count(&gh[..p], 100), 5, "precision {}", p);
    }
}

#[test]
fn test_sibling_counts_sum_at_parent() {
    let wheel = TimeWheel::new();

    wheel.insert("ezs42abc", 100);
    wheel.insert("ezs42abd", 100);
    wheel.insert("ezs47xyz", 100);

    assert_eq!(wheel.point_count("ezs42ab", 100), 2);
    assert_eq!(wheel.point_count("ezs4", 100), 3);
    assert_eq!(wheel.point_count("ezs42abc", 100), 1);
}

#[test]
fn test_counts_span_multiple_buckets() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");

    wheel.insert(&gh, 100);
    wheel.insert(&gh, 101);
    wheel.insert(&gh, 103);

    assert_eq!(wheel.point_count(&gh, 103), 3);
}

// ============================================================
// TTL / WHEEL REUSE
// ============================================================

#[test]
fn test_stale_bucket_excluded_from_reads() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");

    wheel.insert(&gh, 100);

    assert_eq!(wheel.point_count(&gh, 105), 1);
    assert_eq!(wheel.point_count(&gh, 110), 1); // exactly at the cutoff
    assert_eq!(wheel.point_count(&gh, 111), 0); // past the window
}

#[test]
fn test_slot_reuse_replaces_old_bucket() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");

    // 100 and 110 share slot 0; the second insert laps the wheel
    wheel.insert(&gh, 100);
    wheel.insert(&gh, 110);

    assert_eq!(wheel.point_count(&gh, 110), 1);
}

#[test]
fn test_sweep_releases_stale_buckets() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");

    wheel.insert(&gh, 100);
    wheel.sweep(111);

    // gone even for a read that would have accepted the old timestamp
    assert_eq!(wheel.point_count(&gh, 105), 0);
}

#[test]
fn test_sweep_keeps_live_buckets() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");

    wheel.insert(&gh, 100);
    wheel.sweep(105);

    assert_eq!(wheel.point_count(&gh, 105), 1);
}

// ============================================================
// BOX COUNT
// ============================================================

#[test]
fn test_box_count_merge_rule_at_cover_precision() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");
    wheel.insert(&gh, 100);
    wheel.insert(&gh, 100);

    let query = decode_bbox("ezs42").unwrap();
    let cover = vec!["ezs42".to_string()];

    let counts = wheel.box_count(5, 5, &query, &cover, 100);
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get("ezs42"), Some(&2));
}

#[test]
fn test_box_count_merge_rule_coarser_keys() {
    let wheel = TimeWheel::new();
    wheel.insert(&center_geohash("ezs42"), 100);
    wheel.insert(&center_geohash("ezs42"), 100);

    let query = decode_bbox("ezs42").unwrap();
    let cover = vec!["ezs42".to_string()];

    // report at precision 3 from a precision-5 cover
    let counts = wheel.box_count(3, 5, &query, &cover, 100);
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get("ezs"), Some(&2));
}

#[test]
fn test_box_count_dfs_rule_finer_keys() {
    let wheel = TimeWheel::new();
    let gh = center_geohash("ezs42");
    wheel.insert(&gh, 100);

    let query = decode_bbox("ezs42").unwrap();
    let cover = vec!["ezs42".to_string()];

    let counts = wheel.box_count(8, 5, &query, &cover, 100);
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get(&gh), Some(&1));
}

#[test]
fn test_box_count_dfs_and_merge_agree_on_totals() {
    let wheel = TimeWheel::new();
    for _ in 0..3 {
        wheel.insert(&center_geohash("ezs42"), 100);
    }
    wheel.insert("ezs42zzz", 100);

    let query = decode_bbox("ezs42").unwrap();
    let cover = vec!["ezs42".to_string()];

    let merged = wheel.box_count(5, 5, &query, &cover, 100);
    let expanded = wheel.box_count(7, 5, &query, &cover, 100);

    let merged_total: i64 = merged.values().sum();
    let expanded_total: i64 = expanded.values().sum();
    assert_eq!(merged_total, 4);
    assert_eq!(expanded_total, 4);
}

#[test]
fn test_box_count_half_open_edges() {
    let wheel = TimeWheel::new();
    let cell = decode_bbox("ezs42").unwrap();
    let (_, center_lng) = cell.center();
    let (center_lat, _) = cell.center();

    // north and east edge pings land in neighboring cells; south and west
    // edge pings belong to this cell
    wheel.insert(&encode(cell.max_lat, center_lng, 8), 100);
    wheel.insert(&encode(center_lat, cell.max_lng, 8), 100);
    wheel.insert(&encode(cell.min_lat, center_lng, 8), 100);
    wheel.insert(&encode(center_lat, cell.min_lng, 8), 100);

    let cover = vec!["ezs42".to_string()];
    let counts = wheel.box_count(5, 5, &cell, &cover, 100);
    assert_eq!(counts.get("ezs42"), Some(&2));

    let expanded = wheel.box_count(8, 5, &cell, &cover, 100);
    let total: i64 = expanded.values().sum();
    assert_eq!(total, 2);
}

#[test]
fn test_box_count_skips_cover_cells_outside_query() {
    let wheel = TimeWheel::new();
    wheel.insert(&center_geohash("ezs42"), 100);
    wheel.insert(&center_geohash("u4pru"), 100);

    // query is only the first cell, but a sloppy caller sent both
    let query = decode_bbox("ezs42").unwrap();
    let cover = vec!["ezs42".to_string(), "u4pru".to_string()];

    let counts = wheel.box_count(5, 5, &query, &cover, 100);
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get("ezs42"), Some(&1));
}

#[test]
fn test_box_count_disjoint_cells_sum_over_union() {
    let wheel = TimeWheel::new();
    for _ in 0..2 {
        wheel.insert(&center_geohash("ezs42"), 100);
    }
    for _ in 0..3 {
        wheel.insert(&center_geohash("u4pru"), 100);
    }

    let a = decode_bbox("ezs42").unwrap();
    let b = decode_bbox("u4pru").unwrap();
    let union = crate::geo::Bbox::new(
        a.min_lat.min(b.min_lat),
        a.max_lat.max(b.max_lat),
        a.min_lng.min(b.min_lng),
        a.max_lng.max(b.max_lng),
    );

    let cover = vec!["ezs42".to_string(), "u4pru".to_string()];
    let counts = wheel.box_count(5, 5, &union, &cover, 100);
    assert_eq!(counts.get("ezs42"), Some(&2));
    assert_eq!(counts.get("u4pru"), Some(&3));
}

#[test]
fn test_box_count_ignores_expired_buckets() {
    let wheel = TimeWheel::new();
    wheel.insert(&center_geohash("ezs42"), 100);
    wheel.insert(&center_geohash("ezs42"), 108);

    let query = decode_bbox("ezs42").unwrap();
    let cover = vec!["ezs42".to_string()];

    let counts = wheel.box_count(5, 5, &query, &cover, 112);
    assert_eq!(counts.get("ezs42"), Some(&1));
}

// ============================================================
// CONCURRENCY
// ============================================================

#[test]
fn test_parallel_inserts_into_one_bucket() {
    let wheel = std::sync::Arc::new(TimeWheel::new());
    let gh = center_geohash("ezs42");

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let wheel = wheel.clone();
            let gh = gh.clone();
            scope.spawn(move || {
                for _ in 0..100 {
                    wheel.insert(&gh, 200);
                }
            });
        }
    });

    assert_eq!(wheel.point_count(&gh, 200), 400);
}
