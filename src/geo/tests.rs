use super::bbox::{Bbox, haversine_meters};
use super::cover::{choose_aggregated_precision, cover_set, estimate_cover_count};
use super::geohash::{cell_dims_degrees, cell_dims_meters, decode_bbox, encode};

// ============================================================
// ENCODE / DECODE
// ============================================================

#[test]
fn test_encode_known_value() {
    // Canonical example from the geohash literature.
    assert_eq!(encode(42.6, -5.6, 5), "ezs42");
    assert_eq!(encode(57.64911, 10.40744, 8), "u4pruydq");
}

#[test]
fn test_encode_truncates_to_precision() {
    let full = encode(42.6, -5.6, 8);
    assert_eq!(encode(42.6, -5.6, 5), full[..5]);
    assert_eq!(encode(42.6, -5.6, 0), "");
}

#[test]
fn test_decode_contains_encoded_point() {
    for precision in 1..=8 {
        let gh = encode(42.23, -8.73, precision);
        let cell = decode_bbox(&gh).unwrap();
        assert!(cell.min_lat <= 42.23 && 42.23 < cell.max_lat);
        assert!(cell.min_lng <= -8.73 && -8.73 < cell.max_lng);
    }
}

#[test]
fn test_decode_normalizes_uppercase() {
    assert_eq!(decode_bbox("EZS42"), decode_bbox("ezs42"));
}

#[test]
fn test_decode_rejects_bad_input() {
    assert!(decode_bbox("").is_none());
    assert!(decode_bbox("ab12").is_none()); // 'a' is not in the alphabet
    assert!(decode_bbox("ez!42").is_none());
    assert!(decode_bbox("ezil").is_none()); // 'i' and 'l' excluded from base32
}

#[test]
fn test_boundary_point_lands_in_upper_cell() {
    // A point exactly on a bisection boundary belongs to the cell that
    // starts there, which is what makes bbox queries half-open.
    let cell = decode_bbox(&encode(0.0, 0.0, 8)).unwrap();
    assert_eq!(cell.min_lat, 0.0);
    assert_eq!(cell.min_lng, 0.0);
}

// ============================================================
// DIMENSIONS
// ============================================================

#[test]
fn test_cell_dims_degrees() {
    // precision 1: 5 bits, 3 to longitude, 2 to latitude
    let (lon, lat) = cell_dims_degrees(1);
    assert_eq!(lon, 45.0);
    assert_eq!(lat, 45.0);

    // precision 2: 10 bits, 5/5
    let (lon, lat) = cell_dims_degrees(2);
    assert_eq!(lon, 11.25);
    assert_eq!(lat, 5.625);
}

#[test]
fn test_cell_width_shrinks_with_latitude() {
    let (w_equator, h_equator) = cell_dims_meters(5, 0.0);
    let (w_north, h_north) = cell_dims_meters(5, 60.0);
    assert!(w_north < w_equator);
    assert_eq!(h_north, h_equator);
}

#[test]
fn test_bbox_dims_one_degree_at_equator() {
    let bbox = Bbox::new(0.0, 1.0, 0.0, 1.0);
    let (w, h) = bbox.dims_meters();
    // one degree of a great circle is ~111.2 km
    assert!((h - 111_195.0).abs() < 100.0);
    assert!((w - 111_195.0).abs() < 100.0);
}

#[test]
fn test_haversine_zero_distance() {
    assert_eq!(haversine_meters(42.0, -8.0, 42.0, -8.0), 0.0);
}

// ============================================================
// INTERSECTION (half-open semantics)
// ============================================================

#[test]
fn test_intersects_strict_overlap() {
    let a = Bbox::new(0.0, 1.0, 0.0, 1.0);
    assert!(a.intersects(&Bbox::new(0.5, 2.0, 0.5, 2.0)));
    assert!(a.intersects(&a));
}

#[test]
fn test_touching_edges_do_not_intersect() {
    let a = Bbox::new(0.0, 1.0, 0.0, 1.0);
    // shares only the lat=1 edge
    assert!(!a.intersects(&Bbox::new(1.0, 2.0, 0.0, 1.0)));
    // shares only the lng=1 edge
    assert!(!a.intersects(&Bbox::new(0.0, 1.0, 1.0, 2.0)));
    // shares only a corner
    assert!(!a.intersects(&Bbox::new(1.0, 2.0, 1.0, 2.0)));
}

// ============================================================
// COVER PLANNING
// ============================================================

#[test]
fn test_cover_set_within_estimate() {
    // Boxes whose edges sit on cell boundaries, and a tall box where the
    // narrow-cell conservatism dominates. For boxes much smaller than a
    // cell the ceil-based estimate can be one cell short per dimension.
    let cases = [
        (Bbox::new(-1.0, 1.0, -1.0, 1.0), 3..=5),
        (Bbox::new(40.0, 60.0, -10.0, 10.0), 3..=4),
    ];
    for (bbox, precisions) in cases {
        for precision in precisions {
            let cover = cover_set(&bbox, precision);
            let estimate = estimate_cover_count(&bbox, precision);
            assert!(
                (cover.len() as i64) <= estimate,
                "cover {} > estimate {} at precision {}",
                cover.len(),
                estimate,
                precision
            );
        }
    }
}

#[test]
fn test_cover_set_cells_overlap_query() {
    let bbox = Bbox::new(42.22, 42.24, -8.74, -8.72);
    let cover = cover_set(&bbox, 6);
    assert!(!cover.is_empty());
    for gh in &cover {
        let cell = decode_bbox(gh).unwrap();
        assert!(cell.intersects(&bbox), "cell {} does not overlap", gh);
    }
}

#[test]
fn test_cover_set_sorted_and_deduplicated() {
    let bbox = Bbox::new(-1.0, 1.0, -1.0, 1.0);
    let cover = cover_set(&bbox, 3);
    let mut sorted = cover.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(cover, sorted);
}

#[test]
fn test_cover_set_contains_center_cell() {
    let bbox = Bbox::new(42.22, 42.24, -8.74, -8.72);
    let cover = cover_set(&bbox, 5);
    let center = encode(42.23, -8.73, 5);
    assert!(cover.contains(&center));
}

#[test]
fn test_choose_aggregated_precision_prefers_coarser() {
    let bbox = Bbox::new(42.22, 42.24, -8.74, -8.72);
    // requested 8, but a precision-6 cell already fits inside this bbox
    assert_eq!(choose_aggregated_precision(8, &bbox), Some(6));
}

#[test]
fn test_choose_aggregated_precision_falls_forward() {
    // bbox larger than a precision-8 cell but smaller than precision-4 cells:
    // requested 4 must fall forward to a finer precision
    let bbox = Bbox::new(42.230, 42.232, -8.732, -8.730);
    let chosen = choose_aggregated_precision(4, &bbox).unwrap();
    assert!(chosen > 4);
}

#[test]
fn test_choose_aggregated_precision_bbox_too_small() {
    let bbox = Bbox::new(42.23, 42.2300001, -8.73, -8.7299999);
    assert_eq!(choose_aggregated_precision(8, &bbox), None);
}
