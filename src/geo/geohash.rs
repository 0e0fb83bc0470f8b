//! Geohash encoding and decoding.
//!
//! Base-32 alphabet `0123456789bcdefghjkmnpqrstuvwxyz`; each character is 5
//! bits interleaved longitude-first. Decoding normalizes ASCII uppercase and
//! rejects anything outside the alphabet.

use super::bbox::{Bbox, EARTH_RADIUS_METERS, deg2rad};

pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

fn char_value(c: u8) -> Option<u8> {
    let c = if c.is_ascii_uppercase() {
        c.to_ascii_lowercase()
    } else {
        c
    };
    BASE32.iter().position(|&b| b == c).map(|i| i as u8)
}

/// Encodes a point to a geohash of exactly `precision` characters.
///
/// A coordinate sitting on a bisection boundary goes to the upper half, so
/// cells partition the plane half-open toward the north and east.
pub fn encode(lat: f64, lng: f64, precision: usize) -> String {
    if precision == 0 {
        return String::new();
    }

    let (mut min_lat, mut max_lat) = (-90.0_f64, 90.0_f64);
    let (mut min_lng, mut max_lng) = (-180.0_f64, 180.0_f64);
    let mut is_lng = true;
    let mut acc: u8 = 0;
    let mut bits = 0;
    let mut out = String::with_capacity(precision);

    while out.len() < precision {
        acc <<= 1;
        if is_lng {
            let mid = (min_lng + max_lng) / 2.0;
            if lng >= mid {
                acc |= 1;
                min_lng = mid;
            } else {
                max_lng = mid;
            }
        } else {
            let mid = (min_lat + max_lat) / 2.0;
            if lat >= mid {
                acc |= 1;
                min_lat = mid;
            } else {
                max_lat = mid;
            }
        }
        is_lng = !is_lng;
        bits += 1;
        if bits == 5 {
            out.push(BASE32[acc as usize] as char);
            acc = 0;
            bits = 0;
        }
    }

    out
}

/// Decodes a geohash to its cell rectangle. Returns `None` for an empty
/// string or any character outside the base-32 alphabet.
pub fn decode_bbox(gh: &str) -> Option<Bbox> {
    if gh.is_empty() {
        return None;
    }

    let (mut min_lat, mut max_lat) = (-90.0_f64, 90.0_f64);
    let (mut min_lng, mut max_lng) = (-180.0_f64, 180.0_f64);
    let mut is_lng = true; // geohash bits start with longitude

    for &c in gh.as_bytes() {
        let v = char_value(c)?;
        for bit in (0..5).rev() {
            let mask = 1u8 << bit;
            if is_lng {
                let mid = (min_lng + max_lng) / 2.0;
                if v & mask != 0 {
                    min_lng = mid;
                } else {
                    max_lng = mid;
                }
            } else {
                let mid = (min_lat + max_lat) / 2.0;
                if v & mask != 0 {
                    min_lat = mid;
                } else {
                    max_lat = mid;
                }
            }
            is_lng = !is_lng;
        }
    }

    Some(Bbox::new(min_lat, max_lat, min_lng, max_lng))
}

/// Width and height of one cell in degrees at a given precision.
/// Bits alternate starting with longitude, so longitude gets the extra bit
/// at odd precisions.
pub fn cell_dims_degrees(precision: usize) -> (f64, f64) {
    let bits = precision * 5;
    let lon_bits = (bits + 1) / 2;
    let lat_bits = bits / 2;

    let lon_deg = 360.0 / (1u64 << lon_bits) as f64;
    let lat_deg = 180.0 / (1u64 << lat_bits) as f64;
    (lon_deg, lat_deg)
}

/// Cell dimensions in meters. Width shrinks with cos(latitude); the caller
/// picks which latitude to measure at.
pub fn cell_dims_meters(precision: usize, lat_for_width: f64) -> (f64, f64) {
    let (lon_deg, lat_deg) = cell_dims_degrees(precision);
    let height = deg2rad(lat_deg) * EARTH_RADIUS_METERS;
    let width = deg2rad(lon_deg) * EARTH_RADIUS_METERS * deg2rad(lat_for_width).cos();
    (width, height)
}
