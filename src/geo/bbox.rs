//! Bounding boxes and great-circle dimensions.

pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A latitude/longitude rectangle. `min` edges are inclusive, `max` edges
/// exclusive wherever the box is used for point membership or overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bbox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Strict overlap: boxes that touch only along an edge do not intersect.
    /// This is what makes query semantics half-open on the north and east.
    pub fn intersects(&self, other: &Bbox) -> bool {
        self.min_lat < other.max_lat
            && self.max_lat > other.min_lat
            && self.min_lng < other.max_lng
            && self.max_lng > other.min_lng
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Width and height in meters. Width is measured at the latitude closest
    /// to the equator, where a degree of longitude is widest; height at the
    /// midpoint longitude since north-south distance does not depend on it.
    pub fn dims_meters(&self) -> (f64, f64) {
        let lat_for_width = lat_for_max_width(self.min_lat, self.max_lat);
        let width = haversine_meters(lat_for_width, self.min_lng, lat_for_width, self.max_lng);
        let mid_lng = (self.min_lng + self.max_lng) / 2.0;
        let height = haversine_meters(self.min_lat, mid_lng, self.max_lat, mid_lng);
        (width, height)
    }
}

pub fn deg2rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Great-circle distance between two points.
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1r = deg2rad(lat1);
    let lat2r = deg2rad(lat2);
    let dlat = deg2rad(lat2 - lat1);
    let dlng = deg2rad(lng2 - lng1);

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();
    let a = sin_dlat * sin_dlat + lat1r.cos() * lat2r.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Latitude within `[min_lat, max_lat]` where meters-per-degree-longitude is
/// largest (closest to the equator).
pub fn lat_for_max_width(min_lat: f64, max_lat: f64) -> f64 {
    if min_lat <= 0.0 && max_lat >= 0.0 {
        return 0.0;
    }
    if min_lat.abs() < max_lat.abs() {
        min_lat
    } else {
        max_lat
    }
}

/// Latitude within `[min_lat, max_lat]` where meters-per-degree-longitude is
/// smallest (farthest from the equator). Using it makes cover estimates
/// conservative: the smallest cell width yields the largest cell count.
pub fn lat_for_min_width(min_lat: f64, max_lat: f64) -> f64 {
    if min_lat.abs() > max_lat.abs() {
        min_lat
    } else {
        max_lat
    }
}
