//! Geohash Math Module
//!
//! Pure geometry used by both the gateway planner and the worker query
//! engine: geohash encode/decode, cell and bounding-box dimensions, cover
//! estimation and the cover-set flood fill.
//!
//! ## Core Concepts
//! - **Geohash**: base-32 string where each character adds 5 interleaved
//!   bits, longitude first. Longer string = smaller cell.
//! - **Half-open cells**: a point on a cell boundary belongs to the
//!   northern/eastern neighbor, and intersection tests treat upper bounds
//!   as exclusive. A ping on the north or east edge of a query box is not
//!   counted; one on the south or west edge is.

pub mod bbox;
pub mod cover;
pub mod geohash;

pub use bbox::Bbox;

#[cfg(test)]
mod tests;
