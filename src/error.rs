//! Error taxonomy shared across the gateway, worker and registry.
//!
//! Uses `thiserror` for library-style error definitions. A missing geohash
//! prefix is not an error anywhere in the system; it reads as count 0.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur while serving client traffic.
#[derive(Error, Debug)]
pub enum GeostreamError {
    /// Client input failed validation (malformed body, out-of-range
    /// coordinates, NaN/Inf, bad bbox or precision).
    #[error("{0}")]
    Validation(String),

    /// No workers on the ring, or the cluster cannot serve the request.
    #[error("{0}")]
    Unavailable(String),

    /// An RPC to a worker failed on a path that cannot return partial data.
    #[error("{0}")]
    Downstream(String),

    /// The estimated cover for a box query exceeds the configured bound.
    #[error("{0}")]
    Overflow(String),
}

impl GeostreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            GeostreamError::Validation(_) => StatusCode::BAD_REQUEST,
            GeostreamError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GeostreamError::Downstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GeostreamError::Overflow(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for GeostreamError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
