//! Geostream: distributed TTL-bounded geospatial ping store
//!
//! This library crate defines the core modules of the system. It serves as
//! the foundation for the binary executable (`main.rs`), which runs one of
//! three roles per process.
//!
//! ## Architecture Modules
//! The system is composed of loosely coupled subsystems:
//!
//! - **`geo`**: Geohash math. Encoding/decoding, cell dimensions, cover
//!   estimation and the cover-set flood fill used by box queries.
//! - **`ring`**: The gateway's consistent-hash routing ring (256 virtual
//!   nodes per worker) and the pool of reusable RPC handles.
//! - **`worker`**: The storage leaf. Counts pings in a TTL-bounded,
//!   time-bucketed trie and serves point and box count RPCs.
//! - **`gateway`**: The client-facing router and fan-out planner. Routes
//!   writes to shard owners and merges partial box-query answers.
//! - **`registry`**: The discovery rendezvous. Relays worker heartbeats to
//!   every gateway and evicts silent gateways.
//! - **`discovery`**: Heartbeat protocol and the client loops workers and
//!   gateways run against the registry.

pub mod config;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod geo;
pub mod metrics;
pub mod registry;
pub mod ring;
pub mod worker;
