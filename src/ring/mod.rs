//! Routing Ring Module
//!
//! The gateway's view of the worker fleet: a consistent-hash ring kept fresh
//! by forwarded heartbeats, plus the pool of reusable RPC handles to worker
//! addresses.
//!
//! ## Core Concepts
//! - **Virtual nodes**: each physical worker is placed on the ring 256 times
//!   (`hash(worker_id + "#" + i)`) to smooth load. All placements for one
//!   worker are added and removed atomically.
//! - **TTL eviction**: a worker silent past `HB_TTL` is dropped from the ring
//!   together with its pooled connection. Keys are not remapped; the short
//!   data TTL absorbs the loss.
//! - **Lock order**: ring lock before pool lock; neither is held across an
//!   RPC call.

pub mod pool;
pub mod ring;

pub use pool::RpcPool;
pub use ring::{AddOutcome, WorkerRing};

#[cfg(test)]
mod tests;
