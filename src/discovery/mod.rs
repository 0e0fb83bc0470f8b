//! Service Discovery Module
//!
//! Heartbeat plumbing that keeps every gateway's ring eventually consistent:
//! workers and gateways announce themselves to the registry on a fixed tick,
//! and the registry fans worker announcements out to all known gateways.
//!
//! Identities are UUIDs fixed at process start; addresses are the env
//! override when set, otherwise the hostname. A missed heartbeat is never an
//! error for the sender: it is logged and retried on the next tick.

pub mod client;
pub mod protocol;
