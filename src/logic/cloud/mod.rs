//! Cloud Side - Ingestion & UI-facing State
//!
//! The cloud in this simulation is just a well-known bus subscriber; there
//! is no network transport. It reshapes edge events into the deltas a
//! dashboard would consume.

pub mod gateway;

pub use gateway::{CloudGateway, CloudSnapshot, LinkStatus};
