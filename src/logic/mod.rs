//! Logic Module - Engines
//!
//! Two cooperating subsystems:
//! - Edge pipeline: `dataset` -> `playback` -> `classifier` -> `uplink` ->
//!   `bus` -> `cloud`, driven by `edge_service` on a fixed tick.
//! - `orchestrator`: approval-gated multi-agent workflow with tracing and
//!   bounded-context memory.

pub mod bus;
pub mod classifier;
pub mod cloud;
pub mod dataset;
pub mod edge_service;
pub mod orchestrator;
pub mod playback;
pub mod uplink;
