//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change tick cadence or thresholds, only edit this file.

/// Simulated machine identity reported in every uplink payload
pub const DEFAULT_MACHINE_ID: &str = "CNC-MILL-01";

/// Edge tick interval (milliseconds)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

/// Anomaly score above this always produces a full Alert
pub const ALERT_SCORE_THRESHOLD: f64 = 0.7;

/// Heartbeats are sampled: emitted only when tick % this == 0
pub const HEARTBEAT_SAMPLING_MODULUS: u64 = 5;

/// Rolling sensor window kept per channel on the cloud side
pub const CLOUD_WINDOW_SIZE: usize = 20;

/// Recent frames the edge keeps for alert raw-telemetry arrays
pub const EDGE_TELEMETRY_WINDOW: usize = 10;

/// Timeout for one external AI collaborator call (seconds)
pub const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 30;

/// Trace history bound - oldest entries evicted first
pub const TRACE_HISTORY_LIMIT: usize = 512;

/// Context pruning kicks in above this many session messages
pub const CONTEXT_PRUNE_THRESHOLD: usize = 20;

/// Messages kept from the tail when pruning (plus the objective head)
pub const CONTEXT_PRUNE_TAIL: usize = 10;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Edge-Sentry";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get machine id from environment or use default
pub fn get_machine_id() -> String {
    std::env::var("EDGE_MACHINE_ID").unwrap_or_else(|_| DEFAULT_MACHINE_ID.to_string())
}

/// Get tick interval from environment or use default
pub fn get_tick_interval_ms() -> u64 {
    std::env::var("EDGE_TICK_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICK_INTERVAL_MS)
}

/// Get collaborator timeout from environment or use default
pub fn get_collaborator_timeout_secs() -> u64 {
    std::env::var("ORCHESTRATOR_AI_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_COLLABORATOR_TIMEOUT_SECS)
}
