//! Telemetry Frame Types
//!
//! Core data structures for sampled sensor instants.
//! No logic here - only immutable frame shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// FAULT MODE
// ============================================================================

/// Fault scenario selecting which dataset the playback engine replays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultMode {
    /// Healthy baseline operation
    None,
    /// IT-layer attack (packet flood, latency spikes)
    ItAttack,
    /// OT-layer attack (malicious control commands, thermal manipulation)
    OtAttack,
    /// Slow-developing mechanical degradation
    MechanicalFail,
}

impl FaultMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultMode::None => "NONE",
            FaultMode::ItAttack => "IT_ATTACK",
            FaultMode::OtAttack => "OT_ATTACK",
            FaultMode::MechanicalFail => "MECHANICAL_FAIL",
        }
    }

    pub fn all() -> [FaultMode; 4] {
        [
            FaultMode::None,
            FaultMode::ItAttack,
            FaultMode::OtAttack,
            FaultMode::MechanicalFail,
        ]
    }
}

impl std::fmt::Display for FaultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// NETWORK LOG ENTRY
// ============================================================================

/// One captured control-network line embedded in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLogEntry {
    /// Protocol observed on the wire (e.g. "MODBUS/TCP", "OPC-UA")
    pub protocol: String,
    /// Command payload as captured
    pub command: String,
    /// Flagged malicious by the capture filter
    pub malicious: bool,
    /// Payload size in bytes
    pub size_bytes: u32,
    /// Source address of the command
    pub source: String,
}

impl NetworkLogEntry {
    pub fn benign(protocol: &str, command: &str, size_bytes: u32, source: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            command: command.to_string(),
            malicious: false,
            size_bytes,
            source: source.to_string(),
        }
    }

    pub fn malicious(protocol: &str, command: &str, size_bytes: u32, source: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            command: command.to_string(),
            malicious: true,
            size_bytes,
            source: source.to_string(),
        }
    }
}

// ============================================================================
// TELEMETRY FRAME
// ============================================================================

/// One sampled instant from the simulated machine.
///
/// Immutable once generated; owned exclusively by its dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Sample timestamp (fixed at generation, 500ms spacing)
    pub timestamp: DateTime<Utc>,
    /// Spindle temperature (Celsius)
    pub temperature: f64,
    /// Vibration amplitude (mm/s RMS)
    pub vibration: f64,
    /// Acoustic level at the housing (dB)
    pub audio_level: f64,
    /// Control-loop round trip (ms)
    pub latency_ms: f64,
    /// Packet loss on the control network (percent)
    pub packet_loss: f64,
    /// Edge controller CPU load (percent)
    pub cpu_load: f64,
    /// Hydraulic pressure (bar x10)
    pub pressure: f64,
    /// Motor current draw (amps)
    pub current: f64,
    /// Most recent control-network line captured with this sample
    pub network_log: NetworkLogEntry,
}
