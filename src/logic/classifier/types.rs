//! Edge Inference Types
//!
//! Output shapes of the on-device anomaly classifier.
//! No logic here - only data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// ANOMALY LABEL
// ============================================================================

/// Detected anomaly class, ordered roughly by triage priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyLabel {
    /// Healthy operation, nothing to report
    Normal,
    /// Slow-developing mechanical degradation
    MechanicalWear,
    /// Uncontrolled thermal climb
    ThermalRunaway,
    /// Network-layer flood / denial of service
    NetworkDdos,
    /// Malicious control command with physical correlation
    CyberKinetic,
    /// Classifier could not place the frame
    Unknown,
}

impl AnomalyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyLabel::Normal => "NORMAL",
            AnomalyLabel::MechanicalWear => "MECHANICAL_WEAR",
            AnomalyLabel::ThermalRunaway => "THERMAL_RUNAWAY",
            AnomalyLabel::NetworkDdos => "NETWORK_DDOS",
            AnomalyLabel::CyberKinetic => "CYBER_KINETIC",
            AnomalyLabel::Unknown => "UNKNOWN",
        }
    }

    /// Triage severity used when ranking concurrent findings
    pub fn severity_level(&self) -> u8 {
        match self {
            AnomalyLabel::Normal => 0,
            AnomalyLabel::Unknown => 1,
            AnomalyLabel::MechanicalWear => 2,
            AnomalyLabel::ThermalRunaway => 3,
            AnomalyLabel::NetworkDdos => 4,
            AnomalyLabel::CyberKinetic => 5,
        }
    }
}

impl std::fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CLASSIFIER RESULT
// ============================================================================

/// Result of one on-device inference pass. Created fresh each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NanoAnalysis {
    /// Anomaly score in 0.0 - 1.0
    pub anomaly_score: f64,
    /// Simulated on-device inference latency (ms)
    pub inference_latency_ms: f64,
    /// First matching rule's label
    pub label: AnomalyLabel,
    /// Human-readable findings, most significant first
    pub alerts: Vec<String>,
}

impl Default for NanoAnalysis {
    fn default() -> Self {
        Self {
            anomaly_score: 0.0,
            inference_latency_ms: 0.0,
            label: AnomalyLabel::Unknown,
            alerts: vec![],
        }
    }
}
