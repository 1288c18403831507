//! Classification Rules & Thresholds
//!
//! Defines the thresholds and the ordered rule table for edge inference.
//! No classify logic here - only constants, config and rule definitions.

use serde::{Deserialize, Serialize};

use crate::logic::dataset::{FaultMode, TelemetryFrame};

use super::types::AnomalyLabel;

// ============================================================================
// THRESHOLDS (constants - fixed at runtime)
// ============================================================================

/// Packet loss above this is treated as a flood (percent)
pub const PACKET_LOSS_FLOOD: f64 = 5.0;

/// Temperature below this rules out a thermal cause for network symptoms (C)
pub const TEMP_NOMINAL_MAX: f64 = 60.0;

/// Temperature above this correlates with kinetic manipulation (C)
pub const TEMP_KINETIC_MIN: f64 = 75.0;

/// Control-loop latency above this is degraded (ms)
pub const LATENCY_DEGRADED: f64 = 100.0;

/// Vibration amplitude above this indicates wear (mm/s RMS)
pub const VIBRATION_WEAR: f64 = 5.0;

/// Audio level above this indicates wear (dB)
pub const AUDIO_WEAR: f64 = 70.0;

/// Audio level above this is reported as abnormal noise (dB)
pub const AUDIO_ABNORMAL: f64 = 75.0;

/// Hydraulic pressure below this indicates a leak or pump wear (bar x10)
pub const PRESSURE_LOW: f64 = 180.0;

// ============================================================================
// SCORES (fixed per rule)
// ============================================================================

pub const SCORE_NETWORK_DDOS: f64 = 0.92;
pub const SCORE_CYBER_KINETIC: f64 = 0.99;
pub const SCORE_MECHANICAL_WEAR: f64 = 0.88;
pub const SCORE_NORMAL: f64 = 0.1;

// ============================================================================
// CONFIGURABLE THRESHOLDS
// ============================================================================

/// Classifier thresholds (configurable for sensitivity tuning)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    pub packet_loss_flood: f64,
    pub temp_nominal_max: f64,
    pub temp_kinetic_min: f64,
    pub latency_degraded: f64,
    pub vibration_wear: f64,
    pub audio_wear: f64,
    pub audio_abnormal: f64,
    pub pressure_low: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            packet_loss_flood: PACKET_LOSS_FLOOD,
            temp_nominal_max: TEMP_NOMINAL_MAX,
            temp_kinetic_min: TEMP_KINETIC_MIN,
            latency_degraded: LATENCY_DEGRADED,
            vibration_wear: VIBRATION_WEAR,
            audio_wear: AUDIO_WEAR,
            audio_abnormal: AUDIO_ABNORMAL,
            pressure_low: PRESSURE_LOW,
        }
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

/// Outcome produced when a rule matches
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub label: AnomalyLabel,
    pub score: f64,
    pub alerts: Vec<String>,
}

/// One ordered classification rule. Rules are evaluated top-down and the
/// first match wins - predicates overlap on purpose, so ordering is the
/// tie-break (network triage first, then kinetic, then mechanical).
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&TelemetryFrame, FaultMode, &ClassifierThresholds) -> bool,
    pub outcome: fn(&TelemetryFrame, &ClassifierThresholds) -> RuleOutcome,
}

/// The priority-ordered rule table
pub const RULES: [Rule; 3] = [
    Rule {
        name: "network_flood",
        applies: |frame, _mode, th| {
            frame.packet_loss > th.packet_loss_flood && frame.temperature < th.temp_nominal_max
        },
        outcome: |_frame, _th| RuleOutcome {
            label: AnomalyLabel::NetworkDdos,
            score: SCORE_NETWORK_DDOS,
            alerts: vec![
                "High Packet Loss Detected".to_string(),
                "Network Latency Spike".to_string(),
            ],
        },
    },
    Rule {
        name: "cyber_kinetic",
        applies: |frame, _mode, th| {
            frame.network_log.malicious
                || (frame.temperature > th.temp_kinetic_min
                    && frame.latency_ms > th.latency_degraded)
        },
        outcome: |frame, th| {
            let mut alerts = Vec::new();
            if frame.network_log.malicious {
                alerts.push(format!(
                    "Malicious Command Intercepted: {}",
                    frame.network_log.command
                ));
            }
            if frame.temperature > th.temp_kinetic_min {
                alerts.push(format!(
                    "Thermal Correlation: {:.1}C under degraded control latency",
                    frame.temperature
                ));
            }
            RuleOutcome {
                label: AnomalyLabel::CyberKinetic,
                score: SCORE_CYBER_KINETIC,
                alerts,
            }
        },
    },
    Rule {
        name: "mechanical_wear",
        applies: |frame, mode, th| {
            mode == FaultMode::MechanicalFail
                && (frame.vibration > th.vibration_wear
                    || frame.audio_level > th.audio_wear
                    || frame.pressure < th.pressure_low)
        },
        outcome: |frame, th| {
            let mut alerts = Vec::new();
            if frame.audio_level > th.audio_abnormal {
                alerts.push("Abnormal Noise".to_string());
            }
            if frame.vibration > th.vibration_wear {
                alerts.push("Rise in Amplitude".to_string());
            }
            if frame.pressure < th.pressure_low {
                alerts.push("Hydraulic Pressure Drop".to_string());
            }
            RuleOutcome {
                label: AnomalyLabel::MechanicalWear,
                score: SCORE_MECHANICAL_WEAR,
                alerts,
            }
        },
    },
];
