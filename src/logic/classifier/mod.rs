//! Edge Classifier
//!
//! Only the classify logic - types live in `types`, thresholds and the rule
//! table in `rules`.
//! Input: TelemetryFrame + active FaultMode
//! Output: NanoAnalysis

pub mod rules;
pub mod types;

use std::time::Instant;

use crate::logic::dataset::{FaultMode, TelemetryFrame};

pub use rules::ClassifierThresholds;
pub use types::{AnomalyLabel, NanoAnalysis};

/// Simulated fixed on-device model overhead (ms)
const INFERENCE_OVERHEAD_MS: f64 = 8.0;

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify one frame against the ordered rule table.
///
/// Pure function of the frame plus the active fault mode - deterministic,
/// no side effects. First matching rule wins; no rule matching means NORMAL.
pub fn classify(frame: &TelemetryFrame, mode: FaultMode) -> NanoAnalysis {
    classify_with_thresholds(frame, mode, &ClassifierThresholds::default())
}

/// Classification with custom thresholds
pub fn classify_with_thresholds(
    frame: &TelemetryFrame,
    mode: FaultMode,
    thresholds: &ClassifierThresholds,
) -> NanoAnalysis {
    let started = Instant::now();

    for rule in &rules::RULES {
        if (rule.applies)(frame, mode, thresholds) {
            let outcome = (rule.outcome)(frame, thresholds);
            log::debug!(
                "classifier rule '{}' matched: {} ({:.2})",
                rule.name,
                outcome.label,
                outcome.score
            );
            return NanoAnalysis {
                anomaly_score: outcome.score,
                inference_latency_ms: latency_since(started),
                label: outcome.label,
                alerts: outcome.alerts,
            };
        }
    }

    NanoAnalysis {
        anomaly_score: rules::SCORE_NORMAL,
        inference_latency_ms: latency_since(started),
        label: AnomalyLabel::Normal,
        alerts: vec![],
    }
}

fn latency_since(started: Instant) -> f64 {
    INFERENCE_OVERHEAD_MS + started.elapsed().as_secs_f64() * 1000.0
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::NetworkLogEntry;
    use chrono::{TimeZone, Utc};

    fn frame() -> TelemetryFrame {
        TelemetryFrame {
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            temperature: 45.0,
            vibration: 2.0,
            audio_level: 55.0,
            latency_ms: 20.0,
            packet_loss: 0.4,
            cpu_load: 30.0,
            pressure: 205.0,
            current: 12.0,
            network_log: NetworkLogEntry::benign(
                "MODBUS/TCP",
                "READ_HOLDING_REGISTERS 40001..40016",
                32,
                "192.168.4.10",
            ),
        }
    }

    #[test]
    fn test_healthy_frame_is_normal() {
        let result = classify(&frame(), FaultMode::None);
        assert_eq!(result.label, AnomalyLabel::Normal);
        assert!((result.anomaly_score - 0.1).abs() < f64::EPSILON);
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn test_packet_loss_with_cool_machine_is_ddos() {
        let mut f = frame();
        f.packet_loss = 6.0;
        f.temperature = 50.0;
        let result = classify(&f, FaultMode::ItAttack);
        assert_eq!(result.label, AnomalyLabel::NetworkDdos);
        assert!((result.anomaly_score - 0.92).abs() < f64::EPSILON);
        assert!(result.alerts.contains(&"High Packet Loss Detected".to_string()));
        assert!(result.alerts.contains(&"Network Latency Spike".to_string()));
    }

    #[test]
    fn test_rule_one_takes_precedence_over_cyber_kinetic() {
        // Frame satisfies both the flood rule and the malicious-command rule.
        // Evaluation order is the designed tie-break: DDoS must win.
        let mut f = frame();
        f.packet_loss = 6.0;
        f.temperature = 50.0;
        f.network_log.malicious = true;
        let result = classify(&f, FaultMode::ItAttack);
        assert_eq!(result.label, AnomalyLabel::NetworkDdos);
        assert!((result.anomaly_score - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malicious_command_is_cyber_kinetic() {
        let mut f = frame();
        f.network_log = NetworkLogEntry::malicious(
            "MODBUS/TCP",
            "WRITE_SINGLE_REGISTER 40012=0x03E7",
            12,
            "192.168.4.66",
        );
        let result = classify(&f, FaultMode::OtAttack);
        assert_eq!(result.label, AnomalyLabel::CyberKinetic);
        assert!((result.anomaly_score - 0.99).abs() < f64::EPSILON);
        // The literal offending payload must surface in the alert text.
        assert!(result
            .alerts
            .iter()
            .any(|a| a.contains("WRITE_SINGLE_REGISTER 40012=0x03E7")));
    }

    #[test]
    fn test_hot_and_laggy_without_malicious_log_is_cyber_kinetic() {
        let mut f = frame();
        f.temperature = 80.0;
        f.latency_ms = 150.0;
        let result = classify(&f, FaultMode::OtAttack);
        assert_eq!(result.label, AnomalyLabel::CyberKinetic);
        assert!(result.alerts.iter().any(|a| a.contains("Thermal Correlation")));
    }

    #[test]
    fn test_mechanical_rule_is_gated_by_fault_mode() {
        // High vibration outside MECHANICAL_FAIL mode must not classify as
        // wear - the rule is mode-gated.
        let mut f = frame();
        f.vibration = 10.0;
        let result = classify(&f, FaultMode::None);
        assert_eq!(result.label, AnomalyLabel::Normal);
    }

    #[test]
    fn test_mechanical_wear_sub_alerts() {
        let mut f = frame();
        f.vibration = 6.5;
        f.audio_level = 78.0;
        f.pressure = 170.0;
        let result = classify(&f, FaultMode::MechanicalFail);
        assert_eq!(result.label, AnomalyLabel::MechanicalWear);
        assert!((result.anomaly_score - 0.88).abs() < f64::EPSILON);
        assert!(result.alerts.contains(&"Abnormal Noise".to_string()));
        assert!(result.alerts.contains(&"Rise in Amplitude".to_string()));
        assert!(result.alerts.contains(&"Hydraulic Pressure Drop".to_string()));
    }

    #[test]
    fn test_audio_between_wear_and_abnormal_matches_without_noise_alert() {
        let mut f = frame();
        f.audio_level = 72.0;
        let result = classify(&f, FaultMode::MechanicalFail);
        assert_eq!(result.label, AnomalyLabel::MechanicalWear);
        assert!(!result.alerts.contains(&"Abnormal Noise".to_string()));
    }

    #[test]
    fn test_inference_latency_includes_fixed_overhead() {
        let result = classify(&frame(), FaultMode::None);
        assert!(result.inference_latency_ms >= 8.0);
    }
}
