//! Scenario Frame Synthesis
//!
//! Generates the fixed per-scenario frame arrays at process start.
//! Everything here is seeded - replays must be reproducible byte-for-byte,
//! so no OS entropy and no wall-clock timestamps.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::frame::{FaultMode, NetworkLogEntry, TelemetryFrame};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Frames per scenario dataset
pub const DATASET_LEN: usize = 120;

/// Spacing between generated samples (matches the 500ms tick)
const SAMPLE_SPACING_MS: i64 = 500;

/// Fixed generation epoch - frames carry synthetic timestamps
const EPOCH_SECS: i64 = 1_700_000_000;

/// Per-scenario seeds
const SEED_NORMAL: u64 = 0x5EED_0001;
const SEED_IT_ATTACK: u64 = 0x5EED_0002;
const SEED_OT_ATTACK: u64 = 0x5EED_0003;
const SEED_MECHANICAL: u64 = 0x5EED_0004;

// ============================================================================
// GENERATION
// ============================================================================

/// Generate the frame array for one scenario. Deterministic per scenario.
pub fn generate(mode: FaultMode) -> Vec<TelemetryFrame> {
    let mut rng = StdRng::seed_from_u64(seed_for(mode));
    let base = Utc
        .timestamp_opt(EPOCH_SECS, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_nanos(EPOCH_SECS * 1_000_000_000));

    (0..DATASET_LEN)
        .map(|i| frame_at(mode, i, base, &mut rng))
        .collect()
}

fn seed_for(mode: FaultMode) -> u64 {
    match mode {
        FaultMode::None => SEED_NORMAL,
        FaultMode::ItAttack => SEED_IT_ATTACK,
        FaultMode::OtAttack => SEED_OT_ATTACK,
        FaultMode::MechanicalFail => SEED_MECHANICAL,
    }
}

fn frame_at(mode: FaultMode, i: usize, base: DateTime<Utc>, rng: &mut StdRng) -> TelemetryFrame {
    let timestamp = base + chrono::Duration::milliseconds(i as i64 * SAMPLE_SPACING_MS);
    let t = i as f64;

    match mode {
        FaultMode::None => TelemetryFrame {
            timestamp,
            temperature: 44.0 + 2.0 * (t / 11.0).sin() + jitter(rng, 1.2),
            vibration: 1.8 + jitter(rng, 0.4),
            audio_level: 54.0 + jitter(rng, 2.5),
            latency_ms: 18.0 + jitter(rng, 5.0).abs(),
            packet_loss: (0.3 + jitter(rng, 0.25)).max(0.0),
            cpu_load: 32.0 + jitter(rng, 6.0),
            pressure: 205.0 + jitter(rng, 4.0),
            current: 12.0 + jitter(rng, 0.8),
            network_log: benign_log(i, rng),
        },

        FaultMode::ItAttack => {
            // Flood ramps in after a short clean lead-in. Temperature stays
            // nominal: the attack lives entirely on the network layer.
            let flooding = i >= 8;
            let loss = if flooding {
                6.5 + 6.0 * ((t - 8.0) / 30.0).min(1.0) + jitter(rng, 0.8).abs()
            } else {
                (0.4 + jitter(rng, 0.3)).max(0.0)
            };
            TelemetryFrame {
                timestamp,
                temperature: 47.0 + jitter(rng, 2.0),
                vibration: 2.0 + jitter(rng, 0.4),
                audio_level: 55.0 + jitter(rng, 2.5),
                latency_ms: if flooding {
                    140.0 + jitter(rng, 40.0).abs()
                } else {
                    20.0 + jitter(rng, 5.0).abs()
                },
                packet_loss: loss,
                cpu_load: if flooding { 72.0 + jitter(rng, 8.0) } else { 34.0 + jitter(rng, 6.0) },
                pressure: 204.0 + jitter(rng, 4.0),
                current: 12.2 + jitter(rng, 0.8),
                network_log: if flooding {
                    NetworkLogEntry::benign(
                        "TCP",
                        "SYN burst :502 (half-open backlog 4096)",
                        64,
                        "10.0.94.201",
                    )
                } else {
                    benign_log(i, rng)
                },
            }
        }

        FaultMode::OtAttack => {
            // Injected setpoint overrides with correlated thermal runaway.
            let compromised = i >= 5;
            TelemetryFrame {
                timestamp,
                temperature: if compromised {
                    78.0 + 14.0 * ((t - 5.0) / 40.0).min(1.0) + jitter(rng, 1.5)
                } else {
                    46.0 + jitter(rng, 2.0)
                },
                vibration: 2.4 + jitter(rng, 0.5),
                audio_level: 57.0 + jitter(rng, 3.0),
                latency_ms: if compromised {
                    120.0 + jitter(rng, 25.0).abs()
                } else {
                    19.0 + jitter(rng, 5.0).abs()
                },
                packet_loss: (0.5 + jitter(rng, 0.3)).max(0.0),
                cpu_load: 38.0 + jitter(rng, 6.0),
                pressure: 207.0 + jitter(rng, 4.0),
                current: 14.5 + jitter(rng, 1.0),
                network_log: if compromised {
                    NetworkLogEntry::malicious(
                        "MODBUS/TCP",
                        "WRITE_SINGLE_REGISTER 40012=0x03E7 (coolant setpoint override)",
                        12,
                        "192.168.4.66",
                    )
                } else {
                    benign_log(i, rng)
                },
            }
        }

        FaultMode::MechanicalFail => {
            // Slow wear curve: vibration climbs, hydraulic pressure decays.
            // By index 50 vibration is above 5 and pressure is below 180.
            let vibration = 2.0 + 0.08 * t + jitter(rng, 0.12);
            let pressure = 210.0 - 0.7 * t + jitter(rng, 0.8);
            TelemetryFrame {
                timestamp,
                temperature: 50.0 + 0.04 * t + jitter(rng, 1.5),
                vibration,
                audio_level: 55.0 + 0.25 * t + jitter(rng, 1.5),
                latency_ms: 20.0 + jitter(rng, 5.0).abs(),
                packet_loss: (0.3 + jitter(rng, 0.25)).max(0.0),
                cpu_load: 33.0 + jitter(rng, 6.0),
                pressure,
                current: 12.0 + 0.03 * t + jitter(rng, 0.8),
                network_log: benign_log(i, rng),
            }
        }
    }
}

/// Symmetric uniform jitter in [-amp, amp]
fn jitter(rng: &mut StdRng, amp: f64) -> f64 {
    rng.gen_range(-amp..=amp)
}

/// Routine plant traffic cycled per index
fn benign_log(i: usize, rng: &mut StdRng) -> NetworkLogEntry {
    const COMMANDS: [(&str, &str); 4] = [
        ("MODBUS/TCP", "READ_HOLDING_REGISTERS 40001..40016"),
        ("OPC-UA", "Read ns=2;s=Spindle.Temperature"),
        ("MODBUS/TCP", "READ_COILS 00017..00032"),
        ("OPC-UA", "Subscribe ns=2;s=Hydraulic.Pressure"),
    ];
    let (protocol, command) = COMMANDS[i % COMMANDS.len()];
    NetworkLogEntry::benign(protocol, command, rng.gen_range(24..96), "192.168.4.10")
}
