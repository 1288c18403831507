//! Cloud Ingestion Gateway
//!
//! Receives edge events and maps them into application-facing partial state
//! updates: link status plus a bounded rolling window of recent samples per
//! sensor channel (FIFO eviction, oldest first).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::CLOUD_WINDOW_SIZE;
use crate::logic::bus::{EventBus, SubscriptionId};
use crate::logic::classifier::NanoAnalysis;
use crate::logic::uplink::{EdgeEvent, EventKind, RawTelemetry};

// ============================================================================
// TYPES
// ============================================================================

/// Link status shown to the application layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    /// Heartbeats arriving, no active anomaly
    Ok,
    /// Last event was a full diagnostic alert
    Critical,
    /// Nothing received yet
    Unknown,
}

/// UI-facing snapshot of everything the gateway has ingested
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSnapshot {
    pub status: LinkStatus,
    pub streaming: bool,
    pub machine_id: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub heartbeats_received: u64,
    pub alerts_received: u64,
    pub last_analysis: Option<NanoAnalysis>,
    /// Rolling window per sensor channel, oldest first
    pub sensor_windows: HashMap<String, Vec<f64>>,
}

#[derive(Debug, Default)]
struct GatewayState {
    status: Option<LinkStatus>,
    machine_id: Option<String>,
    last_update: Option<DateTime<Utc>>,
    heartbeats_received: u64,
    alerts_received: u64,
    last_analysis: Option<NanoAnalysis>,
    windows: HashMap<String, VecDeque<f64>>,
}

impl GatewayState {
    fn append(&mut self, channel: &str, value: f64) {
        let window = self.windows.entry(channel.to_string()).or_default();
        window.push_back(value);
        while window.len() > CLOUD_WINDOW_SIZE {
            window.pop_front();
        }
    }
}

// ============================================================================
// GATEWAY
// ============================================================================

/// Well-known subscriber reshaping edge events into cloud state
pub struct CloudGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl CloudGateway {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(GatewayState::default())),
        }
    }

    /// Subscribe this gateway to a bus. Returns the tokens so a caller can
    /// detach it again.
    pub fn attach(&self, bus: &EventBus) -> [SubscriptionId; 2] {
        let hb_state = Arc::clone(&self.state);
        let heartbeat_token = bus.subscribe(EventKind::Heartbeat, move |event| {
            Self::ingest_into(&hb_state, event);
        });
        let alert_state = Arc::clone(&self.state);
        let alert_token = bus.subscribe(EventKind::Alert, move |event| {
            Self::ingest_into(&alert_state, event);
        });
        [heartbeat_token, alert_token]
    }

    /// Direct ingestion path, used by tests and by `attach` callbacks
    pub fn ingest(&self, event: &EdgeEvent) {
        Self::ingest_into(&self.state, event);
    }

    fn ingest_into(state: &Arc<RwLock<GatewayState>>, event: &EdgeEvent) {
        let mut s = state.write();
        match event {
            EdgeEvent::Heartbeat {
                machine_id,
                timestamp,
                average_temp,
                cpu_load,
                ..
            } => {
                s.status = Some(LinkStatus::Ok);
                s.machine_id = Some(machine_id.clone());
                s.last_update = Some(*timestamp);
                s.heartbeats_received += 1;
                s.append("temperature", *average_temp);
                s.append("cpu_load", *cpu_load);
            }
            EdgeEvent::Alert {
                machine_id,
                timestamp,
                nano_analysis,
                raw_telemetry,
                ..
            } => {
                s.status = Some(LinkStatus::Critical);
                s.machine_id = Some(machine_id.clone());
                s.last_update = Some(*timestamp);
                s.alerts_received += 1;
                s.last_analysis = Some(nano_analysis.clone());
                Self::append_latest(&mut s, raw_telemetry);
            }
            EdgeEvent::Log { .. } => {}
        }
    }

    /// Append the latest value of each channel array to its rolling window
    fn append_latest(state: &mut GatewayState, raw: &RawTelemetry) {
        let channels: [(&str, &Vec<f64>); 8] = [
            ("temperature", &raw.temperature),
            ("vibration", &raw.vibration),
            ("audio_level", &raw.audio_level),
            ("latency_ms", &raw.latency_ms),
            ("packet_loss", &raw.packet_loss),
            ("cpu_load", &raw.cpu_load),
            ("pressure", &raw.pressure),
            ("current", &raw.current),
        ];
        for (name, values) in channels {
            if let Some(latest) = values.last() {
                state.append(name, *latest);
            }
        }
    }

    pub fn snapshot(&self) -> CloudSnapshot {
        let s = self.state.read();
        CloudSnapshot {
            status: s.status.unwrap_or(LinkStatus::Unknown),
            streaming: s.status == Some(LinkStatus::Ok),
            machine_id: s.machine_id.clone(),
            last_update: s.last_update,
            heartbeats_received: s.heartbeats_received,
            alerts_received: s.alerts_received,
            last_analysis: s.last_analysis.clone(),
            sensor_windows: s
                .windows
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().copied().collect()))
                .collect(),
        }
    }
}

impl Default for CloudGateway {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
