//! Edge Engine Service
//!
//! Drives the read -> classify -> gate -> publish sequence on a fixed tick.
//! Constructed instance with injected dataset store and bus - no module
//! globals, so tests run isolated engines.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::{self, EDGE_TELEMETRY_WINDOW};
use crate::logic::bus::{EventBus, SubscriptionId};
use crate::logic::classifier::{self, ClassifierThresholds};
use crate::logic::dataset::{DatasetStore, FaultMode, TelemetryFrame};
use crate::logic::playback::EdgeState;
use crate::logic::uplink::{self, EdgeEvent, EventKind};

// ============================================================================
// STATE
// ============================================================================

/// Everything the tick mutates, behind one lock. Mode switches and ticks
/// interleave, so the whole read-modify sequence holds this exclusively.
struct EngineState {
    playback: EdgeState,
    window: VecDeque<TelemetryFrame>,
    tick: u64,
    heartbeats_emitted: u64,
    alerts_emitted: u64,
}

/// Status snapshot exposed to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub machine_id: String,
    pub mode: FaultMode,
    pub cursor: usize,
    pub dataset_len: usize,
    pub tick: u64,
    pub heartbeats_emitted: u64,
    pub alerts_emitted: u64,
    pub running: bool,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct EdgeService {
    machine_id: String,
    store: DatasetStore,
    thresholds: ClassifierThresholds,
    state: Mutex<EngineState>,
    bus: Arc<EventBus>,
    running: AtomicBool,
}

impl EdgeService {
    pub fn new(store: DatasetStore, bus: Arc<EventBus>) -> Self {
        let playback = EdgeState::new(&store);
        Self {
            machine_id: constants::get_machine_id(),
            store,
            thresholds: ClassifierThresholds::default(),
            state: Mutex::new(EngineState {
                playback,
                window: VecDeque::with_capacity(EDGE_TELEMETRY_WINDOW),
                tick: 0,
                heartbeats_emitted: 0,
                alerts_emitted: 0,
            }),
            bus,
            running: AtomicBool::new(false),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ------------------------------------------------------------------
    // Subscription helpers
    // ------------------------------------------------------------------

    pub fn subscribe_to_heartbeat<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&EdgeEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(EventKind::Heartbeat, callback)
    }

    pub fn subscribe_to_alert<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&EdgeEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(EventKind::Alert, callback)
    }

    pub fn subscribe_to_log<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&EdgeEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(EventKind::Log, callback)
    }

    pub fn unsubscribe(&self, token: SubscriptionId) {
        self.bus.unsubscribe(token);
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Switch the fault scenario. Swaps the dataset and resets the cursor
    /// to 0 in one assignment under the state lock.
    pub fn set_fault_mode(&self, mode: FaultMode) {
        {
            let mut state = self.state.lock();
            state.playback.set_fault_mode(&self.store, mode);
            state.window.clear();
        }
        log::info!("fault mode switched to {}", mode);
        self.publish_log(format!("fault mode set to {}", mode));
    }

    /// One engine tick: advance playback, classify, gate, publish.
    /// Returns the event that was emitted, if any.
    pub fn tick(&self) -> Option<EdgeEvent> {
        let (event, tick) = {
            let mut state = self.state.lock();

            let frame = state.playback.next_frame();
            state.window.push_back(frame.clone());
            while state.window.len() > EDGE_TELEMETRY_WINDOW {
                state.window.pop_front();
            }

            let result =
                classifier::classify_with_thresholds(&frame, state.playback.mode(), &self.thresholds);
            let window: Vec<TelemetryFrame> = state.window.iter().cloned().collect();
            let event =
                uplink::decide_uplink(&self.machine_id, &result, &frame, &window, state.tick);

            let tick = state.tick;
            state.tick += 1;
            match event {
                Some(EdgeEvent::Heartbeat { .. }) => state.heartbeats_emitted += 1,
                Some(EdgeEvent::Alert { .. }) => state.alerts_emitted += 1,
                _ => {}
            }
            (event, tick)
        };
        // Lock released before fan-out so a subscriber may call back into
        // the service (e.g. switch mode on alert).

        if let Some(ref e) = event {
            self.bus.publish(e);
            if let EdgeEvent::Alert { nano_analysis, .. } = e {
                log::warn!(
                    "tick {}: alert {} ({:.2})",
                    tick,
                    nano_analysis.label,
                    nano_analysis.anomaly_score
                );
                self.publish_log(format!(
                    "alert published: {} score {:.2}",
                    nano_analysis.label, nano_analysis.anomaly_score
                ));
            }
        }
        event
    }

    fn publish_log(&self, line: String) {
        self.bus.publish(&EdgeEvent::Log {
            machine_id: self.machine_id.clone(),
            timestamp: Utc::now(),
            line,
        });
    }

    // ------------------------------------------------------------------
    // Runner
    // ------------------------------------------------------------------

    /// Spawn the fixed-interval tick loop. Stops when `stop()` is called.
    pub fn spawn_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        service.running.store(true, Ordering::SeqCst);
        let interval_ms = constants::get_tick_interval_ms();
        tokio::spawn(async move {
            log::info!("edge tick loop started ({interval_ms}ms interval)");
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
            while service.running.load(Ordering::SeqCst) {
                interval.tick().await;
                service.tick();
            }
            log::info!("edge tick loop stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state.lock();
        EngineStatus {
            machine_id: self.machine_id.clone(),
            mode: state.playback.mode(),
            cursor: state.playback.cursor(),
            dataset_len: state.playback.dataset_len(),
            tick: state.tick,
            heartbeats_emitted: state.heartbeats_emitted,
            alerts_emitted: state.alerts_emitted,
            running: self.running.load(Ordering::SeqCst),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::classifier::types::AnomalyLabel;
    use parking_lot::Mutex as PlMutex;

    fn service() -> Arc<EdgeService> {
        Arc::new(EdgeService::new(DatasetStore::new(), Arc::new(EventBus::new())))
    }

    #[test]
    fn test_normal_mode_emits_sampled_heartbeats_only() {
        let svc = service();
        let mut heartbeats = 0;
        let mut alerts = 0;
        for _ in 0..10 {
            match svc.tick() {
                Some(EdgeEvent::Heartbeat { .. }) => heartbeats += 1,
                Some(EdgeEvent::Alert { .. }) => alerts += 1,
                _ => {}
            }
        }
        assert_eq!(heartbeats, 2, "ticks 0 and 5 of a 0-indexed run");
        assert_eq!(alerts, 0);
    }

    #[test]
    fn test_mechanical_scenario_alerts_at_index_50() {
        let svc = service();
        svc.set_fault_mode(FaultMode::MechanicalFail);

        let captured = Arc::new(PlMutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        svc.subscribe_to_alert(move |event| {
            if let EdgeEvent::Alert { nano_analysis, .. } = event {
                sink.lock().push(nano_analysis.clone());
            }
        });

        // Tick until the cursor reaches index 50, where the wear fixtures
        // put pressure below 180 and vibration above 5.
        let mut last = None;
        while svc.status().cursor < 50 {
            if let Some(EdgeEvent::Alert { nano_analysis, .. }) = svc.tick() {
                last = Some(nano_analysis);
            }
        }

        let analysis = last.expect("index 50 must classify as wear");
        assert_eq!(analysis.label, AnomalyLabel::MechanicalWear);
        assert!(analysis.alerts.contains(&"Rise in Amplitude".to_string()));
        assert!(!captured.lock().is_empty());
    }

    #[test]
    fn test_ot_attack_alerts_are_never_suppressed() {
        let svc = service();
        svc.set_fault_mode(FaultMode::OtAttack);

        // Skip the clean lead-in frames.
        for _ in 0..6 {
            svc.tick();
        }
        for _ in 0..10 {
            match svc.tick() {
                Some(EdgeEvent::Alert { nano_analysis, .. }) => {
                    assert_eq!(nano_analysis.label, AnomalyLabel::CyberKinetic);
                }
                other => panic!("expected an alert every tick, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_status_tracks_mode_and_counters() {
        let svc = service();
        svc.tick();
        svc.tick();
        let status = svc.status();
        assert_eq!(status.mode, FaultMode::None);
        assert_eq!(status.tick, 2);
        assert_eq!(status.cursor, 2);
        assert_eq!(status.heartbeats_emitted, 1);
    }

    #[test]
    fn test_mode_switch_is_visible_on_log_channel() {
        let svc = service();
        let lines = Arc::new(PlMutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        svc.subscribe_to_log(move |event| {
            if let EdgeEvent::Log { line, .. } = event {
                sink.lock().push(line.clone());
            }
        });

        svc.set_fault_mode(FaultMode::ItAttack);
        assert!(lines
            .lock()
            .iter()
            .any(|l| l.contains("IT_ATTACK")));
    }
}
