//! Edge-Sentry - Demo Entry Point
//!
//! Wires the edge engine to the cloud gateway, replays each fault scenario
//! for a few ticks, then walks one orchestration session through all three
//! approval gates against the scripted collaborator.

use std::sync::Arc;

use edge_sentry_core::constants;
use edge_sentry_core::{
    AgentOrchestrator, CloudGateway, DatasetStore, EdgeEvent, EdgeService, EventBus, FaultMode,
    ScriptedCollaborator,
};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} v{} (simulation - no real I/O)...",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    // --- Edge pipeline ---------------------------------------------------
    let bus = Arc::new(EventBus::new());
    let edge = Arc::new(EdgeService::new(DatasetStore::new(), Arc::clone(&bus)));

    let gateway = CloudGateway::new();
    gateway.attach(&bus);

    edge.subscribe_to_alert(|event| {
        if let EdgeEvent::Alert { nano_analysis, .. } = event {
            log::info!(
                "cloud received ALERT: {} ({:.2}) - {:?}",
                nano_analysis.label,
                nano_analysis.anomaly_score,
                nano_analysis.alerts
            );
        }
    });

    for mode in [
        FaultMode::None,
        FaultMode::ItAttack,
        FaultMode::OtAttack,
        FaultMode::MechanicalFail,
    ] {
        edge.set_fault_mode(mode);
        // MECHANICAL_FAIL develops slowly; play it deep enough to degrade.
        let ticks = if mode == FaultMode::MechanicalFail { 55 } else { 12 };
        for _ in 0..ticks {
            edge.tick();
        }
        let status = edge.status();
        log::info!(
            "scenario {} done: {} heartbeats, {} alerts (cursor {})",
            mode,
            status.heartbeats_emitted,
            status.alerts_emitted,
            status.cursor
        );
    }

    let snapshot = gateway.snapshot();
    log::info!(
        "cloud state: {:?}, {} heartbeats, {} alerts, {} channels windowed",
        snapshot.status,
        snapshot.heartbeats_received,
        snapshot.alerts_received,
        snapshot.sensor_windows.len()
    );

    // --- Orchestration session -------------------------------------------
    let orchestrator =
        AgentOrchestrator::new(Arc::new(ScriptedCollaborator::new()));
    let mut gate = orchestrator
        .start_session("reduce spindle vibration alerts before the next maintenance window")
        .await;

    loop {
        log::info!("[{}] {}", gate.role, gate.content);
        let produced = orchestrator
            .process_approval(gate.id, true)
            .await
            .expect("gate accepts one decision");
        for message in &produced {
            log::info!("[{}] {}", message.role, message.content);
        }
        match produced.into_iter().find(|m| m.requires_hil) {
            Some(next) => gate = next,
            None => break,
        }
    }

    let session = orchestrator.session().await.expect("session active");
    log::info!(
        "session {} finished in {} with {} messages (~{} tokens)",
        session.id,
        session.status,
        session.messages.len(),
        session.token_estimate
    );
    for trace in orchestrator.get_traces() {
        log::info!(
            "trace #{} [{}] {} -> {:?} ({:.1}ms)",
            trace.sequence,
            trace.role,
            trace.action,
            trace.status,
            trace.latency_ms
        );
    }
}
