//! Edge-Sentry Core
//!
//! Simulated edge-to-cloud telemetry pipeline with on-device anomaly
//! classification, plus an approval-gated agent orchestration kernel.
//! No real network, hardware or model execution - everything is an
//! in-process, deterministic simulation.

pub mod constants;
pub mod logic;

pub use logic::bus::{EventBus, SubscriptionId};
pub use logic::classifier::{AnomalyLabel, ClassifierThresholds, NanoAnalysis};
pub use logic::cloud::{CloudGateway, CloudSnapshot, LinkStatus};
pub use logic::dataset::{DatasetStore, FaultMode, NetworkLogEntry, TelemetryFrame};
pub use logic::edge_service::{EdgeService, EngineStatus};
pub use logic::orchestrator::{
    AgentMessage, AgentOrchestrator, AgentRole, AgentTrace, Collaborator, CollaboratorError,
    GenerateRequest, GenerateResponse, MemoryService, OrchestratorError, ResearchSession,
    ScriptedCollaborator, SessionStatus, TestMetrics, TraceStatus,
};
pub use logic::uplink::{DeviceStatus, EdgeEvent, EventKind};
