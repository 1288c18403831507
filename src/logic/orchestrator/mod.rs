//! Agent Orchestration
//!
//! Approval-gated multi-agent workflow: FSM kernel, collaborator seam,
//! tracer and memory service.

pub mod collaborator;
pub mod error;
pub mod kernel;
pub mod memory;
pub mod tracer;
pub mod types;

pub use collaborator::{Collaborator, GenerateRequest, GenerateResponse, ScriptedCollaborator};
pub use error::{CollaboratorError, OrchestratorError};
pub use kernel::AgentOrchestrator;
pub use memory::MemoryService;
pub use tracer::{AgentTrace, TraceStatus, Tracer};
pub use types::{
    AgentMessage, AgentRole, MessageMetadata, ResearchSession, SessionStatus, TestMetrics,
};
