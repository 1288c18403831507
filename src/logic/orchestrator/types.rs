//! Orchestration Session Types
//!
//! Data structures for the agent workflow - no transition logic here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SESSION STATUS
// ============================================================================

/// Workflow stage. Advances monotonically; DEPLOYED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Researching,
    Planning,
    Validating,
    Deployed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Researching => "RESEARCHING",
            SessionStatus::Planning => "PLANNING",
            SessionStatus::Validating => "VALIDATING",
            SessionStatus::Deployed => "DEPLOYED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Deployed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// AGENT ROLE
// ============================================================================

/// Who authored a message or ran a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    /// Coordinates the workflow and owns the approval gates
    Orchestrator,
    /// Research sub-agent
    Search,
    /// Test sub-agent
    Tester,
    /// Deployment sub-agent
    Deployer,
    /// The human reviewer
    Supervisor,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "orchestrator",
            AgentRole::Search => "search",
            AgentRole::Tester => "tester",
            AgentRole::Deployer => "deployer",
            AgentRole::Supervisor => "supervisor",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// MESSAGE METADATA
// ============================================================================

/// Metrics attached to validation messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub passed: u32,
    pub failed: u32,
    pub coverage_percent: f64,
    pub p95_latency_ms: f64,
}

/// Optional structured payload carried by a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_metrics: Option<TestMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
}

// ============================================================================
// AGENT MESSAGE
// ============================================================================

/// One entry in the session's append-only message list.
/// Mutated exactly once after creation: the approval decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: Uuid,
    pub role: AgentRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Requires a human decision before the workflow may advance
    pub requires_hil: bool,
    /// None until the human decides
    pub approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl AgentMessage {
    pub fn new(role: AgentRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            requires_hil: false,
            approved: None,
            metadata: None,
        }
    }

    pub fn requiring_approval(mut self) -> Self {
        self.requires_hil = true;
        self
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Still waiting on the human
    pub fn is_pending(&self) -> bool {
        self.requires_hil && self.approved.is_none()
    }
}

// ============================================================================
// RESEARCH SESSION
// ============================================================================

/// Orchestration session root. Single active session per kernel; starting a
/// new one discards this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSession {
    pub id: Uuid,
    pub objective: String,
    pub status: SessionStatus,
    pub messages: Vec<AgentMessage>,
    /// Long-term-memory hits found for the objective at start
    pub memory_hits: Vec<String>,
    /// Rough token budget consumed so far (chars / 4)
    pub token_estimate: u64,
}

impl ResearchSession {
    pub fn new(objective: impl Into<String>, memory_hits: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            objective: objective.into(),
            status: SessionStatus::Researching,
            messages: Vec::new(),
            memory_hits,
            token_estimate: 0,
        }
    }

    /// Append a message, charging its content against the token estimate
    pub fn push_message(&mut self, message: AgentMessage) {
        self.token_estimate += (message.content.len() as u64) / 4;
        self.messages.push(message);
    }

    /// The message currently awaiting human review, if any
    pub fn pending_gate(&self) -> Option<&AgentMessage> {
        self.messages.iter().rev().find(|m| m.is_pending())
    }
}
