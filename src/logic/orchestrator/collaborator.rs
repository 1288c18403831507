//! External AI Collaborator Seam
//!
//! The LLM backend is an opaque request/response capability behind this
//! trait. The kernel never talks to a provider directly, so tests and the
//! demo driver inject a scripted implementation.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::error::CollaboratorError;
use super::types::AgentRole;

// ============================================================================
// REQUEST / RESPONSE CONTRACT
// ============================================================================

/// One generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Which sub-agent persona is being invoked
    pub role: AgentRole,
    pub prompt: String,
    /// Long-term-memory hits supplied as grounding context
    pub context: Vec<String>,
}

/// Text (or structured JSON as text) returned by the collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CollaboratorError>;
}

// ============================================================================
// SCRIPTED IMPLEMENTATION
// ============================================================================

/// Deterministic collaborator with canned per-role responses. Used by the
/// demo driver and the kernel tests; failure injection per role lets tests
/// exercise the degradation path.
pub struct ScriptedCollaborator {
    latency: Duration,
    failing_roles: RwLock<HashSet<AgentRole>>,
    malformed_roles: RwLock<HashSet<AgentRole>>,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(5),
            failing_roles: RwLock::new(HashSet::new()),
            malformed_roles: RwLock::new(HashSet::new()),
        }
    }

    /// Make calls for one role fail with `Unavailable`
    pub fn fail_role(&self, role: AgentRole) {
        self.failing_roles.write().insert(role);
    }

    /// Make one role return text that does not parse as its expected shape
    pub fn garble_role(&self, role: AgentRole) {
        self.malformed_roles.write().insert(role);
    }

    pub fn restore_role(&self, role: AgentRole) {
        self.failing_roles.write().remove(&role);
        self.malformed_roles.write().remove(&role);
    }

    fn canned(&self, request: &GenerateRequest) -> GenerateResponse {
        match request.role {
            AgentRole::Search => GenerateResponse {
                text: format!(
                    "Findings for '{}': comparable plants report vibration-led \
                     failure precursors 2-6 weeks ahead of breakdown; Modbus \
                     write filtering is the highest-leverage OT control.",
                    request.prompt
                ),
                sources: Some(vec![
                    "https://standards.example/iec-62443".to_string(),
                    "https://journal.example/vibration-prognostics".to_string(),
                ]),
            },
            AgentRole::Tester => GenerateResponse {
                text: r#"{"passed":42,"failed":0,"coverage_percent":87.5,"p95_latency_ms":41.0}"#
                    .to_string(),
                sources: None,
            },
            AgentRole::Deployer => GenerateResponse {
                text: "Rollout complete: edge bundle v1.4.2 active on 3 gateways, \
                       canary healthy for 15 minutes."
                    .to_string(),
                sources: None,
            },
            AgentRole::Orchestrator | AgentRole::Supervisor => GenerateResponse {
                text: format!("Acknowledged: {}", request.prompt),
                sources: None,
            },
        }
    }
}

impl Default for ScriptedCollaborator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collaborator for ScriptedCollaborator {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CollaboratorError> {
        tokio::time::sleep(self.latency).await;

        if self.failing_roles.read().contains(&request.role) {
            return Err(CollaboratorError::Unavailable(format!(
                "{} backend returned 503",
                request.role
            )));
        }
        if self.malformed_roles.read().contains(&request.role) {
            return Ok(GenerateResponse {
                text: "i am not the json you were promised".to_string(),
                sources: None,
            });
        }
        Ok(self.canned(&request))
    }
}
