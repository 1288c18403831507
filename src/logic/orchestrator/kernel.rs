//! Agent Orchestration Kernel
//!
//! Finite state machine driving a session RESEARCHING -> PLANNING ->
//! VALIDATING -> DEPLOYED. The only way forward is human approval of the
//! message currently under review; rejection terminates the workflow without
//! advancing state. Every sub-agent call is traced and bounded by a timeout;
//! a collaborator failure degrades to an Orchestrator message and returns
//! control to the human instead of wedging the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::constants;

use super::collaborator::{Collaborator, GenerateRequest, GenerateResponse};
use super::error::{CollaboratorError, OrchestratorError};
use super::memory::MemoryService;
use super::tracer::{AgentTrace, TraceStatus, Tracer};
use super::types::{
    AgentMessage, AgentRole, MessageMetadata, ResearchSession, SessionStatus, TestMetrics,
};

// ============================================================================
// KERNEL
// ============================================================================

pub struct AgentOrchestrator {
    collaborator: Arc<dyn Collaborator>,
    memory: MemoryService,
    tracer: Tracer,
    /// Single active session; the async mutex serializes concurrent
    /// approvals so message appends never interleave mid-transition.
    session: Mutex<Option<ResearchSession>>,
    timeout: Duration,
}

impl AgentOrchestrator {
    pub fn new(collaborator: Arc<dyn Collaborator>) -> Self {
        Self {
            collaborator,
            memory: MemoryService::new(),
            tracer: Tracer::new(),
            session: Mutex::new(None),
            timeout: Duration::from_secs(constants::get_collaborator_timeout_secs()),
        }
    }

    // ------------------------------------------------------------------
    // Public API
    // ------------------------------------------------------------------

    /// Start a fresh session, discarding any prior one. Returns the first
    /// Orchestrator message, which always requires approval.
    pub async fn start_session(&self, objective: &str) -> AgentMessage {
        let mut slot = self.session.lock().await;
        if let Some(old) = slot.take() {
            log::info!("discarding prior session {} ({})", old.id, old.status);
        }

        let memory_hits = self.memory.retrieve_context(objective);
        let mut session = ResearchSession::new(objective, memory_hits.clone());

        let mut content = format!(
            "Objective received: \"{}\". Proposed first step: delegate web \
             research to the Search agent. Approve to begin.",
            objective
        );
        if !memory_hits.is_empty() {
            content.push_str(&format!(
                " Long-term memory surfaced {} relevant note(s).",
                memory_hits.len()
            ));
        }

        let first = self.gate_message(content);
        session.push_message(first.clone());
        log::info!("session {} started in {}", session.id, session.status);
        *slot = Some(session);
        first
    }

    /// Decide the pending approval gate. Approval runs the current stage's
    /// sub-agent and advances the state machine; rejection terminates the
    /// workflow with a single cancellation message and no state change.
    pub async fn process_approval(
        &self,
        message_id: Uuid,
        approved: bool,
    ) -> Result<Vec<AgentMessage>, OrchestratorError> {
        let mut slot = self.session.lock().await;
        let session = slot.as_mut().ok_or(OrchestratorError::NoActiveSession)?;

        let gate = session
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(OrchestratorError::UnknownMessage(message_id))?;
        if !gate.requires_hil {
            return Err(OrchestratorError::NotAwaitingApproval(message_id));
        }
        if gate.approved.is_some() {
            return Err(OrchestratorError::AlreadyDecided(message_id));
        }

        gate.approved = Some(approved);
        let gate_trace = gate.metadata.as_ref().and_then(|m| m.trace_id);
        if let Some(trace_id) = gate_trace {
            let verdict = if approved { "approved" } else { "rejected" };
            self.tracer.end_span(trace_id, verdict, TraceStatus::Success);
        }

        if !approved {
            let cancel = AgentMessage::new(
                AgentRole::Orchestrator,
                format!(
                    "Workflow cancelled by supervisor while {}. Start a new \
                     session to pursue a refined objective.",
                    session.status
                ),
            );
            session.push_message(cancel.clone());
            self.finish_appends(session);
            log::info!("session {} cancelled at {}", session.id, session.status);
            return Ok(vec![cancel]);
        }

        let produced = match session.status {
            SessionStatus::Researching => self.run_research(session).await,
            SessionStatus::Planning => self.run_validation(session).await,
            SessionStatus::Validating => self.run_deployment(session).await,
            SessionStatus::Deployed => return Err(OrchestratorError::SessionComplete),
        };
        self.finish_appends(session);
        Ok(produced)
    }

    /// Full trace history, unfiltered, in open order
    pub fn get_traces(&self) -> Vec<AgentTrace> {
        self.tracer.snapshot()
    }

    /// Snapshot of the active session
    pub async fn session(&self) -> Option<ResearchSession> {
        self.session.lock().await.clone()
    }

    /// Drop the active session without starting a new one
    pub async fn reset(&self) {
        *self.session.lock().await = None;
    }

    // ------------------------------------------------------------------
    // Stage transitions
    // ------------------------------------------------------------------

    async fn run_research(&self, session: &mut ResearchSession) -> Vec<AgentMessage> {
        let prompt = session.objective.clone();
        let context = session.memory_hits.clone();
        let response = match self
            .invoke(AgentRole::Search, "web_research", &prompt, context)
            .await
        {
            Ok(response) => response,
            Err(err) => return self.degrade(session, "web_research", &err),
        };

        let findings = AgentMessage::new(AgentRole::Search, response.text.clone()).with_metadata(
            MessageMetadata {
                research_urls: response.sources.clone(),
                ..Default::default()
            },
        );
        let plan = self.gate_message(format!(
            "Research complete ({} source(s)). Proposed plan: turn the findings \
             into detection-rule changes and run the validation suite. Approve \
             to proceed.",
            response.sources.as_ref().map(|s| s.len()).unwrap_or(0)
        ));

        session.push_message(findings.clone());
        session.push_message(plan.clone());
        session.status = SessionStatus::Planning;
        log::info!("session {} advanced to {}", session.id, session.status);
        vec![findings, plan]
    }

    async fn run_validation(&self, session: &mut ResearchSession) -> Vec<AgentMessage> {
        let prompt = format!("Validate plan for objective: {}", session.objective);
        let response = match self
            .invoke(AgentRole::Tester, "run_validation_suite", &prompt, vec![])
            .await
        {
            Ok(response) => response,
            Err(err) => return self.degrade(session, "run_validation_suite", &err),
        };

        let metrics = match self.parse_metrics(&response.text) {
            Ok(metrics) => metrics,
            Err(err) => return self.degrade(session, "parse_test_metrics", &err),
        };

        let report = AgentMessage::new(
            AgentRole::Tester,
            format!(
                "Validation run finished: {} passed, {} failed, {:.1}% coverage, \
                 p95 latency {:.1}ms.",
                metrics.passed, metrics.failed, metrics.coverage_percent, metrics.p95_latency_ms
            ),
        )
        .with_metadata(MessageMetadata {
            test_metrics: Some(metrics.clone()),
            ..Default::default()
        });

        // The validation request carries the metrics so the reviewer decides
        // on data, not prose.
        let mut request = self.gate_message(
            "Validation results attached. Approve to deploy the edge bundle.".to_string(),
        );
        if let Some(meta) = request.metadata.as_mut() {
            meta.test_metrics = Some(metrics);
        }

        session.push_message(report.clone());
        session.push_message(request.clone());
        session.status = SessionStatus::Validating;
        log::info!("session {} advanced to {}", session.id, session.status);
        vec![report, request]
    }

    async fn run_deployment(&self, session: &mut ResearchSession) -> Vec<AgentMessage> {
        let prompt = format!("Deploy validated changes for: {}", session.objective);
        let response = match self
            .invoke(AgentRole::Deployer, "deploy_edge_bundle", &prompt, vec![])
            .await
        {
            Ok(response) => response,
            Err(err) => return self.degrade(session, "deploy_edge_bundle", &err),
        };

        // Deployment executes without a further human gate once validation
        // was approved.
        let confirmation = AgentMessage::new(AgentRole::Deployer, response.text.clone())
            .with_metadata(MessageMetadata {
                deployment_version: extract_version(&response.text),
                ..Default::default()
            });

        session.push_message(confirmation.clone());
        session.status = SessionStatus::Deployed;
        log::info!("session {} deployed", session.id);
        vec![confirmation]
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Invoke the collaborator inside a trace span with a timeout
    async fn invoke(
        &self,
        role: AgentRole,
        action: &str,
        prompt: &str,
        context: Vec<String>,
    ) -> Result<GenerateResponse, CollaboratorError> {
        let step = self.tracer.start_span(role, action, prompt);
        let request = GenerateRequest {
            role,
            prompt: prompt.to_string(),
            context,
        };
        let outcome = match tokio::time::timeout(self.timeout, self.collaborator.generate(request))
            .await
        {
            Ok(Ok(response)) => {
                self.tracer
                    .end_span(step, &response.text, TraceStatus::Success);
                Ok(response)
            }
            Ok(Err(err)) => {
                self.tracer
                    .end_span(step, &err.to_string(), TraceStatus::Failure);
                Err(err)
            }
            Err(_) => {
                let err = CollaboratorError::Timeout(self.timeout.as_secs());
                self.tracer
                    .end_span(step, &err.to_string(), TraceStatus::Failure);
                Err(err)
            }
        };
        outcome
    }

    /// Convert a failed step into a degraded Orchestrator message that hands
    /// control back to the human. State does not advance; approving the new
    /// gate retries the stage.
    fn degrade(
        &self,
        session: &mut ResearchSession,
        action: &str,
        err: &CollaboratorError,
    ) -> Vec<AgentMessage> {
        log::warn!(
            "session {}: step '{}' failed: {}",
            session.id,
            action,
            err
        );
        if matches!(err, CollaboratorError::Malformed(_)) {
            // Parse failures get their own FAILURE span; the call itself
            // completed.
            let step = self.tracer.start_span(AgentRole::Orchestrator, action, "");
            self.tracer
                .end_span(step, &err.to_string(), TraceStatus::Failure);
        }
        let notice = self.gate_message(format!(
            "Step '{}' failed ({}). The workflow is paused at {}; approve to \
             retry or reject to cancel.",
            action, err, session.status
        ));
        session.push_message(notice.clone());
        vec![notice]
    }

    /// Build an Orchestrator message requiring approval, with an open
    /// PENDING_HIL span tied to it through the metadata trace id.
    fn gate_message(&self, content: String) -> AgentMessage {
        let trace_id = self
            .tracer
            .start_span(AgentRole::Orchestrator, "await_approval", &content);
        AgentMessage::new(AgentRole::Orchestrator, content)
            .requiring_approval()
            .with_metadata(MessageMetadata {
                trace_id: Some(trace_id),
                ..Default::default()
            })
    }

    fn parse_metrics(&self, text: &str) -> Result<TestMetrics, CollaboratorError> {
        serde_json::from_str(text).map_err(|e| CollaboratorError::Malformed(e.to_string()))
    }

    /// Prune the message list after appends
    fn finish_appends(&self, session: &mut ResearchSession) {
        let messages = std::mem::take(&mut session.messages);
        session.messages = self.memory.prune_context(messages);
    }
}

/// First whitespace token shaped like a version ("v1.4.2"), if any
fn extract_version(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|t| t.trim_end_matches([',', '.', ';']))
        .find(|t| {
            t.len() > 1
                && t.starts_with('v')
                && t[1..].chars().all(|c| c.is_ascii_digit() || c == '.')
                && t.contains('.')
        })
        .map(|t| t.to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::orchestrator::collaborator::ScriptedCollaborator;

    fn kernel() -> (AgentOrchestrator, Arc<ScriptedCollaborator>) {
        let collaborator = Arc::new(ScriptedCollaborator::new());
        (AgentOrchestrator::new(collaborator.clone()), collaborator)
    }

    async fn approve_pending(kernel: &AgentOrchestrator) -> Vec<AgentMessage> {
        let gate = kernel
            .session()
            .await
            .expect("active session")
            .pending_gate()
            .expect("pending gate")
            .id;
        kernel.process_approval(gate, true).await.unwrap()
    }

    #[tokio::test]
    async fn test_three_approvals_walk_the_states_in_order() {
        let (kernel, _) = kernel();
        kernel.start_session("harden modbus setpoint handling").await;

        let mut visited = vec![kernel.session().await.unwrap().status];
        for _ in 0..3 {
            approve_pending(&kernel).await;
            visited.push(kernel.session().await.unwrap().status);
        }

        assert_eq!(
            visited,
            vec![
                SessionStatus::Researching,
                SessionStatus::Planning,
                SessionStatus::Validating,
                SessionStatus::Deployed,
            ]
        );
    }

    #[tokio::test]
    async fn test_deployment_message_needs_no_further_approval() {
        let (kernel, _) = kernel();
        kernel.start_session("ship the detection update").await;
        approve_pending(&kernel).await;
        approve_pending(&kernel).await;
        let produced = approve_pending(&kernel).await;

        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].role, AgentRole::Deployer);
        assert!(!produced[0].requires_hil);
        assert_eq!(
            produced[0]
                .metadata
                .as_ref()
                .unwrap()
                .deployment_version
                .as_deref(),
            Some("v1.4.2")
        );
        assert!(kernel.session().await.unwrap().pending_gate().is_none());
    }

    #[tokio::test]
    async fn test_rejection_short_circuits_without_state_change() {
        let (kernel, _) = kernel();
        let first = kernel.start_session("investigate vibration trend").await;

        let produced = kernel.process_approval(first.id, false).await.unwrap();
        assert_eq!(produced.len(), 1, "exactly one cancellation message");
        assert!(produced[0].content.contains("cancelled"));

        let session = kernel.session().await.unwrap();
        assert_eq!(session.status, SessionStatus::Researching);
        // No refine/retry path: the gate is spent.
        assert!(session.pending_gate().is_none());
    }

    #[tokio::test]
    async fn test_gate_cannot_be_decided_twice() {
        let (kernel, _) = kernel();
        let first = kernel.start_session("objective").await;
        kernel.process_approval(first.id, false).await.unwrap();

        let err = kernel.process_approval(first.id, true).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::AlreadyDecided(_)));
    }

    #[tokio::test]
    async fn test_unknown_message_and_missing_session_errors() {
        let (kernel, _) = kernel();
        let err = kernel.process_approval(Uuid::new_v4(), true).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NoActiveSession));

        kernel.start_session("objective").await;
        let err = kernel.process_approval(Uuid::new_v4(), true).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownMessage(_)));
    }

    #[tokio::test]
    async fn test_collaborator_failure_degrades_and_keeps_state() {
        let (kernel, collaborator) = kernel();
        collaborator.fail_role(AgentRole::Search);
        kernel.start_session("objective").await;

        let produced = approve_pending(&kernel).await;
        assert_eq!(produced.len(), 1);
        assert!(produced[0].content.contains("failed"));
        assert!(produced[0].requires_hil, "control returns to the human");

        let session = kernel.session().await.unwrap();
        assert_eq!(session.status, SessionStatus::Researching);
        assert!(kernel
            .get_traces()
            .iter()
            .any(|t| t.status == TraceStatus::Failure && t.action == "web_research"));

        // The backend recovers; approving the retry gate advances normally.
        collaborator.restore_role(AgentRole::Search);
        approve_pending(&kernel).await;
        assert_eq!(
            kernel.session().await.unwrap().status,
            SessionStatus::Planning
        );
    }

    #[tokio::test]
    async fn test_malformed_metrics_keep_previous_state() {
        let (kernel, collaborator) = kernel();
        collaborator.garble_role(AgentRole::Tester);
        kernel.start_session("objective").await;
        approve_pending(&kernel).await; // -> Planning

        let produced = approve_pending(&kernel).await;
        assert!(produced[0].content.contains("parse_test_metrics"));
        assert_eq!(
            kernel.session().await.unwrap().status,
            SessionStatus::Planning,
            "bad JSON must not corrupt session state"
        );
    }

    #[tokio::test]
    async fn test_validation_request_carries_metrics_metadata() {
        let (kernel, _) = kernel();
        kernel.start_session("objective").await;
        approve_pending(&kernel).await;
        let produced = approve_pending(&kernel).await;

        let request = produced.iter().find(|m| m.requires_hil).unwrap();
        let metrics = request
            .metadata
            .as_ref()
            .unwrap()
            .test_metrics
            .as_ref()
            .unwrap();
        assert_eq!(metrics.passed, 42);
        assert_eq!(metrics.failed, 0);
    }

    #[tokio::test]
    async fn test_starting_a_session_discards_the_prior_one() {
        let (kernel, _) = kernel();
        kernel.start_session("first objective").await;
        approve_pending(&kernel).await;

        kernel.start_session("second objective").await;
        let session = kernel.session().await.unwrap();
        assert_eq!(session.objective, "second objective");
        assert_eq!(session.status, SessionStatus::Researching);
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_hits_are_attached_at_start() {
        let (kernel, _) = kernel();
        kernel
            .start_session("review modbus write policy before rollout")
            .await;
        let session = kernel.session().await.unwrap();
        assert!(!session.memory_hits.is_empty());
        assert!(session.messages[0].content.contains("memory"));
    }

    #[tokio::test]
    async fn test_traces_close_in_open_order() {
        let (kernel, _) = kernel();
        kernel.start_session("objective").await;
        approve_pending(&kernel).await;
        approve_pending(&kernel).await;
        approve_pending(&kernel).await;

        let traces = kernel.get_traces();
        assert!(traces.len() >= 6);
        for pair in traces.windows(2) {
            assert!(pair[0].sequence < pair[1].sequence);
        }
        assert!(traces.iter().all(|t| t.status != TraceStatus::PendingHil));
    }

    #[tokio::test]
    async fn test_token_estimate_grows_with_messages() {
        let (kernel, _) = kernel();
        kernel.start_session("objective").await;
        let before = kernel.session().await.unwrap().token_estimate;
        approve_pending(&kernel).await;
        let after = kernel.session().await.unwrap().token_estimate;
        assert!(after > before);
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(
            extract_version("bundle v1.4.2 active on 3 gateways."),
            Some("v1.4.2".to_string())
        );
        assert_eq!(extract_version("no version here"), None);
    }
}
