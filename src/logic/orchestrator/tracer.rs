//! Observability Tracer
//!
//! Records one span per agent step: action, input/output snippets, latency,
//! token estimate, status. Spans close in the order they open so downstream
//! consumers can render them chronologically. History is bounded - oldest
//! entries are evicted first.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::TRACE_HISTORY_LIMIT;

use super::types::AgentRole;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceStatus {
    Success,
    Failure,
    /// Step is waiting on a human decision (or still running)
    PendingHil,
}

/// One recorded agent step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTrace {
    pub step_id: Uuid,
    /// Monotonic open order
    pub sequence: u64,
    pub role: AgentRole,
    pub action: String,
    pub input_snippet: String,
    pub output_snippet: String,
    pub latency_ms: f64,
    pub token_estimate: u64,
    pub status: TraceStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// How much of input/output text is kept in a snippet
const SNIPPET_LEN: usize = 160;

fn snippet(text: &str) -> String {
    if text.len() <= SNIPPET_LEN {
        text.to_string()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < SNIPPET_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    }
}

// ============================================================================
// TRACER
// ============================================================================

struct TracerState {
    traces: VecDeque<AgentTrace>,
    open: HashMap<Uuid, Instant>,
    sequence: u64,
}

pub struct Tracer {
    state: Mutex<TracerState>,
}

impl Tracer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TracerState {
                traces: VecDeque::new(),
                open: HashMap::new(),
                sequence: 0,
            }),
        }
    }

    /// Open a span. The entry is recorded immediately with PendingHil status
    /// and finalized by `end_span`.
    pub fn start_span(&self, role: AgentRole, action: &str, input: &str) -> Uuid {
        let step_id = Uuid::new_v4();
        let mut state = self.state.lock();
        state.sequence += 1;
        let sequence = state.sequence;
        state.open.insert(step_id, Instant::now());
        state.traces.push_back(AgentTrace {
            step_id,
            sequence,
            role,
            action: action.to_string(),
            input_snippet: snippet(input),
            output_snippet: String::new(),
            latency_ms: 0.0,
            token_estimate: 0,
            status: TraceStatus::PendingHil,
            started_at: Utc::now(),
            completed_at: None,
        });
        while state.traces.len() > TRACE_HISTORY_LIMIT {
            state.traces.pop_front();
        }
        step_id
    }

    /// Finalize a span. Unknown ids (already evicted) are a no-op.
    pub fn end_span(&self, step_id: Uuid, output: &str, status: TraceStatus) {
        let mut state = self.state.lock();
        let elapsed = state
            .open
            .remove(&step_id)
            .map(|started| started.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        if let Some(trace) = state.traces.iter_mut().find(|t| t.step_id == step_id) {
            trace.output_snippet = snippet(output);
            trace.latency_ms = elapsed;
            trace.token_estimate = (trace.input_snippet.len() + output.len()) as u64 / 4;
            trace.status = status;
            trace.completed_at = Some(Utc::now());
        }
    }

    /// Full history, open order
    pub fn snapshot(&self) -> Vec<AgentTrace> {
        self.state.lock().traces.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_keep_open_order() {
        let tracer = Tracer::new();
        let a = tracer.start_span(AgentRole::Search, "web_research", "objective");
        let b = tracer.start_span(AgentRole::Tester, "run_suite", "plan");
        tracer.end_span(a, "findings", TraceStatus::Success);
        tracer.end_span(b, "metrics", TraceStatus::Success);

        let traces = tracer.snapshot();
        assert_eq!(traces.len(), 2);
        assert!(traces[0].sequence < traces[1].sequence);
        assert_eq!(traces[0].action, "web_research");
    }

    #[test]
    fn test_end_span_finalizes_status_and_output() {
        let tracer = Tracer::new();
        let id = tracer.start_span(AgentRole::Deployer, "rollout", "v1.4.2");
        assert_eq!(tracer.snapshot()[0].status, TraceStatus::PendingHil);

        tracer.end_span(id, "canary healthy", TraceStatus::Success);
        let trace = &tracer.snapshot()[0];
        assert_eq!(trace.status, TraceStatus::Success);
        assert_eq!(trace.output_snippet, "canary healthy");
        assert!(trace.completed_at.is_some());
    }

    #[test]
    fn test_history_is_bounded() {
        let tracer = Tracer::new();
        for i in 0..(TRACE_HISTORY_LIMIT + 40) {
            let id = tracer.start_span(AgentRole::Search, "step", &format!("input {i}"));
            tracer.end_span(id, "ok", TraceStatus::Success);
        }
        assert_eq!(tracer.len(), TRACE_HISTORY_LIMIT);
        // Oldest evicted: the first surviving entry is number 41.
        assert_eq!(tracer.snapshot()[0].sequence, 41);
    }

    #[test]
    fn test_long_io_is_snipped() {
        let tracer = Tracer::new();
        let long = "x".repeat(500);
        let id = tracer.start_span(AgentRole::Search, "step", &long);
        tracer.end_span(id, &long, TraceStatus::Success);
        let trace = &tracer.snapshot()[0];
        assert!(trace.input_snippet.len() <= SNIPPET_LEN + 3);
        assert!(trace.input_snippet.ends_with("..."));
    }
}
