//! Memory Service
//!
//! Short-term context pruning plus simulated long-term knowledge retrieval.
//! Retrieval is keyword-substring match over a small fixed base, returned in
//! registration order - no ranking. Pruning is head+tail retention, an
//! approximation of context-window budgeting, not summarization.

use crate::constants::{CONTEXT_PRUNE_TAIL, CONTEXT_PRUNE_THRESHOLD};

use super::types::AgentMessage;

// ============================================================================
// KNOWLEDGE BASE
// ============================================================================

/// (keywords, entry) pairs. An entry is a hit when any keyword appears in
/// the query (case-insensitive).
const KNOWLEDGE_BASE: [(&[&str], &str); 8] = [
    (
        &["vibration", "bearing", "wear"],
        "Prior session: bearing wear shows as a vibration amplitude rise weeks \
         before failure; schedule replacement below 7 mm/s RMS.",
    ),
    (
        &["modbus", "setpoint", "write command"],
        "Plant policy: unsolicited MODBUS write commands to holding registers \
         are treated as hostile and require supervisor sign-off to unblock.",
    ),
    (
        &["ddos", "flood", "packet"],
        "Network runbook: sustained packet loss above 5% with nominal machine \
         temperature indicates an IT-layer flood, not a process fault.",
    ),
    (
        &["thermal", "temperature", "coolant"],
        "Thermal runaway above 75C combined with degraded control latency has \
         historically correlated with setpoint manipulation.",
    ),
    (
        &["deploy", "rollout", "canary"],
        "Deployment standard: edge bundles roll out canary-first with a 15 \
         minute health window before fleet-wide activation.",
    ),
    (
        &["test", "validation", "coverage"],
        "Validation gate: release requires zero failed checks and coverage at \
         or above 85% on the detection rule suite.",
    ),
    (
        &["compliance", "iec", "62443"],
        "Compliance note: IEC 62443 zoning requires the edge segment to drop \
         writes originating outside the engineering VLAN.",
    ),
    (
        &["maintenance", "downtime", "schedule"],
        "Scheduling note: planned maintenance windows are Sunday 02:00-06:00; \
         anomaly-driven stops outside the window need plant-manager approval.",
    ),
];

// ============================================================================
// SERVICE
// ============================================================================

pub struct MemoryService;

impl MemoryService {
    pub fn new() -> Self {
        Self
    }

    /// Long-term retrieval: every entry with a keyword contained in the
    /// query, in registration order.
    pub fn retrieve_context(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        KNOWLEDGE_BASE
            .iter()
            .filter(|(keywords, _)| keywords.iter().any(|k| query.contains(k)))
            .map(|(_, entry)| entry.to_string())
            .collect()
    }

    /// Head+tail retention: once the list exceeds the threshold, keep the
    /// first message (it carries the objective) plus the most recent tail.
    pub fn prune_context(&self, messages: Vec<AgentMessage>) -> Vec<AgentMessage> {
        if messages.len() <= CONTEXT_PRUNE_THRESHOLD {
            return messages;
        }
        let tail_start = messages.len() - CONTEXT_PRUNE_TAIL;
        let mut pruned = Vec::with_capacity(1 + CONTEXT_PRUNE_TAIL);
        pruned.push(messages[0].clone());
        pruned.extend_from_slice(&messages[tail_start..]);
        pruned
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
