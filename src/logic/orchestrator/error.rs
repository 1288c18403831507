//! Orchestration Error Taxonomy
//!
//! The collaborator boundary is the only fallible layer; playback and
//! classification are infallible by construction. Collaborator failures are
//! caught at the kernel boundary and degrade to user-visible messages - they
//! never leave `process_approval` as an `Err`.

use thiserror::Error;
use uuid::Uuid;

/// Failures at the external AI collaborator boundary
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator call timed out after {0}s")]
    Timeout(u64),

    /// Structured output that did not parse. The caller keeps its previous
    /// valid data instead of replacing it with garbage.
    #[error("malformed collaborator output: {0}")]
    Malformed(String),
}

/// Caller mistakes against the orchestration API
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no active session")]
    NoActiveSession,

    #[error("unknown message id {0}")]
    UnknownMessage(Uuid),

    #[error("message {0} was already decided")]
    AlreadyDecided(Uuid),

    #[error("message {0} does not require approval")]
    NotAwaitingApproval(Uuid),

    #[error("session already deployed - start a new session")]
    SessionComplete,
}
