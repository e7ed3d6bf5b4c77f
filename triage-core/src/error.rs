//! Error types for TRIAGE operations.
//!
//! Note what is NOT here: "no agent has capacity" is a normal terminal
//! outcome of selection, expressed as `Option::None` and an unchanged item,
//! never as an error.

use thiserror::Error;
use uuid::Uuid;

/// Entity discriminator for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    WorkItem,
    Agent,
    Activity,
}

/// Errors surfaced by the engines and the storage layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriageError {
    /// Item or agent identity does not exist. Surfaced directly; no retry.
    #[error("Entity not found: {entity:?} with id {id}")]
    NotFound { entity: EntityKind, id: Uuid },

    /// Explicit escalation target does not exist. Rejected before any
    /// mutation; the item is left untouched.
    #[error("Escalation target does not exist: {id}")]
    InvalidTarget { id: Uuid },

    /// Escalation needed a fallback assignee and no active admin exists.
    /// Fatal for that single item only; a scan isolates this and continues.
    #[error("No active admin available for escalation")]
    NoAdminAvailable,

    /// Optimistic-lock loser: the stored version moved under the writer.
    /// Engines re-read and either retry or adopt the winner's state.
    #[error("Concurrent update conflict on {entity:?} with id {id}")]
    Conflict { entity: EntityKind, id: Uuid },

    /// Storage layer failure.
    #[error("Storage failure: {reason}")]
    Storage { reason: String },
}

impl TriageError {
    /// Shorthand for a missing work item.
    pub fn work_item_not_found(id: Uuid) -> Self {
        TriageError::NotFound {
            entity: EntityKind::WorkItem,
            id,
        }
    }

    /// Shorthand for a missing agent.
    pub fn agent_not_found(id: Uuid) -> Self {
        TriageError::NotFound {
            entity: EntityKind::Agent,
            id,
        }
    }

    /// Whether this error is the optimistic-lock conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, TriageError::Conflict { .. })
    }
}

/// Result type alias for TRIAGE operations.
pub type TriageResult<T> = Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let id = Uuid::now_v7();
        let err = TriageError::work_item_not_found(id);
        let msg = err.to_string();
        assert!(msg.contains("WorkItem"));
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn test_conflict_detection() {
        let err = TriageError::Conflict {
            entity: EntityKind::WorkItem,
            id: Uuid::now_v7(),
        };
        assert!(err.is_conflict());
        assert!(!TriageError::NoAdminAvailable.is_conflict());
    }
}
