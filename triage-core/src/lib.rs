//! TRIAGE Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Work item identifier using UUIDv7 for timestamp-sortable IDs.
pub type WorkItemId = Uuid;

/// Agent identifier.
pub type AgentId = Uuid;

/// Activity record identifier.
pub type ActivityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 identifier (timestamp-sortable).
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;

pub use config::{CapacityConfig, RoutingConfig, SlaConfig};
pub use entities::{ActivityRecord, Agent, Classification, WorkItem};
pub use enums::{Category, Channel, EnumParseError, Priority, Role, Status, Team};
pub use error::{EntityKind, TriageError, TriageResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
    }
}
