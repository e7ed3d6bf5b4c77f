//! Core entity structures.
//!
//! Pure data: `WorkItem`, `Agent` and `ActivityRecord` are owned by the
//! persistence collaborator; the engines borrow them for one operation and
//! write back through the store's update contract.

use crate::{
    ActivityId, AgentId, Category, Channel, Priority, Role, Status, Team, Timestamp, WorkItemId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// WORK ITEM
// ============================================================================

/// A customer-submitted work item routed through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub work_item_id: WorkItemId,
    /// Channel the item arrived through.
    pub channel: Channel,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    /// External sender handle (Twitter handle, chat user id, ...).
    pub sender_external_id: Option<String>,

    pub subject: String,
    pub body: String,

    /// Classified type; `General` until classification lands.
    pub category: Category,
    /// Urgency; only escalation moves this upward automatically.
    pub priority: Priority,
    /// Classifier- or human-supplied tags. Tag routing overrides look here.
    pub tags: Vec<String>,

    pub status: Status,
    /// Exactly one assignee at a time, if any.
    pub assignee: Option<AgentId>,

    /// Immutable, set at creation.
    pub received_at: Timestamp,
    pub assigned_at: Option<Timestamp>,
    pub first_response_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,

    /// Hours from received to first response, filled when the response lands.
    pub response_time_hours: Option<f64>,
    /// Hours from received to resolved.
    pub resolution_time_hours: Option<f64>,

    /// Optimistic concurrency counter. The store rejects an update whose
    /// version does not match the stored row, so racing writers cannot
    /// silently overwrite each other.
    pub version: i64,
}

impl WorkItem {
    /// Create a new work item in the `New` status with default
    /// classification (classification may arrive later, asynchronously).
    pub fn new(channel: Channel, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            work_item_id: Uuid::now_v7(),
            channel,
            sender_email: None,
            sender_name: None,
            sender_external_id: None,
            subject: subject.into(),
            body: body.into(),
            category: Category::General,
            priority: Priority::Medium,
            tags: Vec::new(),
            status: Status::New,
            assignee: None,
            received_at: Utc::now(),
            assigned_at: None,
            first_response_at: None,
            resolved_at: None,
            response_time_hours: None,
            resolution_time_hours: None,
            version: 0,
        }
    }

    /// Set sender identity.
    pub fn with_sender(
        mut self,
        email: Option<String>,
        name: Option<String>,
        external_id: Option<String>,
    ) -> Self {
        self.sender_email = email;
        self.sender_name = name;
        self.sender_external_id = external_id;
        self
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Whether the item carries a specific tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Hours elapsed since the item was received.
    pub fn hours_since_received(&self, now: Timestamp) -> f64 {
        (now - self.received_at).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Hours elapsed since the last progress marker: `assigned_at` when
    /// present, `received_at` otherwise.
    pub fn hours_since_progress(&self, now: Timestamp) -> f64 {
        let reference = self.assigned_at.unwrap_or(self.received_at);
        (now - reference).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Record the first response timestamp and derived metric.
    /// Set at most once; later calls are no-ops.
    pub fn mark_first_response(&mut self, now: Timestamp) {
        if self.first_response_at.is_none() {
            self.first_response_at = Some(now);
            self.response_time_hours = Some(self.hours_since_received(now));
        }
    }

    /// Record the resolution timestamp and derived metric.
    /// Set at most once; later calls are no-ops.
    pub fn mark_resolved(&mut self, now: Timestamp) {
        if self.resolved_at.is_none() {
            self.resolved_at = Some(now);
            self.resolution_time_hours = Some(self.hours_since_received(now));
        }
    }
}

// ============================================================================
// AGENT
// ============================================================================

/// A human agent (or admin) in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub email: String,
    pub name: String,
    /// Only `Agent`-role members are assignment targets.
    pub role: Role,
    /// Routing partition.
    pub team: Team,
    /// Inactive agents are invisible to both engines.
    pub active: bool,
    pub created_at: Timestamp,
}

impl Agent {
    /// Create a new active agent.
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role, team: Team) -> Self {
        Self {
            agent_id: Uuid::now_v7(),
            email: email.into(),
            name: name.into(),
            role,
            team,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Mark the agent inactive.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Result contract of the external classifier.
///
/// The classifier itself is opaque; the engines only consume this shape and
/// write it back to the item asynchronously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub reasoning: String,
    pub sentiment: Option<String>,
}

// ============================================================================
// ACTIVITY RECORD
// ============================================================================

/// Immutable audit journal entry. Append-only; never mutated or deleted.
///
/// The constructors below are the only record shapes the engines emit, so
/// the `details` payloads stay uniform across the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: ActivityId,
    pub work_item_id: WorkItemId,
    /// The user who triggered the action, when one exists. Scheduled
    /// escalations and classifier write-backs have no actor.
    pub actor_id: Option<AgentId>,
    pub action: String,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

impl ActivityRecord {
    fn new(
        work_item_id: WorkItemId,
        actor_id: Option<AgentId>,
        action: &str,
        details: serde_json::Value,
    ) -> Self {
        Self {
            activity_id: Uuid::now_v7(),
            work_item_id,
            actor_id,
            action: action.to_string(),
            details,
            created_at: Utc::now(),
        }
    }

    /// Journal an assignment (auto or manual).
    pub fn assigned(
        work_item_id: WorkItemId,
        actor_id: Option<AgentId>,
        old_assignee: Option<AgentId>,
        new_assignee: AgentId,
        manual: bool,
    ) -> Self {
        let action = if manual { "manually_assigned" } else { "assigned" };
        Self::new(
            work_item_id,
            actor_id,
            action,
            serde_json::json!({
                "old_assignee_id": old_assignee,
                "new_assignee_id": new_assignee,
                "method": if manual { "manual" } else { "auto" },
            }),
        )
    }

    /// Journal an escalation.
    pub fn escalated(
        work_item_id: WorkItemId,
        reason: &str,
        old_priority: Priority,
        new_priority: Priority,
        old_assignee: Option<AgentId>,
        new_assignee: Option<AgentId>,
    ) -> Self {
        Self::new(
            work_item_id,
            None,
            "escalated",
            serde_json::json!({
                "reason": reason,
                "old_priority": old_priority,
                "new_priority": new_priority,
                "old_assignee_id": old_assignee,
                "new_assignee_id": new_assignee,
            }),
        )
    }

    /// Journal a classifier write-back.
    pub fn classified(work_item_id: WorkItemId, classification: &Classification) -> Self {
        Self::new(
            work_item_id,
            None,
            "classified",
            serde_json::json!({
                "category": classification.category,
                "priority": classification.priority,
                "tags": classification.tags,
                "reasoning": classification.reasoning,
            }),
        )
    }

    /// Journal a status transition.
    pub fn status_changed(
        work_item_id: WorkItemId,
        actor_id: Option<AgentId>,
        old_status: Status,
        new_status: Status,
    ) -> Self {
        Self::new(
            work_item_id,
            actor_id,
            "status_changed",
            serde_json::json!({
                "old_status": old_status,
                "new_status": new_status,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_work_item_defaults() {
        let item = WorkItem::new(Channel::Email, "Login broken", "Cannot log in");
        assert_eq!(item.category, Category::General);
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.status, Status::New);
        assert!(item.assignee.is_none());
        assert_eq!(item.version, 0);
    }

    #[test]
    fn test_hours_since_received() {
        let item = WorkItem::new(Channel::Chat, "s", "b");
        let later = item.received_at + Duration::hours(3);
        assert!((item.hours_since_received(later) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hours_since_progress_prefers_assigned_at() {
        let mut item = WorkItem::new(Channel::Chat, "s", "b");
        let assigned = item.received_at + Duration::hours(2);
        item.assigned_at = Some(assigned);
        let now = assigned + Duration::hours(1);
        assert!((item.hours_since_progress(now) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_response_set_at_most_once() {
        let mut item = WorkItem::new(Channel::Email, "s", "b");
        let first = item.received_at + Duration::hours(1);
        let second = item.received_at + Duration::hours(5);
        item.mark_first_response(first);
        item.mark_first_response(second);
        assert_eq!(item.first_response_at, Some(first));
        assert!((item.response_time_hours.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_has_tag() {
        let item =
            WorkItem::new(Channel::Email, "s", "b").with_tags(vec!["billing".to_string()]);
        assert!(item.has_tag("billing"));
        assert!(!item.has_tag("api"));
    }

    #[test]
    fn test_assignment_record_shape() {
        let item_id = Uuid::now_v7();
        let agent_id = Uuid::now_v7();
        let record = ActivityRecord::assigned(item_id, None, None, agent_id, false);
        assert_eq!(record.action, "assigned");
        assert_eq!(record.details["method"], "auto");

        let manual = ActivityRecord::assigned(item_id, None, Some(agent_id), agent_id, true);
        assert_eq!(manual.action, "manually_assigned");
        assert_eq!(manual.details["method"], "manual");
    }

    #[test]
    fn test_escalation_record_shape() {
        let item_id = Uuid::now_v7();
        let record = ActivityRecord::escalated(
            item_id,
            "sla-breach",
            Priority::High,
            Priority::Urgent,
            None,
            Some(Uuid::now_v7()),
        );
        assert_eq!(record.action, "escalated");
        assert_eq!(record.details["reason"], "sla-breach");
        assert_eq!(record.details["old_priority"], "high");
        assert_eq!(record.details["new_priority"], "urgent");
    }
}
