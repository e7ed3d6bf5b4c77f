//! Async storage traits for the TRIAGE engines.
//!
//! The engines hold no state of their own; everything shared lives behind
//! these traits. Implementations must make each call transactional: a call
//! either fully commits or has no effect.

use crate::WorkItemFilter;
use async_trait::async_trait;
use triage_core::{
    ActivityRecord, Agent, AgentId, Role, Team, TriageResult, WorkItem, WorkItemId,
};

/// Persistence contract for work items and their activity journal.
///
/// Updates are atomic per item: an update commits only when the caller's
/// `version` matches the stored row, and bumps the version on commit.
/// A mismatch fails with `TriageError::Conflict` and changes nothing, so
/// the loser of a race can re-read the winner's state instead of
/// overwriting it.
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    /// Insert a new work item.
    async fn work_item_insert(&self, item: &WorkItem) -> TriageResult<()>;

    /// Get a work item by ID.
    async fn work_item_get(&self, id: WorkItemId) -> TriageResult<Option<WorkItem>>;

    /// Update a work item under the version CAS. Returns the stored copy
    /// (with the bumped version) on success.
    async fn work_item_update(&self, item: &WorkItem) -> TriageResult<WorkItem>;

    /// Update a work item and append one activity record in a single
    /// transaction. Either both commit or neither does; this is how the
    /// engines keep the one-mutation/one-record invariant.
    async fn work_item_commit_with_activity(
        &self,
        item: &WorkItem,
        activity: &ActivityRecord,
    ) -> TriageResult<WorkItem>;

    /// Query work items matching a filter, in the filter's order.
    async fn work_item_query(&self, filter: &WorkItemFilter) -> TriageResult<Vec<WorkItem>>;

    /// Count work items matching a filter.
    async fn work_item_count(&self, filter: &WorkItemFilter) -> TriageResult<u64>;

    /// List the activity journal for one work item, oldest first.
    async fn activity_list_by_item(
        &self,
        work_item_id: WorkItemId,
    ) -> TriageResult<Vec<ActivityRecord>>;
}

/// Directory of agents and admins.
///
/// Listing only ever returns active agents; inactive agents are invisible
/// to both engines.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Insert a new agent.
    async fn agent_insert(&self, agent: &Agent) -> TriageResult<()>;

    /// Get an agent by ID (active or not).
    async fn agent_get(&self, id: AgentId) -> TriageResult<Option<Agent>>;

    /// List active agents, optionally narrowed by team and role.
    /// Results are ordered by agent id ascending.
    async fn agent_list(
        &self,
        team: Option<Team>,
        role: Option<Role>,
    ) -> TriageResult<Vec<Agent>>;
}
