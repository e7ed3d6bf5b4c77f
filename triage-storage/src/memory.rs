//! In-memory reference store.
//!
//! `RwLock<HashMap>` maps per entity, in the shape of a row store. The
//! items write lock is held for the whole compare-bump-write window, which
//! gives the per-item isolation the engines' CAS contract needs. Used by
//! tests and by embedders that do not need durability.

use crate::{AgentDirectory, WorkItemFilter, WorkItemStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use triage_core::{
    ActivityRecord, Agent, AgentId, EntityKind, Role, Team, TriageError, TriageResult, WorkItem,
    WorkItemId,
};

/// In-memory implementation of both storage traits.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    items: Arc<RwLock<HashMap<WorkItemId, WorkItem>>>,
    activities: Arc<RwLock<Vec<ActivityRecord>>>,
    agents: Arc<RwLock<HashMap<AgentId, Agent>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.items.write().expect("lock poisoned").clear();
        self.activities.write().expect("lock poisoned").clear();
        self.agents.write().expect("lock poisoned").clear();
    }

    /// Count of stored work items.
    pub fn work_item_count_all(&self) -> usize {
        self.items.read().expect("lock poisoned").len()
    }

    /// Count of journaled activity records.
    pub fn activity_count(&self) -> usize {
        self.activities.read().expect("lock poisoned").len()
    }

    fn poisoned() -> TriageError {
        TriageError::Storage {
            reason: "storage lock poisoned".to_string(),
        }
    }

    /// Validate the CAS precondition and produce the committed copy.
    /// Caller must hold the items write lock.
    fn apply_update(
        items: &mut HashMap<WorkItemId, WorkItem>,
        item: &WorkItem,
    ) -> TriageResult<WorkItem> {
        let stored = items.get(&item.work_item_id).ok_or(TriageError::NotFound {
            entity: EntityKind::WorkItem,
            id: item.work_item_id,
        })?;
        if stored.version != item.version {
            return Err(TriageError::Conflict {
                entity: EntityKind::WorkItem,
                id: item.work_item_id,
            });
        }
        let mut committed = item.clone();
        committed.version += 1;
        items.insert(committed.work_item_id, committed.clone());
        Ok(committed)
    }
}

#[async_trait]
impl WorkItemStore for InMemoryStore {
    async fn work_item_insert(&self, item: &WorkItem) -> TriageResult<()> {
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        items.insert(item.work_item_id, item.clone());
        Ok(())
    }

    async fn work_item_get(&self, id: WorkItemId) -> TriageResult<Option<WorkItem>> {
        let items = self.items.read().map_err(|_| Self::poisoned())?;
        Ok(items.get(&id).cloned())
    }

    async fn work_item_update(&self, item: &WorkItem) -> TriageResult<WorkItem> {
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        Self::apply_update(&mut items, item)
    }

    async fn work_item_commit_with_activity(
        &self,
        item: &WorkItem,
        activity: &ActivityRecord,
    ) -> TriageResult<WorkItem> {
        // Lock order: items, then activities. The CAS check runs before
        // either map is touched, so a failed commit leaves no trace.
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        let mut activities = self.activities.write().map_err(|_| Self::poisoned())?;
        let committed = Self::apply_update(&mut items, item)?;
        activities.push(activity.clone());
        Ok(committed)
    }

    async fn work_item_query(&self, filter: &WorkItemFilter) -> TriageResult<Vec<WorkItem>> {
        let items = self.items.read().map_err(|_| Self::poisoned())?;
        let mut matched: Vec<WorkItem> = items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        filter.apply_order(&mut matched);
        Ok(matched)
    }

    async fn work_item_count(&self, filter: &WorkItemFilter) -> TriageResult<u64> {
        let items = self.items.read().map_err(|_| Self::poisoned())?;
        Ok(items.values().filter(|item| filter.matches(item)).count() as u64)
    }

    async fn activity_list_by_item(
        &self,
        work_item_id: WorkItemId,
    ) -> TriageResult<Vec<ActivityRecord>> {
        let activities = self.activities.read().map_err(|_| Self::poisoned())?;
        Ok(activities
            .iter()
            .filter(|record| record.work_item_id == work_item_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AgentDirectory for InMemoryStore {
    async fn agent_insert(&self, agent: &Agent) -> TriageResult<()> {
        let mut agents = self.agents.write().map_err(|_| Self::poisoned())?;
        agents.insert(agent.agent_id, agent.clone());
        Ok(())
    }

    async fn agent_get(&self, id: AgentId) -> TriageResult<Option<Agent>> {
        let agents = self.agents.read().map_err(|_| Self::poisoned())?;
        Ok(agents.get(&id).cloned())
    }

    async fn agent_list(
        &self,
        team: Option<Team>,
        role: Option<Role>,
    ) -> TriageResult<Vec<Agent>> {
        let agents = self.agents.read().map_err(|_| Self::poisoned())?;
        let mut matched: Vec<Agent> = agents
            .values()
            .filter(|agent| agent.active)
            .filter(|agent| team.is_none_or(|t| agent.team == t))
            .filter(|agent| role.is_none_or(|r| agent.role == r))
            .cloned()
            .collect();
        matched.sort_by_key(|agent| agent.agent_id);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{Channel, Priority, Status};

    fn store() -> InMemoryStore {
        InMemoryStore::new()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = store();
        let item = WorkItem::new(Channel::Email, "s", "b");
        store.work_item_insert(&item).await.unwrap();
        let fetched = store.work_item_get(item.work_item_id).await.unwrap();
        assert_eq!(fetched, Some(item));
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = store();
        let mut item = WorkItem::new(Channel::Email, "s", "b");
        store.work_item_insert(&item).await.unwrap();

        item.status = Status::InProgress;
        let committed = store.work_item_update(&item).await.unwrap();
        assert_eq!(committed.version, 1);
        assert_eq!(committed.status, Status::InProgress);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let store = store();
        let item = WorkItem::new(Channel::Email, "s", "b");
        store.work_item_insert(&item).await.unwrap();

        // First writer wins.
        let mut first = item.clone();
        first.priority = Priority::High;
        store.work_item_update(&first).await.unwrap();

        // Second writer still holds version 0.
        let mut second = item.clone();
        second.priority = Priority::Urgent;
        let err = store.work_item_update(&second).await.unwrap_err();
        assert!(err.is_conflict());

        // The winner's write survives.
        let stored = store
            .work_item_get(item.work_item_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_no_activity() {
        let store = store();
        let item = WorkItem::new(Channel::Email, "s", "b");
        store.work_item_insert(&item).await.unwrap();

        let mut stale = item.clone();
        stale.version = 99;
        let record = ActivityRecord::status_changed(
            stale.work_item_id,
            None,
            Status::New,
            Status::Assigned,
        );
        let err = store
            .work_item_commit_with_activity(&stale, &record)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.activity_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_with_activity_journals_exactly_once() {
        let store = store();
        let mut item = WorkItem::new(Channel::Email, "s", "b");
        store.work_item_insert(&item).await.unwrap();

        item.status = Status::Assigned;
        let record = ActivityRecord::status_changed(
            item.work_item_id,
            None,
            Status::New,
            Status::Assigned,
        );
        store
            .work_item_commit_with_activity(&item, &record)
            .await
            .unwrap();

        let journal = store.activity_list_by_item(item.work_item_id).await.unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].action, "status_changed");
    }

    #[tokio::test]
    async fn test_agent_list_hides_inactive_and_filters() {
        let store = store();
        let active = Agent::new("a@x.io", "A", Role::Agent, Team::Support);
        let admin = Agent::new("b@x.io", "B", Role::Admin, Team::Support);
        let inactive = Agent::new("c@x.io", "C", Role::Agent, Team::Support).deactivated();
        for agent in [&active, &admin, &inactive] {
            store.agent_insert(agent).await.unwrap();
        }

        let agents = store
            .agent_list(Some(Team::Support), Some(Role::Agent))
            .await
            .unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].agent_id, active.agent_id);

        let admins = store.agent_list(None, Some(Role::Admin)).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].agent_id, admin.agent_id);
    }

    #[tokio::test]
    async fn test_query_respects_filter_and_order() {
        let store = store();
        let mut low = WorkItem::new(Channel::Email, "low", "b").with_priority(Priority::Low);
        low.received_at -= chrono::Duration::hours(10);
        let mut urgent_old =
            WorkItem::new(Channel::Email, "u1", "b").with_priority(Priority::Urgent);
        urgent_old.received_at -= chrono::Duration::hours(5);
        let urgent_new = WorkItem::new(Channel::Email, "u2", "b").with_priority(Priority::Urgent);

        for item in [&low, &urgent_old, &urgent_new] {
            store.work_item_insert(item).await.unwrap();
        }

        let filter = WorkItemFilter::all().order_by_priority_then_age();
        let results = store.work_item_query(&filter).await.unwrap();
        let subjects: Vec<&str> = results.iter().map(|i| i.subject.as_str()).collect();
        assert_eq!(subjects, vec!["u1", "u2", "low"]);
    }
}
