//! Work item assignment.
//!
//! Orchestrates resolve -> select -> mutate -> journal for single and batch
//! assignment. The engine holds no state across operations; every mutation
//! goes through the store's per-item CAS, so a racing writer either wins
//! cleanly or re-reads the winner's state.

use crate::load::{AgentSelector, LoadCalculator, LoadSnapshot};
use crate::routing::TeamResolver;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_core::{
    ActivityRecord, AgentId, CapacityConfig, Role, RoutingConfig, Status, Team, TriageError,
    TriageResult, WorkItem, WorkItemId,
};
use triage_storage::{AgentDirectory, WorkItemFilter, WorkItemStore};

/// Bounded retries for CAS losers before giving up with `Conflict`.
const MAX_COMMIT_ATTEMPTS: usize = 8;

// ============================================================================
// ASSIGNMENT ENGINE
// ============================================================================

/// Routing and load-balanced assignment of work items to agents.
pub struct AssignmentEngine {
    store: Arc<dyn WorkItemStore>,
    directory: Arc<dyn AgentDirectory>,
    resolver: TeamResolver,
    selector: AgentSelector,
    calculator: LoadCalculator,
}

impl AssignmentEngine {
    /// Create an engine over the store and directory collaborators with
    /// immutable routing and capacity tables.
    pub fn new(
        store: Arc<dyn WorkItemStore>,
        directory: Arc<dyn AgentDirectory>,
        routing: RoutingConfig,
        capacity: CapacityConfig,
    ) -> Self {
        let calculator = LoadCalculator::new(store.clone());
        let selector = AgentSelector::new(directory.clone(), calculator.clone(), capacity);
        Self {
            store,
            directory,
            resolver: TeamResolver::new(routing),
            selector,
            calculator,
        }
    }

    /// Current load snapshot for one agent.
    pub async fn load(&self, agent_id: AgentId) -> TriageResult<LoadSnapshot> {
        self.calculator.load(agent_id).await
    }

    /// Assign a work item to an agent.
    ///
    /// With an explicit `agent_id` the resolver and selector are bypassed
    /// entirely, capacity checks included: supervisors may deliberately
    /// overload an agent. The target must exist, though.
    ///
    /// Without one, the item is routed to its team and the least-loaded
    /// eligible agent. When no agent is available the item is returned
    /// unmodified and unassigned; the caller decides the follow-up.
    pub async fn assign(
        &self,
        item_id: WorkItemId,
        agent_id: Option<AgentId>,
        actor: Option<AgentId>,
    ) -> TriageResult<WorkItem> {
        match agent_id {
            Some(agent_id) => {
                let agent = self
                    .directory
                    .agent_get(agent_id)
                    .await?
                    .ok_or_else(|| TriageError::agent_not_found(agent_id))?;
                self.assign_manual(item_id, agent.agent_id, actor).await
            }
            None => self.assign_auto(item_id, actor).await,
        }
    }

    /// Reassign a work item to a specific agent (manual override).
    pub async fn reassign(
        &self,
        item_id: WorkItemId,
        new_agent_id: AgentId,
        actor: Option<AgentId>,
    ) -> TriageResult<WorkItem> {
        self.assign(item_id, Some(new_agent_id), actor).await
    }

    /// Auto-assign unassigned NEW items, urgent and oldest first.
    ///
    /// Items are assigned strictly sequentially: each assignment observes
    /// the load changes committed by the ones before it, so one batch never
    /// floods a single agent. Returns the items that ended up assigned.
    pub async fn assign_batch(&self, limit: usize) -> TriageResult<Vec<WorkItem>> {
        let filter = WorkItemFilter::all()
            .only_unassigned()
            .with_status(Status::New)
            .order_by_priority_then_age()
            .with_limit(limit);
        let pending = self.store.work_item_query(&filter).await?;
        let total = pending.len();

        let mut assigned = Vec::new();
        for item in pending {
            let result = self.assign(item.work_item_id, None, None).await?;
            if result.assignee.is_some() {
                assigned.push(result);
            }
        }

        tracing::info!(assigned = assigned.len(), candidates = total, "batch assignment done");
        Ok(assigned)
    }

    /// Assignment overview: backlog size and per-team / per-agent load.
    pub async fn stats(&self) -> TriageResult<AssignmentStats> {
        let backlog = WorkItemFilter::all()
            .only_unassigned()
            .with_status(Status::New);
        let unassigned = self.store.work_item_count(&backlog).await?;

        let mut by_team = Vec::new();
        let mut agent_workloads = Vec::new();
        for team in Team::ALL {
            let mut team_total = 0u64;
            for agent in self.directory.agent_list(Some(team), None).await? {
                let load = self.calculator.load(agent.agent_id).await?;
                team_total += u64::from(load.total);
                if agent.role == Role::Agent {
                    agent_workloads.push(AgentWorkload {
                        agent_id: agent.agent_id,
                        name: agent.name.clone(),
                        team,
                        active_items: load.total,
                    });
                }
            }
            by_team.push((team, team_total));
        }

        Ok(AssignmentStats {
            unassigned,
            by_team,
            agent_workloads,
        })
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    async fn assign_auto(
        &self,
        item_id: WorkItemId,
        actor: Option<AgentId>,
    ) -> TriageResult<WorkItem> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let item = self
                .store
                .work_item_get(item_id)
                .await?
                .ok_or_else(|| TriageError::work_item_not_found(item_id))?;
            // Auto-assign is idempotent: an item someone already owns is
            // left alone. Reassignment is a manual decision.
            if item.assignee.is_some() {
                return Ok(item);
            }

            let team = self.resolver.resolve(&item);
            let Some(agent) = self.selector.select(team, item.priority).await? else {
                tracing::warn!(work_item_id = %item_id, team = %team, "no agent available");
                return Ok(item);
            };

            match self.commit_assignment(item, agent.agent_id, actor, false).await {
                Ok(committed) => {
                    tracing::info!(
                        work_item_id = %item_id,
                        agent_id = %agent.agent_id,
                        team = %team,
                        "work item assigned"
                    );
                    return Ok(committed);
                }
                Err(err) if err.is_conflict() => {
                    // Re-read; if a concurrent assign won the race, adopt
                    // its outcome instead of overwriting it.
                    let current = self
                        .store
                        .work_item_get(item_id)
                        .await?
                        .ok_or_else(|| TriageError::work_item_not_found(item_id))?;
                    if current.assignee.is_some() {
                        tracing::debug!(work_item_id = %item_id, "lost assign race, keeping winner");
                        return Ok(current);
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Err(TriageError::Conflict {
            entity: triage_core::EntityKind::WorkItem,
            id: item_id,
        })
    }

    async fn assign_manual(
        &self,
        item_id: WorkItemId,
        agent_id: AgentId,
        actor: Option<AgentId>,
    ) -> TriageResult<WorkItem> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let item = self
                .store
                .work_item_get(item_id)
                .await?
                .ok_or_else(|| TriageError::work_item_not_found(item_id))?;

            match self.commit_assignment(item, agent_id, actor, true).await {
                Ok(committed) => {
                    tracing::info!(
                        work_item_id = %item_id,
                        agent_id = %agent_id,
                        "work item manually assigned"
                    );
                    return Ok(committed);
                }
                // Manual override always retries: the supervisor's pick wins.
                Err(err) if err.is_conflict() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(TriageError::Conflict {
            entity: triage_core::EntityKind::WorkItem,
            id: item_id,
        })
    }

    /// Apply the assignment mutation and journal it in one transaction.
    async fn commit_assignment(
        &self,
        mut item: WorkItem,
        agent_id: AgentId,
        actor: Option<AgentId>,
        manual: bool,
    ) -> TriageResult<WorkItem> {
        let old_assignee = item.assignee;
        item.assignee = Some(agent_id);
        item.assigned_at = Some(Utc::now());
        if item.status == Status::New {
            item.status = Status::Assigned;
        }

        let record =
            ActivityRecord::assigned(item.work_item_id, actor, old_assignee, agent_id, manual);
        self.store.work_item_commit_with_activity(&item, &record).await
    }
}

// ============================================================================
// STATS
// ============================================================================

/// Per-agent active-item count for the stats report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentWorkload {
    pub agent_id: AgentId,
    pub name: String,
    pub team: Team,
    pub active_items: u32,
}

/// Assignment overview report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStats {
    /// Unassigned NEW items waiting for an agent.
    pub unassigned: u64,
    /// Active items per team (all active roles).
    pub by_team: Vec<(Team, u64)>,
    /// Active items per AGENT-role agent.
    pub agent_workloads: Vec<AgentWorkload>,
}
