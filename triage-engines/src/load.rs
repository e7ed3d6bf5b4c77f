//! Agent load accounting and capacity-aware selection.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_core::{Agent, AgentId, CapacityConfig, Priority, Role, Team, TriageResult};
use triage_storage::{AgentDirectory, WorkItemFilter, WorkItemStore};

// ============================================================================
// LOAD SNAPSHOT
// ============================================================================

/// Point-in-time view of one agent's active items, bucketed by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSnapshot {
    pub total: u32,
    pub urgent: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl LoadSnapshot {
    /// Count for one priority bucket.
    pub fn count(&self, priority: Priority) -> u32 {
        match priority {
            Priority::Urgent => self.urgent,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    fn add(&mut self, priority: Priority) {
        self.total += 1;
        match priority {
            Priority::Urgent => self.urgent += 1,
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

// ============================================================================
// LOAD CALCULATOR
// ============================================================================

/// Computes an agent's current load from the store.
///
/// Recomputed fresh on every call, no cache: this feeds capacity decisions,
/// so correctness wins over latency.
#[derive(Clone)]
pub struct LoadCalculator {
    store: Arc<dyn WorkItemStore>,
}

impl LoadCalculator {
    /// Create a calculator over a store.
    pub fn new(store: Arc<dyn WorkItemStore>) -> Self {
        Self { store }
    }

    /// Active-item counts for one agent (status in New/Assigned/InProgress).
    pub async fn load(&self, agent_id: AgentId) -> TriageResult<LoadSnapshot> {
        let filter = WorkItemFilter::active().with_assignee(agent_id);
        let items = self.store.work_item_query(&filter).await?;
        let mut snapshot = LoadSnapshot::default();
        for item in &items {
            snapshot.add(item.priority);
        }
        Ok(snapshot)
    }
}

// ============================================================================
// AGENT SELECTOR
// ============================================================================

/// Capacity-aware least-loaded selection within a team.
#[derive(Clone)]
pub struct AgentSelector {
    directory: Arc<dyn AgentDirectory>,
    calculator: LoadCalculator,
    capacity: CapacityConfig,
}

impl AgentSelector {
    /// Create a selector over a directory, a load calculator and an
    /// immutable capacity table.
    pub fn new(
        directory: Arc<dyn AgentDirectory>,
        calculator: LoadCalculator,
        capacity: CapacityConfig,
    ) -> Self {
        Self {
            directory,
            calculator,
            capacity,
        }
    }

    /// Pick the best agent in a team for an item of the given priority.
    ///
    /// `None` means no agent is available. That is a valid outcome, not an
    /// error; the caller decides how to surface it.
    pub async fn select(&self, team: Team, priority: Priority) -> TriageResult<Option<Agent>> {
        let candidates = self
            .directory
            .agent_list(Some(team), Some(Role::Agent))
            .await?;

        // Load lookup per candidate, dropping anyone past the hard global
        // overload guard.
        let global_cap = self.capacity.global_cap();
        let mut with_load = Vec::with_capacity(candidates.len());
        for agent in candidates {
            let load = self.calculator.load(agent.agent_id).await?;
            if load.total >= global_cap {
                continue;
            }
            with_load.push((agent, load));
        }

        if with_load.is_empty() {
            tracing::warn!(team = %team, "no available agents in team");
            return Ok(None);
        }

        // Least loaded first. The id tie-break is explicit and arbitrary,
        // there purely for determinism, not a quality signal.
        with_load.sort_by(|a, b| {
            a.1.total
                .cmp(&b.1.total)
                .then(a.0.agent_id.cmp(&b.0.agent_id))
        });

        // Prefer agents under the per-priority cap; if everyone is at cap,
        // fall back to the least loaded overall (the global cap above is
        // the only hard limit).
        let cap = self.capacity.cap(priority);
        let pick = with_load
            .iter()
            .find(|(_, load)| load.count(priority) < cap)
            .or_else(|| {
                tracing::warn!(
                    team = %team,
                    priority = %priority,
                    "all agents at per-priority cap, using least loaded"
                );
                with_load.first()
            })
            .map(|(agent, _)| agent.clone());

        Ok(pick)
    }
}
