//! Work item query filters.
//!
//! Every relationship traversal in the engines is an explicit query built
//! from this type, so all I/O is visible at the call site.

use triage_core::{AgentId, Priority, Status, WorkItem};

/// Result ordering for work item queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterOrder {
    /// Oldest first. Ties broken by id ascending.
    #[default]
    ReceivedAsc,
    /// Highest priority first, oldest first within a priority.
    /// The batch-assignment ordering.
    PriorityDescReceivedAsc,
}

/// Conjunctive filter over work items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkItemFilter {
    pub assignee: Option<AgentId>,
    /// Match only items with no assignee.
    pub unassigned: bool,
    pub statuses: Option<Vec<Status>>,
    pub priority: Option<Priority>,
    /// Match only items that have not received a first response.
    pub no_first_response: bool,
    pub order: FilterOrder,
    pub limit: Option<usize>,
}

impl WorkItemFilter {
    /// Empty filter: matches everything, oldest first.
    pub fn all() -> Self {
        Self::default()
    }

    /// Items in an active status (`New`, `Assigned`, `InProgress`).
    pub fn active() -> Self {
        Self::default().with_statuses(Status::ACTIVE.to_vec())
    }

    /// Restrict to one assignee.
    pub fn with_assignee(mut self, agent_id: AgentId) -> Self {
        self.assignee = Some(agent_id);
        self
    }

    /// Restrict to unassigned items.
    pub fn only_unassigned(mut self) -> Self {
        self.unassigned = true;
        self
    }

    /// Restrict to one status.
    pub fn with_status(self, status: Status) -> Self {
        self.with_statuses(vec![status])
    }

    /// Restrict to a status set.
    pub fn with_statuses(mut self, statuses: Vec<Status>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    /// Restrict to one priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restrict to items with no first response yet.
    pub fn without_first_response(mut self) -> Self {
        self.no_first_response = true;
        self
    }

    /// Order by priority descending, then received ascending.
    pub fn order_by_priority_then_age(mut self) -> Self {
        self.order = FilterOrder::PriorityDescReceivedAsc;
        self
    }

    /// Cap the number of returned items.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether one item satisfies every predicate of this filter.
    pub fn matches(&self, item: &WorkItem) -> bool {
        if let Some(assignee) = self.assignee {
            if item.assignee != Some(assignee) {
                return false;
            }
        }
        if self.unassigned && item.assignee.is_some() {
            return false;
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&item.status) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if item.priority != priority {
                return false;
            }
        }
        if self.no_first_response && item.first_response_at.is_some() {
            return false;
        }
        true
    }

    /// Sort and truncate a result set according to this filter.
    /// Ties always break by id ascending so results are deterministic.
    pub fn apply_order(&self, items: &mut Vec<WorkItem>) {
        match self.order {
            FilterOrder::ReceivedAsc => {
                items.sort_by(|a, b| {
                    a.received_at
                        .cmp(&b.received_at)
                        .then(a.work_item_id.cmp(&b.work_item_id))
                });
            }
            FilterOrder::PriorityDescReceivedAsc => {
                items.sort_by(|a, b| {
                    b.priority
                        .cmp(&a.priority)
                        .then(a.received_at.cmp(&b.received_at))
                        .then(a.work_item_id.cmp(&b.work_item_id))
                });
            }
        }
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
    }
}
