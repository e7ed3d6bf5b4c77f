//! SLA-driven escalation.
//!
//! A state machine over the priority ladder Low -> Medium -> High -> Urgent.
//! Pure predicates decide breach and staleness given an explicit `now`; the
//! engine bumps priorities, resolves fallback assignees and journals every
//! move. Scans are single-flighted so overlapping scheduled runs collapse
//! into one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use triage_core::{
    ActivityRecord, AgentId, Priority, Role, SlaConfig, Status, Timestamp, TriageError,
    TriageResult, WorkItem, WorkItemId,
};
use triage_storage::{AgentDirectory, WorkItemFilter, WorkItemStore};

/// Bounded retries for CAS losers before giving up with `Conflict`.
const MAX_COMMIT_ATTEMPTS: usize = 8;

/// Escalation trigger reasons, as journaled.
pub const REASON_UNASSIGNED_URGENT: &str = "unassigned-urgent";
pub const REASON_SLA_BREACH: &str = "sla-breach";
pub const REASON_STUCK: &str = "stuck";

// ============================================================================
// PREDICATES
// ============================================================================

/// Whether the item has breached its first-response SLA at `now`.
pub fn is_sla_breach(item: &WorkItem, sla: &SlaConfig, now: Timestamp) -> bool {
    item.first_response_at.is_none()
        && item.hours_since_received(now) > sla.sla_hours(item.priority)
}

/// Whether the item has sat without status progress past its threshold.
/// Progress is measured from `assigned_at` when present, `received_at`
/// otherwise.
pub fn is_stuck(item: &WorkItem, sla: &SlaConfig, now: Timestamp) -> bool {
    !item.status.is_terminal() && item.hours_since_progress(now) > sla.stuck_hours(item.priority)
}

// ============================================================================
// REPORTS
// ============================================================================

/// Outcome of one escalation scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Items escalated because they were urgent, unassigned and still NEW.
    pub urgent_unassigned: Vec<WorkItemId>,
    /// Items escalated for breaching the first-response SLA.
    pub sla_breach: Vec<WorkItemId>,
    /// Items escalated for sitting in the same status too long.
    pub stuck: Vec<WorkItemId>,
    /// Items whose escalation failed; the scan continued past them.
    pub failures: Vec<(WorkItemId, String)>,
}

impl ScanReport {
    /// Total escalations performed in this scan.
    pub fn total_escalated(&self) -> usize {
        self.urgent_unassigned.len() + self.sla_breach.len() + self.stuck.len()
    }
}

/// An item nearing its SLA window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaRisk {
    pub work_item_id: WorkItemId,
    pub subject: String,
    pub priority: Priority,
    pub time_remaining_hours: f64,
}

/// An item approaching its stuck threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleRisk {
    pub work_item_id: WorkItemId,
    pub subject: String,
    pub status: Status,
    pub hours_in_status: f64,
}

/// Read-only early-warning report. Never mutates anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtRiskReport {
    pub approaching_sla: Vec<SlaRisk>,
    pub getting_stale: Vec<StaleRisk>,
}

// ============================================================================
// ESCALATION ENGINE
// ============================================================================

/// Scans active items and escalates the ones violating their guarantees.
pub struct EscalationEngine {
    store: Arc<dyn WorkItemStore>,
    directory: Arc<dyn AgentDirectory>,
    sla: SlaConfig,
    /// Single-flight guard: overlapping scan requests collapse into one.
    pub(crate) scan_guard: Mutex<()>,
}

impl EscalationEngine {
    /// Create an engine over the store and directory with an immutable
    /// threshold table.
    pub fn new(
        store: Arc<dyn WorkItemStore>,
        directory: Arc<dyn AgentDirectory>,
        sla: SlaConfig,
    ) -> Self {
        Self {
            store,
            directory,
            sla,
            scan_guard: Mutex::new(()),
        }
    }

    /// Escalate one work item.
    ///
    /// Bumps the priority one rung (a no-op at Urgent, though the trigger is
    /// still journaled). An explicit `target` must exist and is set
    /// directly; otherwise an existing assignee is kept; otherwise the item
    /// falls back to an active admin.
    pub async fn escalate(
        &self,
        item_id: WorkItemId,
        reason: &str,
        target: Option<AgentId>,
    ) -> TriageResult<WorkItem> {
        // Validate the explicit target before touching anything.
        if let Some(target_id) = target {
            if self.directory.agent_get(target_id).await?.is_none() {
                return Err(TriageError::InvalidTarget { id: target_id });
            }
        }

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let mut item = self
                .store
                .work_item_get(item_id)
                .await?
                .ok_or_else(|| TriageError::work_item_not_found(item_id))?;

            let old_priority = item.priority;
            let old_assignee = item.assignee;

            item.priority = old_priority.escalated();
            item.assignee = match (target, item.assignee) {
                (Some(target_id), _) => Some(target_id),
                (None, Some(current)) => Some(current),
                (None, None) => Some(self.fallback_admin().await?),
            };

            let record = ActivityRecord::escalated(
                item_id,
                reason,
                old_priority,
                item.priority,
                old_assignee,
                item.assignee,
            );

            match self.store.work_item_commit_with_activity(&item, &record).await {
                Ok(committed) => {
                    tracing::info!(
                        work_item_id = %item_id,
                        reason,
                        old_priority = %old_priority,
                        new_priority = %committed.priority,
                        "work item escalated"
                    );
                    return Ok(committed);
                }
                Err(err) if err.is_conflict() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(TriageError::Conflict {
            entity: triage_core::EntityKind::WorkItem,
            id: item_id,
        })
    }

    /// Run one escalation scan at `now`.
    ///
    /// Three independent queries in fixed order: urgent-unassigned, SLA
    /// breaches, stuck items. An item matching several triggers escalates
    /// once per trigger, which can move it more than one rung in a single
    /// pass. A failed escalation is collected and the scan continues.
    pub async fn scan(&self, now: Timestamp) -> TriageResult<ScanReport> {
        let mut report = ScanReport::default();

        // 1. Urgent items nobody picked up.
        let urgent_unassigned = self
            .store
            .work_item_query(
                &WorkItemFilter::all()
                    .with_priority(Priority::Urgent)
                    .only_unassigned()
                    .with_status(Status::New),
            )
            .await?;
        for item in urgent_unassigned {
            self.escalate_for_scan(
                item.work_item_id,
                REASON_UNASSIGNED_URGENT,
                &mut report,
                |r| &mut r.urgent_unassigned,
            )
            .await;
        }

        // 2. First-response SLA breaches.
        let awaiting_response = self
            .store
            .work_item_query(&WorkItemFilter::active().without_first_response())
            .await?;
        for item in awaiting_response {
            if is_sla_breach(&item, &self.sla, now) {
                self.escalate_for_scan(
                    item.work_item_id,
                    REASON_SLA_BREACH,
                    &mut report,
                    |r| &mut r.sla_breach,
                )
                .await;
            }
        }

        // 3. Stuck items, responded-to or not.
        let active = self.store.work_item_query(&WorkItemFilter::active()).await?;
        for item in active {
            if is_stuck(&item, &self.sla, now) {
                self.escalate_for_scan(item.work_item_id, REASON_STUCK, &mut report, |r| {
                    &mut r.stuck
                })
                .await;
            }
        }

        tracing::info!(
            urgent_unassigned = report.urgent_unassigned.len(),
            sla_breach = report.sla_breach.len(),
            stuck = report.stuck.len(),
            failures = report.failures.len(),
            "escalation scan completed"
        );
        Ok(report)
    }

    /// Single-flight wrapper around [`scan`](Self::scan).
    ///
    /// Returns `Ok(None)` when another scan is already in flight.
    pub async fn try_scan(&self, now: Timestamp) -> TriageResult<Option<ScanReport>> {
        let Ok(_guard) = self.scan_guard.try_lock() else {
            tracing::warn!("escalation scan already in flight, skipping");
            return Ok(None);
        };
        self.scan(now).await.map(Some)
    }

    /// Early-warning report over active items with no first response:
    /// items past `approaching_sla_fraction` of their SLA window but not yet
    /// breached, and items past `getting_stale_fraction` of their stuck
    /// threshold. Read-only.
    pub async fn at_risk(&self, now: Timestamp) -> TriageResult<AtRiskReport> {
        let mut report = AtRiskReport::default();
        let items = self
            .store
            .work_item_query(&WorkItemFilter::active().without_first_response())
            .await?;

        for item in items {
            let sla_hours = self.sla.sla_hours(item.priority);
            let elapsed = item.hours_since_received(now);
            if elapsed > sla_hours * self.sla.approaching_sla_fraction && elapsed < sla_hours {
                report.approaching_sla.push(SlaRisk {
                    work_item_id: item.work_item_id,
                    subject: item.subject.clone(),
                    priority: item.priority,
                    time_remaining_hours: sla_hours - elapsed,
                });
            }

            let stuck_hours = self.sla.stuck_hours(item.priority);
            let in_status = item.hours_since_progress(now);
            if in_status > stuck_hours * self.sla.getting_stale_fraction {
                report.getting_stale.push(StaleRisk {
                    work_item_id: item.work_item_id,
                    subject: item.subject.clone(),
                    status: item.status,
                    hours_in_status: in_status,
                });
            }
        }

        Ok(report)
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    /// First active admin in the directory, for the escalation fallback.
    async fn fallback_admin(&self) -> TriageResult<AgentId> {
        let admins = self.directory.agent_list(None, Some(Role::Admin)).await?;
        admins
            .first()
            .map(|admin| admin.agent_id)
            .ok_or(TriageError::NoAdminAvailable)
    }

    /// Escalate one item inside a scan, isolating failures so the scan
    /// keeps going.
    async fn escalate_for_scan(
        &self,
        item_id: WorkItemId,
        reason: &'static str,
        report: &mut ScanReport,
        bucket: impl FnOnce(&mut ScanReport) -> &mut Vec<WorkItemId>,
    ) {
        match self.escalate(item_id, reason, None).await {
            Ok(_) => bucket(report).push(item_id),
            Err(err) => {
                tracing::error!(work_item_id = %item_id, reason, error = %err, "escalation failed");
                report.failures.push((item_id, err.to_string()));
            }
        }
    }
}

/// Convenience for callers that do not inject a clock.
impl EscalationEngine {
    /// [`scan`](Self::scan) at the current wall-clock time.
    pub async fn scan_now(&self) -> TriageResult<ScanReport> {
        self.scan(Utc::now()).await
    }
}
