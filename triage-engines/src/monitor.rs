//! Escalation Monitor Background Task
//!
//! Periodically runs the escalation scan so that service-level violations
//! are caught even when no request traffic touches the affected items:
//!
//! - Urgent items nobody picked up
//! - Items past their first-response window
//! - Items sitting in the same status for too long
//!
//! The task runs until the shutdown signal is received. Each tick goes
//! through [`EscalationEngine::try_scan`], so a cycle that would overlap a
//! still-running scan is skipped rather than stacked.

use crate::escalation::EscalationEngine;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Default seconds between scan cycles.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 900;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the escalation monitor task.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How often to run the escalation scan (default: 15 minutes)
    pub scan_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
        }
    }
}

impl MonitorConfig {
    /// Create MonitorConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `TRIAGE_SCAN_INTERVAL_SECS`: Seconds between scan cycles (default: 900)
    pub fn from_env() -> Self {
        let scan_interval = Duration::from_secs(
            std::env::var("TRIAGE_SCAN_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SCAN_INTERVAL_SECS),
        );
        Self { scan_interval }
    }

    /// Short-interval configuration for development and testing.
    pub fn development() -> Self {
        Self {
            scan_interval: Duration::from_secs(10),
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters tracking monitor activity since startup.
#[derive(Debug, Default)]
pub struct MonitorMetrics {
    /// Scan cycles that actually ran
    pub scan_cycles: AtomicU64,

    /// Total items escalated by scans
    pub escalations: AtomicU64,

    /// Cycles skipped because a scan was still in flight
    pub overlaps_skipped: AtomicU64,

    /// Scans that returned an error
    pub scan_failures: AtomicU64,
}

impl MonitorMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            scan_cycles: self.scan_cycles.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            overlaps_skipped: self.overlaps_skipped.load(Ordering::Relaxed),
            scan_failures: self.scan_failures.load(Ordering::Relaxed),
        }
    }
}

/// Monitor counters at a point in time.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub scan_cycles: u64,
    pub escalations: u64,
    pub overlaps_skipped: u64,
    pub scan_failures: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Background task driving the escalation scan on a fixed interval.
///
/// # Arguments
///
/// * `engine` - Escalation engine executing each scan
/// * `config` - Monitor configuration (scan interval)
/// * `shutdown_rx` - Watch receiver for shutdown signal
///
/// # Returns
///
/// Metrics collected over the task's lifetime
pub async fn escalation_monitor_task(
    engine: Arc<EscalationEngine>,
    config: MonitorConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<MonitorMetrics> {
    let metrics = Arc::new(MonitorMetrics::new());

    let mut scan_interval = interval(config.scan_interval);
    scan_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        scan_interval_secs = config.scan_interval.as_secs(),
        "Escalation monitor started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Escalation monitor shutting down");
                    break;
                }
            }

            _ = scan_interval.tick() => {
                run_scan_cycle(&engine, &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        scan_cycles = snapshot.scan_cycles,
        escalations = snapshot.escalations,
        overlaps_skipped = snapshot.overlaps_skipped,
        scan_failures = snapshot.scan_failures,
        "Escalation monitor stopped"
    );

    metrics
}

/// Perform one monitor cycle.
async fn run_scan_cycle(engine: &EscalationEngine, metrics: &MonitorMetrics) {
    match engine.try_scan(Utc::now()).await {
        Ok(Some(report)) => {
            metrics.scan_cycles.fetch_add(1, Ordering::Relaxed);
            let escalated = report.total_escalated() as u64;
            metrics.escalations.fetch_add(escalated, Ordering::Relaxed);
            if escalated > 0 || !report.failures.is_empty() {
                tracing::info!(
                    urgent_unassigned = report.urgent_unassigned.len(),
                    sla_breach = report.sla_breach.len(),
                    stuck = report.stuck.len(),
                    failures = report.failures.len(),
                    "Escalation scan cycle completed"
                );
            } else {
                tracing::trace!("Escalation scan cycle completed with nothing to escalate");
            }
        }
        Ok(None) => {
            metrics.overlaps_skipped.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            tracing::error!(error = %e, "Escalation scan cycle failed");
            metrics.scan_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{Agent, Channel, Priority, Role, SlaConfig, Team, WorkItem};
    use triage_storage::{AgentDirectory, InMemoryStore, WorkItemStore};

    #[test]
    fn test_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(
            config.scan_interval,
            Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_config_development() {
        let config = MonitorConfig::development();
        assert_eq!(config.scan_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = MonitorMetrics::new();
        metrics.scan_cycles.store(4, Ordering::Relaxed);
        metrics.escalations.store(7, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.scan_cycles, 4);
        assert_eq!(snapshot.escalations, 7);
        assert_eq!(snapshot.overlaps_skipped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_scans_and_escalates_until_shutdown() {
        let store = Arc::new(InMemoryStore::new());
        let admin = Agent::new("admin@x.io", "Admin", Role::Admin, Team::Support);
        store.agent_insert(&admin).await.unwrap();
        // Urgent, unassigned, still NEW: the scan must hand it to the admin.
        let item = WorkItem::new(Channel::Email, "prod down", "all broken")
            .with_priority(Priority::Urgent);
        store.work_item_insert(&item).await.unwrap();

        let engine = Arc::new(EscalationEngine::new(
            store.clone() as Arc<dyn WorkItemStore>,
            store.clone() as Arc<dyn AgentDirectory>,
            SlaConfig::default(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = MonitorConfig {
            scan_interval: Duration::from_secs(60),
        };
        let handle = tokio::spawn(escalation_monitor_task(engine, config, shutdown_rx));

        // First tick fires immediately; let a couple more elapse.
        tokio::time::sleep(Duration::from_secs(150)).await;
        shutdown_tx.send(true).unwrap();
        let metrics = handle.await.unwrap();

        let snapshot = metrics.snapshot();
        assert!(snapshot.scan_cycles >= 2);
        assert_eq!(snapshot.escalations, 1);
        assert_eq!(snapshot.scan_failures, 0);

        let stored = store.work_item_get(item.work_item_id).await.unwrap().unwrap();
        assert_eq!(stored.assignee, Some(admin.agent_id));
    }
}
