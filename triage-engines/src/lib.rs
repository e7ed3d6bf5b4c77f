//! TRIAGE Engines - Routing, Assignment and Escalation
//!
//! The decision core of the system. Each engine is a small, separately
//! testable component over the storage traits:
//!
//! - [`routing`]: item to team resolution (tags override category)
//! - [`load`]: per-agent load accounting and capacity-aware selection
//! - [`assignment`]: auto, manual and batch assignment with race handling
//! - [`escalation`]: priority escalation and the periodic guarantee scan
//! - [`classifier`]: classification contract plus asynchronous write-back
//! - [`monitor`]: background task driving the scan on an interval

pub mod assignment;
pub mod classifier;
pub mod escalation;
pub mod load;
pub mod monitor;
pub mod routing;

pub use assignment::{AgentWorkload, AssignmentEngine, AssignmentStats};
pub use classifier::{classify_and_store, spawn_classification, Classifier, ClassifierError, KeywordClassifier};
pub use escalation::{
    AtRiskReport, EscalationEngine, ScanReport, SlaRisk, StaleRisk, REASON_SLA_BREACH,
    REASON_STUCK, REASON_UNASSIGNED_URGENT,
};
pub use load::{AgentSelector, LoadCalculator, LoadSnapshot};
pub use monitor::{escalation_monitor_task, MonitorConfig, MonitorMetrics, MonitorSnapshot};
pub use routing::TeamResolver;
