//! Configuration tables.
//!
//! All routing tables and time thresholds are immutable values handed to the
//! engine constructors. Tests substitute alternate tables without touching
//! process-wide state; `Default` carries the production values.

use crate::{Category, Priority, Team};
use serde::{Deserialize, Serialize};

// ============================================================================
// ROUTING
// ============================================================================

/// Team routing table for the resolver.
///
/// Tag overrides are checked in order and take precedence over the
/// category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// (tag, team) overrides, highest precedence first.
    pub tag_overrides: Vec<(String, Team)>,
    /// Category to team mapping.
    pub category_teams: Vec<(Category, Team)>,
    /// Team used when a category is missing from the table.
    pub fallback_team: Team,
}

impl RoutingConfig {
    /// Team override for a tag, if one is configured.
    pub fn team_for_tag(&self, tag: &str) -> Option<Team> {
        self.tag_overrides
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, team)| *team)
    }

    /// Team for a category, falling back to the configured default.
    pub fn team_for_category(&self, category: Category) -> Team {
        self.category_teams
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, team)| *team)
            .unwrap_or(self.fallback_team)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            tag_overrides: vec![
                ("billing".to_string(), Team::Finance),
                ("payment".to_string(), Team::Finance),
                ("api".to_string(), Team::Engineering),
                ("technical".to_string(), Team::Engineering),
                ("sales".to_string(), Team::Sales),
                ("pricing".to_string(), Team::Sales),
            ],
            category_teams: vec![
                (Category::Question, Team::Support),
                (Category::Complaint, Team::Support),
                (Category::Feedback, Team::Support),
                (Category::Request, Team::Sales),
                (Category::BugReport, Team::Engineering),
                (Category::General, Team::Support),
            ],
            fallback_team: Team::Support,
        }
    }
}

// ============================================================================
// CAPACITY
// ============================================================================

/// Per-priority capacity caps for a single agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityConfig {
    pub urgent: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl CapacityConfig {
    /// Cap for one priority.
    pub fn cap(&self, priority: Priority) -> u32 {
        match priority {
            Priority::Urgent => self.urgent,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    /// Sum of all per-priority caps; the hard global overload guard.
    pub fn global_cap(&self) -> u32 {
        self.urgent + self.high + self.medium + self.low
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            urgent: 3,
            high: 5,
            medium: 10,
            low: 15,
        }
    }
}

// ============================================================================
// SLA / STALENESS
// ============================================================================

/// Response-time and staleness thresholds, in hours, keyed by priority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaConfig {
    /// Maximum hours before first response.
    pub sla_urgent: f64,
    pub sla_high: f64,
    pub sla_medium: f64,
    pub sla_low: f64,

    /// Hours without status progress before an item counts as stuck.
    pub stuck_urgent: f64,
    pub stuck_high: f64,
    pub stuck_medium: f64,
    pub stuck_low: f64,

    /// Fraction of the SLA window after which an item is "approaching SLA".
    pub approaching_sla_fraction: f64,
    /// Fraction of the stuck threshold after which an item is "getting stale".
    pub getting_stale_fraction: f64,
}

impl SlaConfig {
    /// SLA window in hours for one priority.
    pub fn sla_hours(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Urgent => self.sla_urgent,
            Priority::High => self.sla_high,
            Priority::Medium => self.sla_medium,
            Priority::Low => self.sla_low,
        }
    }

    /// Stuck threshold in hours for one priority.
    pub fn stuck_hours(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Urgent => self.stuck_urgent,
            Priority::High => self.stuck_high,
            Priority::Medium => self.stuck_medium,
            Priority::Low => self.stuck_low,
        }
    }
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            sla_urgent: 0.5,
            sla_high: 2.0,
            sla_medium: 8.0,
            sla_low: 24.0,
            stuck_urgent: 2.0,
            stuck_high: 8.0,
            stuck_medium: 24.0,
            stuck_low: 72.0,
            approaching_sla_fraction: 0.8,
            getting_stale_fraction: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_override_precedence() {
        let config = RoutingConfig::default();
        assert_eq!(config.team_for_tag("billing"), Some(Team::Finance));
        assert_eq!(config.team_for_tag("api"), Some(Team::Engineering));
        assert_eq!(config.team_for_tag("pricing"), Some(Team::Sales));
        assert_eq!(config.team_for_tag("unrelated"), None);
    }

    #[test]
    fn test_category_table() {
        let config = RoutingConfig::default();
        assert_eq!(config.team_for_category(Category::Question), Team::Support);
        assert_eq!(config.team_for_category(Category::Request), Team::Sales);
        assert_eq!(
            config.team_for_category(Category::BugReport),
            Team::Engineering
        );
    }

    #[test]
    fn test_capacity_caps() {
        let caps = CapacityConfig::default();
        assert_eq!(caps.cap(Priority::Urgent), 3);
        assert_eq!(caps.cap(Priority::High), 5);
        assert_eq!(caps.cap(Priority::Medium), 10);
        assert_eq!(caps.cap(Priority::Low), 15);
        assert_eq!(caps.global_cap(), 33);
    }

    #[test]
    fn test_sla_tables() {
        let sla = SlaConfig::default();
        assert_eq!(sla.sla_hours(Priority::Urgent), 0.5);
        assert_eq!(sla.sla_hours(Priority::Low), 24.0);
        assert_eq!(sla.stuck_hours(Priority::Urgent), 2.0);
        assert_eq!(sla.stuck_hours(Priority::Low), 72.0);
    }
}
