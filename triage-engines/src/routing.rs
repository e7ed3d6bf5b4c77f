//! Team resolution.
//!
//! Pure and deterministic: a work item maps to exactly one target team,
//! with tag overrides taking precedence over the category table.

use triage_core::{RoutingConfig, Team, WorkItem};

/// Resolves the target team for a work item.
#[derive(Debug, Clone)]
pub struct TeamResolver {
    config: RoutingConfig,
}

impl TeamResolver {
    /// Create a resolver over an immutable routing table.
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Resolve the team that should handle this item.
    ///
    /// Tag overrides are checked in table order (not item-tag order), so
    /// an item tagged both `sales` and `billing` routes by whichever
    /// override the table lists first.
    pub fn resolve(&self, item: &WorkItem) -> Team {
        for (tag, team) in &self.config.tag_overrides {
            if item.has_tag(tag) {
                return *team;
            }
        }
        self.config.team_for_category(item.category)
    }
}
