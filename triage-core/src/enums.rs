//! Enum types for TRIAGE entities.
//!
//! Every closed vocabulary in the data model lives here as a real enum with
//! one canonical ordering. `Priority` in particular derives `Ord` from its
//! declaration order, and that single ordinal drives ladder arithmetic,
//! capacity-table lookups and batch sorting alike.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PRIORITY
// ============================================================================

/// Work item urgency level.
///
/// Declaration order is the priority ladder: `Low < Medium < High < Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// All priorities in ascending ladder order.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// The next rung up the escalation ladder.
    ///
    /// `Urgent` is terminal: escalating it yields `Urgent` again (the
    /// trigger still fires and is journaled, the priority just stops moving).
    pub fn escalated(self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Urgent,
            Priority::Urgent => Priority::Urgent,
        }
    }

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(EnumParseError::new("Priority", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Priority {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// STATUS
// ============================================================================

/// Work item lifecycle status.
///
/// Transitions flow `New -> Assigned -> InProgress -> Resolved -> Closed`;
/// there is no reopen transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    /// Statuses that count as active for load accounting and escalation.
    pub const ACTIVE: [Status; 3] = [Status::New, Status::Assigned, Status::InProgress];

    /// Whether the item is still being worked (not resolved or closed).
    pub fn is_active(&self) -> bool {
        matches!(self, Status::New | Status::Assigned | Status::InProgress)
    }

    /// Whether the item has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Resolved | Status::Closed)
    }

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::Assigned => "assigned",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Closed => "closed",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Status::New),
            "assigned" => Ok(Status::Assigned),
            "in_progress" => Ok(Status::InProgress),
            "resolved" => Ok(Status::Resolved),
            "closed" => Ok(Status::Closed),
            _ => Err(EnumParseError::new("Status", s)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Status {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// CHANNEL
// ============================================================================

/// Source channel a work item arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Chat,
    Twitter,
    Instagram,
    Facebook,
}

impl Channel {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Chat => "chat",
            Channel::Twitter => "twitter",
            Channel::Instagram => "instagram",
            Channel::Facebook => "facebook",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "chat" => Ok(Channel::Chat),
            "twitter" => Ok(Channel::Twitter),
            "instagram" => Ok(Channel::Instagram),
            "facebook" => Ok(Channel::Facebook),
            _ => Err(EnumParseError::new("Channel", s)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Channel {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

/// Classified work item type. Defaults to `General` until the classifier
/// (or a human) says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Question,
    Request,
    Complaint,
    Feedback,
    BugReport,
    General,
}

impl Category {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Category::Question => "question",
            Category::Request => "request",
            Category::Complaint => "complaint",
            Category::Feedback => "feedback",
            Category::BugReport => "bug_report",
            Category::General => "general",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "question" => Ok(Category::Question),
            "request" => Ok(Category::Request),
            "complaint" => Ok(Category::Complaint),
            "feedback" => Ok(Category::Feedback),
            "bug_report" => Ok(Category::BugReport),
            "general" => Ok(Category::General),
            _ => Err(EnumParseError::new("Category", s)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Category {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// TEAM
// ============================================================================

/// Routing partition an agent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Support,
    Engineering,
    Sales,
    Finance,
}

impl Team {
    /// All teams.
    pub const ALL: [Team; 4] = [Team::Support, Team::Engineering, Team::Sales, Team::Finance];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Team::Support => "support",
            Team::Engineering => "engineering",
            Team::Sales => "sales",
            Team::Finance => "finance",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "support" => Ok(Team::Support),
            "engineering" => Ok(Team::Engineering),
            "sales" => Ok(Team::Sales),
            "finance" => Ok(Team::Finance),
            _ => Err(EnumParseError::new("Team", s)),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Team {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// ROLE
// ============================================================================

/// Agent role.
///
/// Only `Agent`-role members are assignment targets; `Admin` is the
/// escalation fallback; `Viewer` is invisible to both engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Agent,
    Viewer,
}

impl Role {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::Viewer => "viewer",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            "viewer" => Ok(Role::Viewer),
            _ => Err(EnumParseError::new("Role", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Role {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Error when parsing an invalid enum string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub enum_name: &'static str,
    pub value: String,
}

impl EnumParseError {
    fn new(enum_name: &'static str, value: &str) -> Self {
        Self {
            enum_name,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} value: {}", self.enum_name, self.value)
    }
}

impl std::error::Error for EnumParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_priority_ladder_order() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Urgent);
    }

    #[test]
    fn test_priority_escalated_one_rung() {
        assert_eq!(Priority::Low.escalated(), Priority::Medium);
        assert_eq!(Priority::Medium.escalated(), Priority::High);
        assert_eq!(Priority::High.escalated(), Priority::Urgent);
        assert_eq!(Priority::Urgent.escalated(), Priority::Urgent);
    }

    #[test]
    fn test_status_active_set() {
        assert!(Status::New.is_active());
        assert!(Status::Assigned.is_active());
        assert!(Status::InProgress.is_active());
        assert!(!Status::Resolved.is_active());
        assert!(!Status::Closed.is_active());
    }

    #[test]
    fn test_priority_roundtrip() {
        for p in Priority::ALL {
            assert_eq!(Priority::from_db_str(p.as_db_str()).unwrap(), p);
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for s in [
            Status::New,
            Status::Assigned,
            Status::InProgress,
            Status::Resolved,
            Status::Closed,
        ] {
            assert_eq!(Status::from_db_str(s.as_db_str()).unwrap(), s);
        }
    }

    #[test]
    fn test_team_and_role_roundtrip() {
        for t in Team::ALL {
            assert_eq!(Team::from_db_str(t.as_db_str()).unwrap(), t);
        }
        for r in [Role::Admin, Role::Agent, Role::Viewer] {
            assert_eq!(Role::from_db_str(r.as_db_str()).unwrap(), r);
        }
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let err = Priority::from_db_str("critical").unwrap_err();
        assert_eq!(err.enum_name, "Priority");
    }

    proptest! {
        #[test]
        fn test_escalated_never_lowers(idx in 0usize..4) {
            let p = Priority::ALL[idx];
            prop_assert!(p.escalated() >= p);
        }
    }
}
