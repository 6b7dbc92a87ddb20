// document.rs — The policy document data model.
//
// Documents are stored and exchanged as camelCase JSON; this is a stable
// contract shared with the control plane and the dashboard. Conditions are
// a recursive sum type (`any of`, `all of`, or a bare predicate) carried as
// serde-untagged variants so the JSON stays the natural shape:
//
//   { "any": [ {...}, {...} ] }
//   { "all": [ {...} ] }
//   { "field": "action.type", "operator": "eq", "value": "code.exec" }

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// What a rule (or the policy default) decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Deny,
    RequireApproval,
}

/// Which envelope field a predicate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "action.type")]
    ActionType,
    #[serde(rename = "action.resource")]
    ActionResource,
}

/// How a predicate compares the field to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    StartsWith,
    Contains,
    /// Regex match, gated behind the ReDoS guard; rejected or uncompilable
    /// patterns never match.
    Matches,
    /// Membership in a list, or in a comma-separated string.
    In,
}

/// A predicate value: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateValue {
    One(String),
    Many(Vec<String>),
}

/// One field/operator/value comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: Field,
    pub operator: Operator,
    pub value: PredicateValue,
}

/// A rule condition: OR over predicates, AND over predicates, or a single
/// predicate. Matched exhaustively by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Any { any: Vec<Predicate> },
    All { all: Vec<Predicate> },
    Single(Predicate),
}

/// Optional activation window for a rule. All comparisons are UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// `[start, endExclusive)` hours; `start > end` wraps past midnight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_utc: Option<[u8; 2]>,
    /// UTC day numbers, Sunday = 0. Empty means no day restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
}

/// One ordered rule in a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub effect: Effect,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    /// Hard cutoff after which the rule is inactive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Time-of-day / day-of-week activation window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

impl Rule {
    /// Convenience constructor for an always-active rule.
    pub fn new(id: impl Into<String>, effect: Effect, condition: Condition) -> Self {
        Self {
            id: id.into(),
            effect,
            description: String::new(),
            condition,
            expires_at: None,
            schedule: None,
        }
    }

    /// Whether this rule participates in evaluation at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if let Some(expires_at) = self.expires_at {
            if expires_at < now {
                return false;
            }
        }
        if let Some(schedule) = &self.schedule {
            if let Some([start, end]) = schedule.hours_utc {
                let hour = now.hour() as u8;
                let inside = if start <= end {
                    hour >= start && hour < end
                } else {
                    // Window crosses midnight: [start, 24) ∪ [0, end).
                    hour >= start || hour < end
                };
                if !inside {
                    return false;
                }
            }
            if let Some(days) = &schedule.days_of_week {
                if !days.is_empty() {
                    let today = now.weekday().num_days_from_sunday() as u8;
                    if !days.contains(&today) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// A complete policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    /// Version string with an embedded integer (e.g. "v3"); the store bumps
    /// the integer on every save.
    pub version: String,
    pub default_effect: Effect,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Policy {
    /// The integer embedded in the version string (ascii digits, in order),
    /// or 0 when there are none.
    pub fn version_number(&self) -> u32 {
        extract_version_number(&self.version)
    }
}

/// Collect the ascii digits of a version string into an integer.
pub(crate) fn extract_version_number(version: &str) -> u32 {
    let digits: String = version.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
