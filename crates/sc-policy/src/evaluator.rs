// evaluator.rs — First-match-wins rule evaluation.
//
// Given a policy and one envelope, filter the rules down to those active
// right now (expiry + schedule), then scan in order; the first matching
// rule's effect wins. No match falls through to the document's default
// effect; no document at all is a deny.

use chrono::{DateTime, Utc};

use crate::document::{Condition, Effect, Field, Operator, Policy, Predicate, PredicateValue};

/// The outcome of evaluating one envelope against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Id of the matching rule, when one matched.
    pub matched_rule: Option<String>,
    pub effect: Effect,
    pub reason: String,
}

/// Evaluate at the current instant.
pub fn evaluate(policy: Option<&Policy>, action_type: &str, resource: &str) -> Evaluation {
    evaluate_at(policy, action_type, resource, Utc::now())
}

/// Evaluate at an explicit instant (schedule filtering is time-dependent).
pub fn evaluate_at(
    policy: Option<&Policy>,
    action_type: &str,
    resource: &str,
    now: DateTime<Utc>,
) -> Evaluation {
    let Some(policy) = policy else {
        return Evaluation {
            matched_rule: None,
            effect: Effect::Deny,
            reason: "no policy loaded".to_string(),
        };
    };

    for rule in policy.rules.iter().filter(|rule| rule.is_active(now)) {
        if condition_matches(&rule.condition, action_type, resource) {
            let reason = if rule.description.is_empty() {
                format!("rule '{}' matched", rule.id)
            } else {
                rule.description.clone()
            };
            return Evaluation {
                matched_rule: Some(rule.id.clone()),
                effect: rule.effect,
                reason,
            };
        }
    }

    Evaluation {
        matched_rule: None,
        effect: policy.default_effect,
        reason: "no rule matched; default effect applies".to_string(),
    }
}

/// Exhaustive match over the condition sum type.
fn condition_matches(condition: &Condition, action_type: &str, resource: &str) -> bool {
    match condition {
        Condition::Any { any } => any.iter().any(|p| predicate_matches(p, action_type, resource)),
        Condition::All { all } => all.iter().all(|p| predicate_matches(p, action_type, resource)),
        Condition::Single(predicate) => predicate_matches(predicate, action_type, resource),
    }
}

fn predicate_matches(predicate: &Predicate, action_type: &str, resource: &str) -> bool {
    let field = match predicate.field {
        Field::ActionType => action_type,
        Field::ActionResource => resource,
    };

    match predicate.operator {
        Operator::Eq => single(predicate).is_some_and(|v| field == v),
        Operator::StartsWith => single(predicate).is_some_and(|v| field.starts_with(v)),
        Operator::Contains => single(predicate).is_some_and(|v| field.contains(v)),
        Operator::Matches => single(predicate)
            .and_then(sc_redact::compile_safe)
            .is_some_and(|re| re.is_match(field)),
        Operator::In => match &predicate.value {
            PredicateValue::Many(values) => values.iter().any(|v| v == field),
            PredicateValue::One(csv) => csv.split(',').any(|v| v.trim() == field),
        },
    }
}

/// Scalar operators require a scalar value; a list is a non-match.
fn single(predicate: &Predicate) -> Option<&str> {
    match &predicate.value {
        PredicateValue::One(v) => Some(v.as_str()),
        PredicateValue::Many(_) => None,
    }
}
