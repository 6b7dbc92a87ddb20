//! # sc-policy
//!
//! Policy documents, versioned storage, and rule evaluation for SafeClaw.
//!
//! A [`Policy`] is an ordered sequence of rules evaluated first-match-wins
//! against one action envelope, with a default effect when nothing matches.
//! Rules can expire and can be limited to UTC hour windows or weekdays.
//! The [`PolicyStore`] persists the live document and keeps every prior
//! version as a `.vN` sibling, so a bad edit is always one rollback away.
//!
//! ## Quick Example
//!
//! ```rust
//! use sc_policy::{evaluate, Condition, Effect, Field, Operator, Policy, Predicate, PredicateValue, Rule};
//!
//! let policy = Policy {
//!     id: "pol-1".into(),
//!     name: "default".into(),
//!     version: "v1".into(),
//!     default_effect: Effect::RequireApproval,
//!     rules: vec![Rule::new(
//!         "deny-exec",
//!         Effect::Deny,
//!         Condition::Single(Predicate {
//!             field: Field::ActionType,
//!             operator: Operator::Eq,
//!             value: PredicateValue::One("code.exec".into()),
//!         }),
//!     )],
//! };
//!
//! let result = evaluate(Some(&policy), "code.exec", "rm -rf /");
//! assert_eq!(result.effect, Effect::Deny);
//! ```

pub mod document;
pub mod error;
pub mod evaluator;
pub mod store;

pub use document::{Condition, Effect, Field, Operator, Policy, Predicate, PredicateValue, Rule, Schedule};
pub use error::PolicyError;
pub use evaluator::{evaluate, evaluate_at, Evaluation};
pub use store::{PolicyStore, VersionSummary};
