//! Rule-engine classification of items into the category catalog.
//!
//! Rules are an ordered cascade of pure evaluators in three tiers; the
//! first rule that yields a single category wins. Every invocation
//! terminates with exactly one category.

pub mod engine;
pub mod rules;

pub use engine::{BatchContext, BatchOutcome, Classifier};
pub use rules::{definition_term, routing_matches, RouteMatch, RuleDecision};
