//! Dispatching rules and rule engine for priority dispatch.
//!
//! Rules score the *ready* steps of a partial schedule (the next
//! unscheduled operation of every job); the engine combines one or more
//! rules into a single ordering.
//!
//! # Usage
//!
//! ```
//! use u_jobshop::dispatching::{rules, RuleEngine, TieBreaker};
//!
//! // The reference rule: SPT, ties by job id then machine id.
//! let engine = RuleEngine::new()
//!     .with_rule(rules::Spt)
//!     .with_final_tie_breaker(TieBreaker::ById);
//! assert_eq!(engine.rule_names(), vec!["SPT"]);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::{Candidate, DispatchContext};
pub use engine::{EvaluationMode, RuleEngine, TieBreaker};

use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (dispatched first).
pub type RuleScore = f64;

/// A dispatching rule that scores ready steps.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules that prefer large values
/// (LPT, MWKR) return the negated quantity.
///
/// # Reference
/// Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "SPT", "MWKR").
    fn name(&self) -> &'static str;

    /// Scores a candidate in the current dispatch state.
    fn evaluate(&self, candidate: &Candidate, context: &DispatchContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
