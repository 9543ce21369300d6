//! Rule engine for multi-criteria dispatching.
//!
//! Composes multiple dispatching rules with configurable evaluation modes
//! and tie-breaking strategies.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::rules::{Est, Mwkrp, Spt};
use super::{Candidate, DispatchContext, DispatchingRule, RuleScore};

/// How multiple rules are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Apply rules in sequence; use next rule only on ties.
    #[default]
    Sequential,
    /// Compute weighted sum of all rule scores.
    Weighted,
}

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreaker {
    /// Keep candidate order (jobs in id order when built by the dispatcher).
    NextRule,
    /// Job id, then machine id, then operation id.
    #[default]
    ById,
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn DispatchingRule>,
    weight: f64,
}

/// A composable rule engine for candidate prioritization.
///
/// Supports sequential multi-layer evaluation (primary rule → tie-breaker)
/// and weighted combination modes.
///
/// # Example
/// ```
/// use u_jobshop::dispatching::{rules, EvaluationMode, RuleEngine};
///
/// let engine = RuleEngine::new()
///     .with_mode(EvaluationMode::Weighted)
///     .with_weighted_rule(rules::Spt, 0.7)
///     .with_weighted_rule(rules::Mwkr, 0.3);
/// assert_eq!(engine.rule_names(), vec!["SPT", "MWKR"]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<WeightedRule>,
    mode: EvaluationMode,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            mode: EvaluationMode::Sequential,
            tie_breaker: TieBreaker::ById,
            epsilon: 1e-9,
        }
    }

    /// SPT with ties by job id, then machine id.
    pub fn reference() -> Self {
        Self::new().with_rule(Spt)
    }

    /// Earliest start first, then MWKRP; ties by job id, then machine id.
    pub fn est_mwkrp() -> Self {
        Self::new().with_rule(Est).with_rule(Mwkrp)
    }

    /// Adds a primary rule (weight 1.0).
    pub fn with_rule<R: DispatchingRule + 'static>(self, rule: R) -> Self {
        self.with_weighted_rule(rule, 1.0)
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: DispatchingRule + 'static>(
        self,
        rule: R,
        weight: f64,
    ) -> Self {
        self.with_shared_rule(Arc::new(rule), weight)
    }

    /// Adds an already shared rule, as built from configuration.
    pub fn with_shared_rule(mut self, rule: Arc<dyn DispatchingRule>, weight: f64) -> Self {
        self.rules.push(WeightedRule { rule, weight });
        self
    }

    /// Adds a tie-breaking rule (weight 0.0, used only in Sequential mode).
    pub fn with_tie_breaker<R: DispatchingRule + 'static>(self, rule: R) -> Self {
        self.with_weighted_rule(rule, 0.0)
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Names of the configured rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|wr| wr.rule.name()).collect()
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn tie_breaker(&self) -> TieBreaker {
        self.tie_breaker
    }

    /// Sorts candidates by priority (highest priority first).
    ///
    /// Returns indices into the candidate slice. Scores are computed once
    /// per candidate and snapped to a grid of `epsilon`, so scores closer
    /// than that usually compare equal while the comparison stays a total
    /// order. The sort is stable, so with `TieBreaker::NextRule` full ties
    /// keep their input order.
    pub fn sort_indices(&self, candidates: &[Candidate], context: &DispatchContext) -> Vec<usize> {
        let keys: Vec<Vec<f64>> = candidates
            .iter()
            .map(|c| match self.mode {
                EvaluationMode::Sequential => self
                    .rules
                    .iter()
                    .map(|wr| self.quantize(wr.rule.evaluate(c, context)))
                    .collect(),
                EvaluationMode::Weighted => vec![self.quantize(self.weighted_score(c, context))],
            })
            .collect();

        let mut indices: Vec<usize> = (0..candidates.len()).collect();
        indices.sort_by(|&a, &b| {
            keys[a]
                .iter()
                .zip(&keys[b])
                .map(|(x, y)| x.total_cmp(y))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.break_tie(&candidates[a], &candidates[b]))
        });
        indices
    }

    /// Returns the index of the highest-priority candidate.
    pub fn select_best(&self, candidates: &[Candidate], context: &DispatchContext) -> Option<usize> {
        self.sort_indices(candidates, context).first().copied()
    }

    /// Evaluates a single candidate and returns weighted scores from each rule.
    pub fn evaluate(&self, candidate: &Candidate, context: &DispatchContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(candidate, context) * wr.weight)
            .collect()
    }

    fn break_tie(&self, a: &Candidate, b: &Candidate) -> Ordering {
        match self.tie_breaker {
            TieBreaker::NextRule => Ordering::Equal,
            TieBreaker::ById => a
                .job
                .cmp(&b.job)
                .then(a.machine.cmp(&b.machine))
                .then(a.operation_id.cmp(&b.operation_id)),
        }
    }

    fn weighted_score(&self, candidate: &Candidate, context: &DispatchContext) -> f64 {
        self.evaluate(candidate, context).iter().sum()
    }

    fn quantize(&self, score: RuleScore) -> f64 {
        // -0.0 and 0.0 must compare equal under total_cmp
        (score / self.epsilon).round() * self.epsilon + 0.0
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::reference()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::rules;
    use crate::graph::StepId;
    use crate::models::{Job, Machine};

    fn candidate(op: usize, job: usize, machine: usize, duration: f64, remaining: f64) -> Candidate {
        Candidate {
            step: StepId(op),
            operation_id: op,
            job: Job::new(job),
            machine: Machine::new(machine),
            duration,
            earliest_start: 0.0,
            job_ready: 0.0,
            remaining_work: remaining,
            remaining_operations: 1,
            job_work: remaining,
        }
    }

    #[test]
    fn test_spt_ordering() {
        let candidates = vec![
            candidate(0, 0, 0, 5.0, 5.0),
            candidate(1, 1, 1, 1.0, 1.0),
            candidate(2, 2, 2, 3.0, 3.0),
        ];
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::new().with_rule(rules::Spt);

        assert_eq!(engine.sort_indices(&candidates, &ctx), vec![1, 2, 0]);
    }

    #[test]
    fn test_reference_rule_breaks_ties_by_job_then_machine() {
        let candidates = vec![
            candidate(7, 1, 0, 3.0, 3.0),
            candidate(3, 0, 2, 3.0, 3.0),
            candidate(5, 0, 1, 3.0, 3.0),
        ];
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::reference();

        assert_eq!(engine.sort_indices(&candidates, &ctx), vec![2, 1, 0]);
    }

    #[test]
    fn test_sequential_with_tie_breaker() {
        let candidates = vec![
            candidate(0, 0, 0, 2.0, 10.0),
            candidate(1, 1, 1, 2.0, 20.0),
        ];
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::new()
            .with_rule(rules::Spt)
            .with_tie_breaker(rules::Mwkr);

        // SPT ties, MWKR prefers the job with more work left
        assert_eq!(engine.select_best(&candidates, &ctx), Some(1));
    }

    #[test]
    fn test_next_rule_keeps_input_order() {
        let candidates = vec![candidate(4, 3, 0, 1.0, 1.0), candidate(2, 1, 0, 1.0, 1.0)];
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::new()
            .with_rule(rules::Spt)
            .with_final_tie_breaker(TieBreaker::NextRule);

        assert_eq!(engine.sort_indices(&candidates, &ctx), vec![0, 1]);
    }

    #[test]
    fn test_weighted_mode() {
        let candidates = vec![
            candidate(0, 0, 0, 1.0, 50.0),
            candidate(1, 1, 1, 5.0, 10.0),
        ];
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::new()
            .with_mode(EvaluationMode::Weighted)
            .with_weighted_rule(rules::Spt, 0.5)
            .with_weighted_rule(rules::Lwkr, 0.5);

        // A: 0.5*1 + 0.5*50 = 25.5, B: 0.5*5 + 0.5*10 = 7.5
        assert_eq!(engine.select_best(&candidates, &ctx), Some(1));
    }

    #[test]
    fn test_near_equal_scores_sort_consistently() {
        // neighbours differ by less than epsilon, the ends by far more
        let candidates: Vec<Candidate> = (0..40)
            .rev()
            .map(|i| candidate(i, i, 0, i as f64 * 0.6e-9, 1.0))
            .collect();
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::reference();

        let expected: Vec<usize> = (0..40).rev().collect();
        assert_eq!(engine.sort_indices(&candidates, &ctx), expected);
    }

    #[test]
    fn test_est_mwkrp_preset() {
        let engine = RuleEngine::est_mwkrp();
        assert_eq!(engine.rule_names(), vec!["EST", "MWKRP"]);

        let mut late = candidate(0, 0, 0, 1.0, 50.0);
        late.earliest_start = 4.0;
        let mut early_long = candidate(1, 1, 1, 6.0, 24.0);
        early_long.earliest_start = 2.0;
        let mut early_short = candidate(2, 2, 2, 2.0, 20.0);
        early_short.earliest_start = 2.0;
        let ctx = DispatchContext::at_iteration(0);

        // EST first; among the two ready at 2, MWKRP picks 20 - 3 over 24 - 9
        assert_eq!(
            engine.sort_indices(&[late, early_long, early_short], &ctx),
            vec![2, 1, 0]
        );
    }

    #[test]
    fn test_empty_candidates() {
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::reference();
        assert!(engine.sort_indices(&[], &ctx).is_empty());
        assert!(engine.select_best(&[], &ctx).is_none());
    }

    #[test]
    fn test_evaluate_scores() {
        let c = candidate(0, 0, 0, 3.0, 8.0);
        let ctx = DispatchContext::at_iteration(0);
        let engine = RuleEngine::new()
            .with_rule(rules::Spt)
            .with_rule(rules::Lwkr);

        let scores = engine.evaluate(&c, &ctx);
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 3.0).abs() < 1e-10);
        assert!((scores[1] - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_debug_lists_rules() {
        let engine = RuleEngine::reference().with_tie_breaker(rules::Fifo);
        let text = format!("{engine:?}");
        assert!(text.contains("SPT(w=1)"));
        assert!(text.contains("FIFO(w=0)"));
    }
}
