//! Serializable dispatcher configuration.
//!
//! ```
//! use u_jobshop::config::DispatchConfig;
//!
//! let config = DispatchConfig::from_json(r#"{ "rules": ["mwkr", "spt"], "verify": false }"#).unwrap();
//! let solver = config.build_solver().unwrap();
//! assert_eq!(solver.rule_engine().rule_names(), vec!["MWKR", "SPT"]);
//! assert!(!solver.verifies());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dispatching::{rules, DispatchingRule, EvaluationMode, RuleEngine, TieBreaker};
use crate::error::{Result, ScheduleError};
use crate::scheduler::PriorityDispatchSolver;
use crate::solver::SolveOptions;

/// Built-in dispatching rules by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Spt,
    Lpt,
    Sjf,
    Ljf,
    Lwkr,
    Mwkr,
    Mwkrp,
    Mopr,
    Est,
    Fifo,
}

impl RuleKind {
    pub const ALL: [RuleKind; 10] = [
        RuleKind::Spt,
        RuleKind::Lpt,
        RuleKind::Sjf,
        RuleKind::Ljf,
        RuleKind::Lwkr,
        RuleKind::Mwkr,
        RuleKind::Mwkrp,
        RuleKind::Mopr,
        RuleKind::Est,
        RuleKind::Fifo,
    ];

    /// Instantiates the rule.
    pub fn rule(self) -> Arc<dyn DispatchingRule> {
        match self {
            RuleKind::Spt => Arc::new(rules::Spt),
            RuleKind::Lpt => Arc::new(rules::Lpt),
            RuleKind::Sjf => Arc::new(rules::Sjf),
            RuleKind::Ljf => Arc::new(rules::Ljf),
            RuleKind::Lwkr => Arc::new(rules::Lwkr),
            RuleKind::Mwkr => Arc::new(rules::Mwkr),
            RuleKind::Mwkrp => Arc::new(rules::Mwkrp),
            RuleKind::Mopr => Arc::new(rules::Mopr),
            RuleKind::Est => Arc::new(rules::Est),
            RuleKind::Fifo => Arc::new(rules::Fifo),
        }
    }

    pub fn name(self) -> &'static str {
        self.rule().name()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScheduleError::Config(format!("unknown dispatching rule: {s}")))
    }
}

impl Serialize for RuleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RuleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration of a [`PriorityDispatchSolver`].
///
/// Every field has a default; the defaults give the reference rule (SPT,
/// ties by job id then machine id) with verification on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Rules in evaluation order.
    pub rules: Vec<RuleKind>,
    /// Per-rule weights for weighted mode; empty means 1.0 each.
    pub weights: Vec<f64>,
    pub mode: EvaluationMode,
    pub tie_breaker: TieBreaker,
    /// Re-run the evaluator on the dispatched schedule.
    pub verify: bool,
    /// Advisory solve time limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            rules: vec![RuleKind::Spt],
            weights: Vec::new(),
            mode: EvaluationMode::Sequential,
            tie_breaker: TieBreaker::ById,
            verify: true,
            time_limit_ms: None,
        }
    }
}

impl DispatchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the rule engine.
    ///
    /// # Errors
    /// `Config` if no rule is given, or if weights are given but their
    /// count differs from the rule count.
    pub fn to_engine(&self) -> Result<RuleEngine> {
        if self.rules.is_empty() {
            return Err(ScheduleError::Config("at least one rule is required".to_string()));
        }
        if !self.weights.is_empty() && self.weights.len() != self.rules.len() {
            return Err(ScheduleError::Config(format!(
                "{} weights for {} rules",
                self.weights.len(),
                self.rules.len()
            )));
        }

        let engine = self
            .rules
            .iter()
            .enumerate()
            .fold(RuleEngine::new(), |engine, (i, kind)| {
                let weight = self.weights.get(i).copied().unwrap_or(1.0);
                engine.with_shared_rule(kind.rule(), weight)
            });
        Ok(engine
            .with_mode(self.mode)
            .with_final_tie_breaker(self.tie_breaker))
    }

    pub fn build_solver(&self) -> Result<PriorityDispatchSolver> {
        Ok(PriorityDispatchSolver::new()
            .with_rule_engine(self.to_engine()?)
            .with_verify(self.verify))
    }

    pub fn solve_options(&self) -> SolveOptions {
        match self.time_limit_ms {
            Some(ms) => SolveOptions::new().with_time_limit(Duration::from_millis(ms)),
            None => SolveOptions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Solver;
    use crate::testing::two_by_two;

    #[test]
    fn test_rule_kind_from_str() {
        assert_eq!("spt".parse::<RuleKind>().unwrap(), RuleKind::Spt);
        assert_eq!(" MwKr ".parse::<RuleKind>().unwrap(), RuleKind::Mwkr);
        for kind in RuleKind::ALL {
            assert_eq!(kind.to_string().parse::<RuleKind>().unwrap(), kind);
        }
        assert!(matches!(
            "edd".parse::<RuleKind>(),
            Err(ScheduleError::Config(msg)) if msg.contains("edd")
        ));
    }

    #[test]
    fn test_default_is_reference_rule() {
        let config = DispatchConfig::from_json("{}").unwrap();
        assert_eq!(config, DispatchConfig::default());

        let result = config
            .build_solver()
            .unwrap()
            .solve(Arc::new(two_by_two()), &config.solve_options());
        assert_eq!(result.makespan(), Some(6.0));
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "rules": ["LWKR", "mopr"],
            "weights": [0.5, 2.0],
            "mode": "weighted",
            "tie_breaker": "next_rule",
            "verify": false,
            "time_limit_ms": 250
        }"#;
        let config = DispatchConfig::from_json(json).unwrap();
        assert_eq!(config.rules, vec![RuleKind::Lwkr, RuleKind::Mopr]);
        assert_eq!(config.mode, EvaluationMode::Weighted);
        assert_eq!(config.tie_breaker, TieBreaker::NextRule);
        assert_eq!(
            config.solve_options().time_limit,
            Some(Duration::from_millis(250))
        );

        let engine = config.to_engine().unwrap();
        assert_eq!(engine.rule_names(), vec!["LWKR", "MOPR"]);
        assert_eq!(engine.mode(), EvaluationMode::Weighted);
    }

    #[test]
    fn test_serialization_uses_rule_names() {
        let config = DispatchConfig {
            rules: vec![RuleKind::Est, RuleKind::Fifo],
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""rules":["EST","FIFO"]"#), "{json}");
        assert_eq!(DispatchConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_est_mwkrp_from_config() {
        let config = DispatchConfig::from_json(r#"{ "rules": ["est", "mwkrp"] }"#).unwrap();
        assert_eq!(config.rules, vec![RuleKind::Est, RuleKind::Mwkrp]);
        let solver = config.build_solver().unwrap();
        assert_eq!(
            solver.rule_engine().rule_names(),
            RuleEngine::est_mwkrp().rule_names()
        );
        let result = solver.solve(Arc::new(two_by_two()), &config.solve_options());
        assert!(result.is_solved());
        assert!(result.makespan().unwrap() >= 6.0);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            DispatchConfig::from_json(r#"{ "rules": ["xyz"] }"#),
            Err(ScheduleError::Json(_))
        ));

        let empty = DispatchConfig {
            rules: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(empty.to_engine(), Err(ScheduleError::Config(_))));

        let mismatched = DispatchConfig {
            weights: vec![1.0, 2.0],
            ..Default::default()
        };
        assert!(matches!(mismatched.to_engine(), Err(ScheduleError::Config(_))));
    }
}
