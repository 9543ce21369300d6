//! Error taxonomy for the scheduling core.
//!
//! Construction problems surface as [`ScheduleError::Validation`], graph
//! misuse as [`ScheduleError::InvalidLink`] / [`ScheduleError::IncompleteAssignment`],
//! and infeasible machine orderings as [`ScheduleError::CycleDetected`].
//! Solver-level outcomes (timeouts, no solution) are *not* errors; see
//! [`crate::solver::SolveStatus`].

use thiserror::Error;

use crate::graph::StepId;
use crate::models::Machine;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid problem: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid machine link {from} -> {to}: {reason}")]
    InvalidLink {
        from: StepId,
        to: StepId,
        reason: String,
    },

    #[error("unknown step {0}")]
    UnknownStep(StepId),

    #[error("incomplete machine chain on {machine}: {links} of {required} links set")]
    IncompleteAssignment {
        machine: Machine,
        links: usize,
        required: usize,
    },

    #[error("precedence cycle through steps {}", join_steps(.steps))]
    CycleDetected { steps: Vec<StepId> },

    #[error("invalid start times: {0}")]
    InvalidStartTimes(String),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("internal consistency error: {0}")]
    Internal(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown benchmark: {0}")]
    UnknownBenchmark(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScheduleError {
    /// Whether a solver may recover by discarding the candidate ordering.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, ScheduleError::CycleDetected { .. })
    }
}

impl From<ValidationError> for ScheduleError {
    fn from(err: ValidationError) -> Self {
        ScheduleError::Validation(vec![err])
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_steps(steps: &[StepId]) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_cycle_message_lists_steps() {
        let err = ScheduleError::CycleDetected {
            steps: vec![StepId(1), StepId(3)],
        };
        assert_eq!(err.to_string(), "precedence cycle through steps S1 -> S3");
        assert!(err.is_infeasible());
    }

    #[test]
    fn test_validation_message_joins_errors() {
        let err = ScheduleError::Validation(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "a"),
            ValidationError::new(ValidationErrorKind::PositionGap, "b"),
        ]);
        assert_eq!(err.to_string(), "invalid problem: a; b");
        assert!(!err.is_infeasible());
    }
}
