//! Input validation for job-shop problems.
//!
//! Checks structural integrity of jobs, machines and operations before a
//! step graph is built. Detects:
//! - Duplicate IDs
//! - Operations referencing unknown jobs or machines
//! - Repeated or missing positions within a job
//! - Negative, infinite or NaN durations
//!
//! Nothing is corrected silently: every issue is reported.

use crate::models::operation::check_duration;
use crate::models::{Job, Machine, Operation};
use std::collections::{BTreeMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An operation references a job that isn't in the job set.
    UnknownJob,
    /// An operation references a machine that isn't in the machine set.
    UnknownMachine,
    /// Two operations of one job claim the same position.
    DuplicatePosition,
    /// A job's positions are not exactly `0..k`.
    PositionGap,
    /// Duration is negative or not finite.
    InvalidDuration,
    /// A solution refers to an operation id the problem does not have.
    UnknownOperation,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates the input data for a job-shop problem.
///
/// Checks:
/// 1. No duplicate job IDs
/// 2. No duplicate machine IDs
/// 3. No duplicate operation IDs
/// 4. Every operation's job and machine exist
/// 5. Every duration is finite and non-negative
/// 6. Each job's positions are unique and contiguous from 0
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_problem(
    jobs: &[Job],
    machines: &[Machine],
    operations: &[Operation],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut job_ids = HashSet::new();
    for job in jobs {
        if !job_ids.insert(job.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }
    }

    let mut machine_ids = HashSet::new();
    for machine in machines {
        if !machine_ids.insert(machine.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate machine ID: {}", machine.id),
            ));
        }
    }

    let mut op_ids = HashSet::new();
    let mut positions: BTreeMap<Job, Vec<usize>> = BTreeMap::new();

    for op in operations {
        if !op_ids.insert(op.id()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate operation ID: {}", op.id()),
            ));
        }
        if !job_ids.contains(&op.job().id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownJob,
                format!("Operation {} references unknown job {}", op.id(), op.job()),
            ));
        }
        if !machine_ids.contains(&op.machine().id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownMachine,
                format!(
                    "Operation {} references unknown machine {}",
                    op.id(),
                    op.machine()
                ),
            ));
        }
        // Deserialized operations bypass `Operation::new`.
        if let Err(e) = check_duration(op.id(), op.duration()) {
            errors.push(e);
        }
        positions.entry(op.job()).or_default().push(op.position());
    }

    for (job, mut seen) in positions {
        seen.sort_unstable();
        let before = seen.len();
        seen.dedup();
        if seen.len() != before {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicatePosition,
                format!("Job {job} has repeated operation positions"),
            ));
        }
        if let Some(missing) = (0..seen.len()).find(|&i| seen[i] != i) {
            errors.push(ValidationError::new(
                ValidationErrorKind::PositionGap,
                format!("Job {job} has no operation at position {missing}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
