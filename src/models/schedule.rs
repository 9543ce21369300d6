//! Schedule (reporting) model.
//!
//! A flat, serializable view of a solved step graph: one assignment per
//! operation plus any constraint violations found when checking directly
//! assigned start times. Renderers and summaries consume this instead of
//! walking the graph.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Job, Machine};

/// A complete schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Operation assignments (operation → machine × time).
    pub assignments: Vec<Assignment>,
    /// Constraint violations detected in this schedule.
    pub violations: Vec<Violation>,
}

/// An operation-machine-time assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned operation ID.
    pub operation_id: usize,
    /// Owning job (denormalized for query convenience).
    pub job: Job,
    /// Machine the operation runs on.
    pub machine: Machine,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
}

/// A constraint violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Offending operation ID.
    pub operation_id: usize,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Operation started before its job predecessor finished.
    PrecedenceViolation,
    /// Two operations overlap on one machine.
    CapacityExceeded,
    /// Operation has no start time.
    Unscheduled,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(operation_id: usize, job: Job, machine: Machine, start: f64, end: f64) -> Self {
        Self {
            operation_id,
            job,
            machine,
            start,
            end,
        }
    }

    /// Processing duration (end - start).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl Violation {
    /// Creates a precedence violation.
    pub fn precedence_violation(operation_id: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::PrecedenceViolation,
            operation_id,
            message: message.into(),
            severity: 95,
        }
    }

    /// Creates a machine overlap violation.
    pub fn capacity_exceeded(operation_id: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::CapacityExceeded,
            operation_id,
            message: message.into(),
            severity: 90,
        }
    }

    /// Creates a missing start time violation.
    pub fn unscheduled(operation_id: usize) -> Self {
        Self {
            violation_type: ViolationType::Unscheduled,
            operation_id,
            message: format!("Operation {operation_id} has no start time"),
            severity: 100,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Makespan: latest end time across all assignments.
    pub fn makespan(&self) -> f64 {
        self.assignments.iter().map(|a| a.end).fold(0.0, f64::max)
    }

    /// Finds the assignment for a given operation.
    pub fn assignment_for_operation(&self, operation_id: usize) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|a| a.operation_id == operation_id)
    }

    /// Returns all assignments for a given job.
    pub fn assignments_for_job(&self, job: Job) -> Vec<&Assignment> {
        self.assignments.iter().filter(|a| a.job == job).collect()
    }

    /// Returns the assignments on `machine`, ordered by start time.
    pub fn assignments_for_machine(&self, machine: Machine) -> Vec<&Assignment> {
        let mut on_machine: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.machine == machine)
            .collect();
        on_machine.sort_by(|a, b| a.start.total_cmp(&b.start));
        on_machine
    }

    /// Machine utilization: busy time / horizon.
    ///
    /// Returns `None` if `horizon` is not positive.
    pub fn machine_utilization(&self, machine: Machine, horizon: f64) -> Option<f64> {
        if horizon <= 0.0 {
            return None;
        }
        let busy: f64 = self
            .assignments_for_machine(machine)
            .iter()
            .map(|a| a.duration())
            .sum();
        Some(busy / horizon)
    }

    /// Utilization for every machine that has assignments, over the makespan.
    pub fn all_utilizations(&self) -> BTreeMap<Machine, f64> {
        let horizon = self.makespan();
        if horizon <= 0.0 {
            return BTreeMap::new();
        }

        let mut busy: BTreeMap<Machine, f64> = BTreeMap::new();
        for a in &self.assignments {
            *busy.entry(a.machine).or_insert(0.0) += a.duration();
        }

        busy.into_iter().map(|(m, b)| (m, b / horizon)).collect()
    }

    /// Completion time for a job (latest end of its assignments).
    pub fn job_completion_time(&self, job: Job) -> Option<f64> {
        self.assignments_for_job(job)
            .iter()
            .map(|a| a.end)
            .reduce(f64::max)
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}
