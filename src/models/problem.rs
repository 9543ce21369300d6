//! Job-shop problem: operations plus derived job/machine indexes.
//!
//! A `Problem` is immutable after construction. Operations are stored in
//! the order given; their index in that list is the stable handle the step
//! graph uses (`StepId`).
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 7 (Job Shops)

use std::collections::BTreeMap;

use super::{Job, Machine, Operation};
use crate::error::{Result, ScheduleError};
use crate::validation::validate_problem;

/// A job-shop scheduling problem.
#[derive(Debug, Clone)]
pub struct Problem {
    name: Option<String>,
    operations: Vec<Operation>,
    jobs: Vec<Job>,
    machines: Vec<Machine>,
    /// Operation indices per job, ordered by position.
    by_job: BTreeMap<Job, Vec<usize>>,
    /// Operation indices per machine, in input order (not a schedule order).
    by_machine: BTreeMap<Machine, Vec<usize>>,
}

impl Problem {
    /// Creates a problem from operations, deriving the job and machine sets.
    ///
    /// # Errors
    /// `ScheduleError::Validation` listing every structural problem found
    /// (duplicate ids, repeated or missing positions, invalid durations).
    pub fn new(operations: Vec<Operation>) -> Result<Self> {
        let mut jobs: Vec<Job> = operations.iter().map(|op| op.job()).collect();
        jobs.sort();
        jobs.dedup();
        let mut machines: Vec<Machine> = operations.iter().map(|op| op.machine()).collect();
        machines.sort();
        machines.dedup();
        Self::with_resources(jobs, machines, operations)
    }

    /// Creates a problem with explicit job and machine sets.
    ///
    /// Jobs or machines without operations are allowed; operations that
    /// reference a job or machine outside the sets are rejected.
    pub fn with_resources(
        mut jobs: Vec<Job>,
        mut machines: Vec<Machine>,
        operations: Vec<Operation>,
    ) -> Result<Self> {
        validate_problem(&jobs, &machines, &operations).map_err(ScheduleError::Validation)?;

        jobs.sort();
        machines.sort();

        let mut by_job: BTreeMap<Job, Vec<usize>> = jobs.iter().map(|&j| (j, Vec::new())).collect();
        let mut by_machine: BTreeMap<Machine, Vec<usize>> =
            machines.iter().map(|&m| (m, Vec::new())).collect();

        for (idx, op) in operations.iter().enumerate() {
            by_job.entry(op.job()).or_default().push(idx);
            by_machine.entry(op.machine()).or_default().push(idx);
        }
        for indices in by_job.values_mut() {
            indices.sort_by_key(|&i| operations[i].position());
        }

        Ok(Self {
            name: None,
            operations,
            jobs,
            machines,
            by_job,
            by_machine,
        })
    }

    /// Sets the problem name (e.g. a benchmark instance name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Problem name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// All operations, in input order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Operation at `index`.
    pub fn operation(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether there are no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Jobs, sorted by id.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Machines, sorted by id.
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Operation indices of `job`, ordered by position.
    pub fn job_operations(&self, job: Job) -> &[usize] {
        self.by_job.get(&job).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Operation indices assigned to `machine` (unordered).
    pub fn machine_operations(&self, machine: Machine) -> &[usize] {
        self.by_machine.get(&machine).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total processing time required on `machine`.
    pub fn machine_load(&self, machine: Machine) -> f64 {
        self.machine_operations(machine)
            .iter()
            .map(|&i| self.operations[i].duration())
            .sum()
    }

    /// Total processing time of `job`.
    pub fn job_length(&self, job: Job) -> f64 {
        self.job_operations(job)
            .iter()
            .map(|&i| self.operations[i].duration())
            .sum()
    }

    /// Trivial makespan lower bound: the larger of the heaviest machine load
    /// and the longest job.
    pub fn lower_bound(&self) -> f64 {
        let machine_bound = self
            .machines
            .iter()
            .map(|&m| self.machine_load(m))
            .fold(0.0, f64::max);
        let job_bound = self
            .jobs
            .iter()
            .map(|&j| self.job_length(j))
            .fold(0.0, f64::max);
        machine_bound.max(job_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ops_from_routes, two_by_two};
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_indexes() {
        let p = two_by_two();
        assert_eq!(p.len(), 4);
        assert_eq!(p.jobs(), &[Job::new(0), Job::new(1)]);
        assert_eq!(p.machines(), &[Machine::new(0), Machine::new(1)]);
        assert_eq!(p.job_operations(Job::new(1)), &[2, 3]);
        let mut m0 = p.machine_operations(Machine::new(0)).to_vec();
        m0.sort();
        assert_eq!(m0, vec![0, 3]);
        assert!(p.job_operations(Job::new(9)).is_empty());
    }

    #[test]
    fn test_job_order_follows_position_not_input_order() {
        let ops = vec![
            Operation::new(0, Job::new(0), Machine::new(1), 1.0, 1).unwrap(),
            Operation::new(1, Job::new(0), Machine::new(0), 1.0, 0).unwrap(),
        ];
        let p = Problem::new(ops).unwrap();
        assert_eq!(p.job_operations(Job::new(0)), &[1, 0]);
    }

    #[test]
    fn test_loads_and_bound() {
        let p = two_by_two();
        assert_eq!(p.machine_load(Machine::new(0)), 6.0);
        assert_eq!(p.machine_load(Machine::new(1)), 4.0);
        assert_eq!(p.job_length(Job::new(0)), 5.0);
        assert_eq!(p.lower_bound(), 6.0);
    }

    #[test]
    fn test_empty_problem() {
        let p = Problem::new(Vec::new()).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.lower_bound(), 0.0);
    }

    #[test]
    fn test_dangling_machine_rejected() {
        let ops = ops_from_routes(&[&[(0, 1.0), (5, 1.0)]]);
        let err = Problem::with_resources(vec![Job::new(0)], vec![Machine::new(0)], ops)
            .unwrap_err();
        match err {
            ScheduleError::Validation(errors) => {
                assert!(errors
                    .iter()
                    .any(|e| e.kind == ValidationErrorKind::UnknownMachine));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_name() {
        let p = two_by_two().with_name("ft06");
        assert_eq!(p.name(), Some("ft06"));
    }
}
