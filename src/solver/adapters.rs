//! Adapters for solutions computed elsewhere (e.g. an external engine).
//!
//! Both refer to operations by operation id, not by step index.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use super::{finalize_chains, finalize_start_times, SolutionResult, SolveOptions, Solver};
use crate::error::{Result, ScheduleError};
use crate::graph::{StepGraph, StepId};
use crate::models::{Machine, Problem};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Applies fixed per-machine operation sequences (mode a).
#[derive(Debug, Clone)]
pub struct SequenceSolver {
    name: String,
    sequences: BTreeMap<Machine, Vec<usize>>,
}

impl SequenceSolver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequences: BTreeMap::new(),
        }
    }

    /// Sets the processing order of `machine` as a list of operation ids.
    pub fn with_sequence(mut self, machine: Machine, operation_ids: Vec<usize>) -> Self {
        self.sequences.insert(machine, operation_ids);
        self
    }

    fn apply(&self, graph: &mut StepGraph) -> Result<()> {
        let steps = step_index(graph.problem());
        for (&machine, ids) in &self.sequences {
            let sequence = ids
                .iter()
                .map(|id| lookup(&steps, *id))
                .collect::<Result<Vec<StepId>>>()?;
            graph.set_machine_sequence(machine, &sequence)?;
        }
        Ok(())
    }
}

impl Solver for SequenceSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, problem: Arc<Problem>, options: &SolveOptions) -> SolutionResult {
        let started = Instant::now();
        let mut graph = StepGraph::build(problem);
        let result = match self.apply(&mut graph) {
            Ok(()) => finalize_chains(&self.name, graph, started),
            Err(err) => SolutionResult::from_error(&self.name, &err, started.elapsed()),
        };
        options.notify_solution(&result);
        result
    }
}

/// Applies fixed start times (mode b).
#[derive(Debug, Clone)]
pub struct StartTimeSolver {
    name: String,
    start_times: HashMap<usize, f64>,
}

impl StartTimeSolver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_times: HashMap::new(),
        }
    }

    pub fn with_start_time(mut self, operation_id: usize, start: f64) -> Self {
        self.start_times.insert(operation_id, start);
        self
    }

    /// Sets start times from `(operation id, start)` pairs.
    pub fn with_start_times(mut self, times: impl IntoIterator<Item = (usize, f64)>) -> Self {
        self.start_times.extend(times);
        self
    }

    fn apply(&self, graph: &mut StepGraph) -> Result<()> {
        let times = graph
            .problem()
            .operations()
            .iter()
            .map(|op| {
                self.start_times.get(&op.id()).copied().ok_or_else(|| {
                    ScheduleError::InvalidStartTimes(format!(
                        "no start time for operation {}",
                        op.id()
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        graph.install_start_times(times)
    }
}

impl Solver for StartTimeSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, problem: Arc<Problem>, options: &SolveOptions) -> SolutionResult {
        let started = Instant::now();
        let mut graph = StepGraph::build(problem);
        let result = match self.apply(&mut graph) {
            Ok(()) => finalize_start_times(&self.name, graph, started),
            Err(err) => SolutionResult::from_error(&self.name, &err, started.elapsed()),
        };
        options.notify_solution(&result);
        result
    }
}

fn step_index(problem: &Problem) -> HashMap<usize, StepId> {
    problem
        .operations()
        .iter()
        .enumerate()
        .map(|(i, op)| (op.id(), StepId(i)))
        .collect()
}

fn lookup(steps: &HashMap<usize, StepId>, operation_id: usize) -> Result<StepId> {
    steps.get(&operation_id).copied().ok_or_else(|| {
        ScheduleError::from(ValidationError::new(
            ValidationErrorKind::UnknownOperation,
            format!("unknown operation id {operation_id}"),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{NoSolutionReason, SolveStatus};
    use crate::models::{Job, Operation};
    use crate::testing::{ops_from_routes, two_by_two};

    const M0: Machine = Machine::new(0);
    const M1: Machine = Machine::new(1);

    #[test]
    fn test_sequence_solver() {
        let solver = SequenceSolver::new("external")
            .with_sequence(M0, vec![0, 3])
            .with_sequence(M1, vec![2, 1]);
        let result = solver.solve(Arc::new(two_by_two()), &SolveOptions::new());
        assert_eq!(result.solver, "external");
        assert_eq!(result.makespan(), Some(6.0));
    }

    #[test]
    fn test_sequence_solver_cycle() {
        let solver = SequenceSolver::new("external")
            .with_sequence(M0, vec![3, 0])
            .with_sequence(M1, vec![1, 2]);
        let result = solver.solve(Arc::new(two_by_two()), &SolveOptions::new());
        assert!(matches!(
            result.status,
            SolveStatus::NoSolution(NoSolutionReason::Infeasible(_))
        ));
    }

    #[test]
    fn test_sequence_solver_incomplete_and_unknown() {
        let partial = SequenceSolver::new("partial").with_sequence(M0, vec![0, 3]);
        let result = partial.solve(Arc::new(two_by_two()), &SolveOptions::new());
        assert!(matches!(
            result.status,
            SolveStatus::NoSolution(NoSolutionReason::Invalid(_))
        ));

        let unknown = SequenceSolver::new("unknown").with_sequence(M0, vec![0, 42]);
        let result = unknown.solve(Arc::new(two_by_two()), &SolveOptions::new());
        match result.status {
            SolveStatus::NoSolution(NoSolutionReason::Invalid(msg)) => assert!(msg.contains("42")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_start_time_solver() {
        let solver = StartTimeSolver::new("direct").with_start_times([
            (0, 0.0),
            (1, 3.0),
            (2, 0.0),
            (3, 3.0),
        ]);
        let result = solver.solve(Arc::new(two_by_two()), &SolveOptions::new());
        assert!(result.is_solved());
        assert_eq!(result.makespan(), Some(6.0));
        let graph = result.graph.unwrap();
        assert_eq!(graph.machine_sequence(M1), vec![StepId(2), StepId(1)]);
    }

    #[test]
    fn test_start_time_solver_missing_time() {
        let solver = StartTimeSolver::new("direct").with_start_time(0, 0.0);
        let result = solver.solve(Arc::new(two_by_two()), &SolveOptions::new());
        match result.status {
            SolveStatus::NoSolution(NoSolutionReason::Invalid(msg)) => {
                assert!(msg.contains("operation 1"), "{msg}")
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_start_time_solver_zero_duration_at_shared_start() {
        // J0 = [(M0,3)], J1 = [(M0,0)], both at 0
        let problem = Problem::new(ops_from_routes(&[&[(0, 3.0)], &[(0, 0.0)]])).unwrap();
        let solver = StartTimeSolver::new("direct").with_start_times([(0, 0.0), (1, 0.0)]);
        let result = solver.solve(Arc::new(problem), &SolveOptions::new());
        assert!(result.is_solved(), "{:?}", result.status);
        assert_eq!(result.makespan(), Some(3.0));
    }

    #[test]
    fn test_start_time_solver_zero_duration_steps_of_one_job() {
        // listed position 1 first, both at 0
        let ops = vec![
            Operation::new(0, Job::new(0), M0, 0.0, 1).unwrap(),
            Operation::new(1, Job::new(0), M0, 0.0, 0).unwrap(),
        ];
        let solver = StartTimeSolver::new("direct").with_start_times([(0, 0.0), (1, 0.0)]);
        let result = solver.solve(Arc::new(Problem::new(ops).unwrap()), &SolveOptions::new());
        assert!(result.is_solved(), "{:?}", result.status);
        assert_eq!(result.makespan(), Some(0.0));
    }

    #[test]
    fn test_adapters_report_solutions() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let options = SolveOptions::new().with_on_solution(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let sequences = SequenceSolver::new("external")
            .with_sequence(M0, vec![0, 3])
            .with_sequence(M1, vec![2, 1]);
        let partial = SequenceSolver::new("partial").with_sequence(M0, vec![0, 3]);
        let direct = StartTimeSolver::new("direct").with_start_times([
            (0, 0.0),
            (1, 3.0),
            (2, 0.0),
            (3, 3.0),
        ]);
        sequences.solve(Arc::new(two_by_two()), &options);
        partial.solve(Arc::new(two_by_two()), &options);
        direct.solve(Arc::new(two_by_two()), &options);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
