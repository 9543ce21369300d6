//! Solver contract.
//!
//! A solver takes a shared [`Problem`] and produces a [`SolutionResult`].
//! It works on its own [`StepGraph`] and either
//!
//! - (a) sets machine chains and lets the [`Evaluator`] compute start
//!   times ([`finalize_chains`]), or
//! - (b) assigns start times directly, which are checked for feasibility
//!   before machine chains are derived from them ([`finalize_start_times`]).
//!
//! Failure is reported through [`SolveStatus::NoSolution`], never by
//! panicking. [`compare`] runs several solvers side by side, one graph and
//! one thread each.

mod adapters;

pub use adapters::{SequenceSolver, StartTimeSolver};

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::ScheduleError;
use crate::evaluation::{Evaluation, Evaluator};
use crate::graph::StepGraph;
use crate::models::{Problem, Schedule};

/// Called with every solution a solver reports.
pub type SolutionCallback = Arc<dyn Fn(&SolutionResult) + Send + Sync>;

/// Options shared by all solvers.
#[derive(Clone, Default)]
pub struct SolveOptions {
    /// Advisory wall-clock budget.
    pub time_limit: Option<Duration>,
    on_solution: Option<SolutionCallback>,
}

impl SolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Registers a callback run whenever a solver finds a solution.
    ///
    /// Under [`compare`] the callback runs on the solver's own thread.
    pub fn with_on_solution<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SolutionResult) + Send + Sync + 'static,
    {
        self.on_solution = Some(Arc::new(callback));
        self
    }

    /// Passes a solved result to the registered callback, if any.
    /// Results without a solution are not reported.
    pub fn notify_solution(&self, result: &SolutionResult) {
        if let (Some(callback), true) = (&self.on_solution, result.is_solved()) {
            callback(result);
        }
    }

    /// Absolute deadline for a solve that started at `started`.
    pub fn deadline(&self, started: Instant) -> Option<Instant> {
        self.time_limit.map(|limit| started + limit)
    }
}

impl Debug for SolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolveOptions")
            .field("time_limit", &self.time_limit)
            .field("on_solution", &self.on_solution.is_some())
            .finish()
    }
}

/// Why a solver produced no solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoSolutionReason {
    /// The time limit expired before a complete solution was found.
    TimeLimit,
    /// The candidate contradicted job precedence (cycle or overlap).
    Infeasible(String),
    /// The solver's output could not be applied to the graph.
    Invalid(String),
}

impl fmt::Display for NoSolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoSolutionReason::TimeLimit => write!(f, "time limit reached"),
            NoSolutionReason::Infeasible(msg) => write!(f, "infeasible: {msg}"),
            NoSolutionReason::Invalid(msg) => write!(f, "invalid: {msg}"),
        }
    }
}

/// Outcome of a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveStatus {
    Solved,
    NoSolution(NoSolutionReason),
}

/// Result of one solver run.
#[derive(Debug, Clone)]
pub struct SolutionResult {
    /// Solver name.
    pub solver: String,
    pub status: SolveStatus,
    /// Evaluated graph (only when solved).
    pub graph: Option<StepGraph>,
    pub evaluation: Option<Evaluation>,
    /// Makespan of the solution.
    pub objective: Option<f64>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl SolutionResult {
    /// A solved result for an evaluated graph.
    pub fn solved(
        solver: impl Into<String>,
        graph: StepGraph,
        evaluation: Evaluation,
        elapsed: Duration,
    ) -> Self {
        Self {
            solver: solver.into(),
            status: SolveStatus::Solved,
            objective: Some(evaluation.makespan),
            graph: Some(graph),
            evaluation: Some(evaluation),
            elapsed,
        }
    }

    /// A result without a solution.
    pub fn no_solution(
        solver: impl Into<String>,
        reason: NoSolutionReason,
        elapsed: Duration,
    ) -> Self {
        Self {
            solver: solver.into(),
            status: SolveStatus::NoSolution(reason),
            graph: None,
            evaluation: None,
            objective: None,
            elapsed,
        }
    }

    /// Maps an error to a result: cycles are infeasible, anything else
    /// is invalid solver output.
    pub fn from_error(solver: impl Into<String>, err: &ScheduleError, elapsed: Duration) -> Self {
        let reason = if err.is_infeasible() {
            NoSolutionReason::Infeasible(err.to_string())
        } else {
            NoSolutionReason::Invalid(err.to_string())
        };
        Self::no_solution(solver, reason, elapsed)
    }

    pub fn is_solved(&self) -> bool {
        self.status == SolveStatus::Solved
    }

    /// Makespan, if solved.
    pub fn makespan(&self) -> Option<f64> {
        self.objective
    }

    /// Reporting view of the solution, if solved.
    pub fn schedule(&self) -> Option<Schedule> {
        self.graph.as_ref().map(StepGraph::to_schedule)
    }
}

/// A job-shop solver.
pub trait Solver: Send + Sync + Debug {
    /// Name used in results and logs.
    fn name(&self) -> &str;

    /// Solves `problem`. Never panics on infeasible or invalid output;
    /// reports it through the result status instead. Solutions found are
    /// passed to [`SolveOptions::notify_solution`].
    fn solve(&self, problem: Arc<Problem>, options: &SolveOptions) -> SolutionResult;
}

/// Evaluates machine chains set by a solver (mode a).
pub fn finalize_chains(solver: &str, mut graph: StepGraph, started: Instant) -> SolutionResult {
    match Evaluator::new().evaluate(&mut graph) {
        Ok(evaluation) => {
            info!(solver, makespan = evaluation.makespan, "solution found");
            SolutionResult::solved(solver, graph, evaluation, started.elapsed())
        }
        Err(err) => {
            warn!(solver, error = %err, "candidate rejected");
            SolutionResult::from_error(solver, &err, started.elapsed())
        }
    }
}

/// Checks start times assigned by a solver (mode b), derives machine
/// chains from them and evaluates.
///
/// The evaluated start times are the earliest ones consistent with the
/// derived chains, so the objective never exceeds the assigned makespan.
pub fn finalize_start_times(solver: &str, mut graph: StepGraph, started: Instant) -> SolutionResult {
    let violations = Evaluator::new().check_start_times(&graph);
    if let Some(first) = violations.first() {
        warn!(solver, violations = violations.len(), "assigned start times rejected");
        return SolutionResult::no_solution(
            solver,
            NoSolutionReason::Infeasible(first.message.clone()),
            started.elapsed(),
        );
    }

    if let Err(err) = graph.derive_machine_chains() {
        return SolutionResult::from_error(solver, &err, started.elapsed());
    }
    finalize_chains(solver, graph, started)
}

/// Runs every solver on its own thread against `problem`.
///
/// Each solver builds its own graph, so runs are independent. Results are
/// returned in the order of `solvers`.
pub fn compare(
    problem: Arc<Problem>,
    solvers: &[&dyn Solver],
    options: &SolveOptions,
) -> Vec<SolutionResult> {
    thread::scope(|scope| {
        let handles: Vec<_> = solvers
            .iter()
            .map(|&solver| {
                let problem = Arc::clone(&problem);
                let handle = scope.spawn(move || solver.solve(problem, options));
                (solver.name(), handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(name, handle)| {
                handle.join().unwrap_or_else(|_| {
                    SolutionResult::no_solution(
                        name,
                        NoSolutionReason::Invalid("solver panicked".to_string()),
                        Duration::ZERO,
                    )
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StepId;
    use crate::models::Machine;
    use crate::testing::two_by_two;

    #[derive(Debug)]
    struct FixedChains {
        reversed: bool,
    }

    impl Solver for FixedChains {
        fn name(&self) -> &str {
            if self.reversed {
                "reversed"
            } else {
                "fixed"
            }
        }

        fn solve(&self, problem: Arc<Problem>, options: &SolveOptions) -> SolutionResult {
            let started = Instant::now();
            let mut graph = StepGraph::build(problem);
            let (m0, m1) = if self.reversed {
                ([StepId(3), StepId(0)], [StepId(1), StepId(2)])
            } else {
                ([StepId(0), StepId(3)], [StepId(2), StepId(1)])
            };
            let applied = graph
                .set_machine_sequence(Machine::new(0), &m0)
                .and_then(|_| graph.set_machine_sequence(Machine::new(1), &m1));
            let result = match applied {
                Ok(()) => finalize_chains(self.name(), graph, started),
                Err(err) => SolutionResult::from_error(self.name(), &err, started.elapsed()),
            };
            options.notify_solution(&result);
            result
        }
    }

    #[derive(Debug)]
    struct Panicking;

    impl Solver for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn solve(&self, _problem: Arc<Problem>, _options: &SolveOptions) -> SolutionResult {
            panic!("boom")
        }
    }

    #[test]
    fn test_finalize_chains_solved() {
        let result = FixedChains { reversed: false }.solve(Arc::new(two_by_two()), &SolveOptions::new());
        assert!(result.is_solved());
        assert_eq!(result.makespan(), Some(6.0));
        let schedule = result.schedule().unwrap();
        assert_eq!(schedule.assignment_count(), 4);
        assert!(schedule.is_valid());
    }

    #[test]
    fn test_cycle_becomes_infeasible() {
        let result = FixedChains { reversed: true }.solve(Arc::new(two_by_two()), &SolveOptions::new());
        assert!(matches!(
            result.status,
            SolveStatus::NoSolution(NoSolutionReason::Infeasible(_))
        ));
        assert!(result.graph.is_none());
        assert!(result.objective.is_none());
    }

    #[test]
    fn test_finalize_start_times_rejects_overlap() {
        let mut graph = StepGraph::build(Arc::new(two_by_two()));
        graph.install_start_times(vec![0.0, 3.0, 0.0, 1.0]).unwrap();
        let result = finalize_start_times("direct", graph, Instant::now());
        match result.status {
            SolveStatus::NoSolution(NoSolutionReason::Infeasible(msg)) => {
                assert!(msg.contains("starts at"), "{msg}");
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_finalize_start_times_left_shifts() {
        let mut graph = StepGraph::build(Arc::new(two_by_two()));
        // feasible but with idle time everywhere
        graph.install_start_times(vec![1.0, 5.0, 0.0, 4.0]).unwrap();
        let result = finalize_start_times("direct", graph, Instant::now());
        assert!(result.is_solved());
        assert_eq!(result.makespan(), Some(6.0));
        let graph = result.graph.unwrap();
        assert_eq!(graph.machine_sequence(Machine::new(0)), vec![StepId(0), StepId(3)]);
    }

    #[test]
    fn test_compare_keeps_order_and_isolates_panics() {
        let problem = Arc::new(two_by_two());
        let fixed = FixedChains { reversed: false };
        let reversed = FixedChains { reversed: true };
        let solvers: Vec<&dyn Solver> = vec![&reversed, &Panicking, &fixed];
        let results = compare(problem, &solvers, &SolveOptions::new());

        let names: Vec<&str> = results.iter().map(|r| r.solver.as_str()).collect();
        assert_eq!(names, vec!["reversed", "panicking", "fixed"]);
        assert!(!results[0].is_solved());
        assert_eq!(
            results[1].status,
            SolveStatus::NoSolution(NoSolutionReason::Invalid("solver panicked".to_string()))
        );
        assert_eq!(results[2].makespan(), Some(6.0));
    }

    #[test]
    fn test_on_solution_sees_solved_results_only() {
        use std::sync::Mutex;

        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let options = SolveOptions::new().with_on_solution(move |result| {
            sink.lock().unwrap().push(result.solver.clone());
        });
        assert!(format!("{options:?}").contains("on_solution: true"));

        let problem = Arc::new(two_by_two());
        let fixed = FixedChains { reversed: false };
        let reversed = FixedChains { reversed: true };
        let solvers: Vec<&dyn Solver> = vec![&fixed, &reversed];
        compare(problem, &solvers, &options);

        assert_eq!(*seen.lock().unwrap(), vec!["fixed".to_string()]);
    }

    #[test]
    fn test_options_deadline() {
        let started = Instant::now();
        assert!(SolveOptions::new().deadline(started).is_none());
        let options = SolveOptions::new().with_time_limit(Duration::from_millis(5));
        assert_eq!(options.deadline(started), Some(started + Duration::from_millis(5)));
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(NoSolutionReason::TimeLimit.to_string(), "time limit reached");
        assert_eq!(
            NoSolutionReason::Invalid("x".to_string()).to_string(),
            "invalid: x"
        );
    }
}
