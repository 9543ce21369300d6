//! Job-shop scheduling core.
//!
//! Models a job-shop problem as a disjunctive graph of steps, evaluates
//! machine orderings into start times, makespan and critical path, and
//! provides a priority-dispatch heuristic plus a common solver contract.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `Machine`, `Operation`, `Problem`,
//!   and the `Schedule` reporting view
//! - **`validation`**: Input integrity checks (duplicate ids, positions, durations)
//! - **`graph`**: `StepGraph` with fixed job chains and solver-set machine chains
//! - **`evaluation`**: Topological sort, cycle detection, start times, critical path
//! - **`dispatching`**: Dispatching rules and the rule engine
//! - **`scheduler`**: `PriorityDispatchSolver` and `ScheduleKpi`
//! - **`solver`**: `Solver` trait, results and the comparison harness
//! - **`instance`**: Text instances, random instances, benchmark catalog
//! - **`config`**: Serializable dispatcher configuration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use u_jobshop::instance::parse_problem;
//! use u_jobshop::scheduler::PriorityDispatchSolver;
//! use u_jobshop::solver::{SolveOptions, Solver};
//!
//! let problem = Arc::new(parse_problem("2 2\n0 3 1 2\n1 2 0 3\n").unwrap());
//! let result = PriorityDispatchSolver::new().solve(problem, &SolveOptions::new());
//! assert_eq!(result.makespan(), Some(6.0));
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"
//! - Roy & Sussmann (1964), "Les problèmes d'ordonnancement avec contraintes disjonctives"

pub mod config;
pub mod dispatching;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod instance;
pub mod models;
pub mod scheduler;
pub mod solver;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::{Result, ScheduleError};
pub use evaluation::{Evaluation, Evaluator};
pub use graph::{StepGraph, StepId};
pub use models::{Job, Machine, Operation, Problem, Schedule};
pub use scheduler::{PriorityDispatchSolver, ScheduleKpi};
pub use solver::{SolutionResult, SolveOptions, SolveStatus, Solver};
