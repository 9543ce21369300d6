//! Priority-dispatch constructive heuristic.
//!
//! # Algorithm
//!
//! 1. The ready set holds the next unscheduled operation of every job.
//! 2. Score the ready set with the rule engine; pick the best candidate.
//! 3. Start it at `max(job predecessor finish, machine available)`,
//!    append it to its machine chain and advance the job.
//! 4. Repeat until every operation is dispatched (exactly `n` iterations).
//!
//! Start times are tracked locally and installed directly; with `verify`
//! enabled the evaluator recomputes them from the machine chains and any
//! disagreement is reported as an internal error.
//!
//! # Complexity
//! O(n * j * r) where n=operations, j=jobs, r=rules.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching;
//! Giffler & Thompson (1960), "Algorithms for Solving Production-Scheduling Problems"

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dispatching::{Candidate, DispatchContext, RuleEngine};
use crate::error::{Result, ScheduleError};
use crate::evaluation::{Evaluation, Evaluator};
use crate::graph::{StepGraph, StepId};
use crate::models::{Machine, Problem};
use crate::solver::{finalize_chains, NoSolutionReason, SolutionResult, SolveOptions, Solver};

/// How a dispatch run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Every step was dispatched; start times are installed.
    Complete {
        makespan: f64,
        /// Evaluator result, present when verification ran.
        evaluation: Option<Evaluation>,
    },
    /// The deadline passed after `dispatched` steps. The graph holds a
    /// partial machine assignment and no start times.
    TimedOut { dispatched: usize },
}

/// Greedy list scheduler driven by a [`RuleEngine`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use u_jobshop::graph::StepGraph;
/// use u_jobshop::instance::parse_problem;
/// use u_jobshop::scheduler::{DispatchOutcome, PriorityDispatchSolver};
///
/// let problem = parse_problem("2 2\n0 3 1 2\n1 2 0 3\n").unwrap();
/// let mut graph = StepGraph::build(Arc::new(problem));
/// let outcome = PriorityDispatchSolver::new().dispatch(&mut graph, None).unwrap();
/// assert!(matches!(outcome, DispatchOutcome::Complete { makespan, .. } if makespan == 6.0));
/// ```
#[derive(Debug, Clone)]
pub struct PriorityDispatchSolver {
    name: String,
    engine: RuleEngine,
    verify: bool,
}

impl PriorityDispatchSolver {
    /// Creates a dispatcher using the reference rule (SPT, ties by job id
    /// then machine id) with verification on.
    pub fn new() -> Self {
        Self {
            name: "priority-dispatch".to_string(),
            engine: RuleEngine::reference(),
            verify: true,
        }
    }

    /// Sets the rule engine.
    pub fn with_rule_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Enables or disables re-evaluation of the dispatched schedule.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn verifies(&self) -> bool {
        self.verify
    }

    /// Dispatches every step of `graph`, replacing any existing machine
    /// chains.
    ///
    /// # Errors
    /// `Internal` if verification is on and the evaluator disagrees with
    /// the dispatched start times.
    pub fn dispatch(&self, graph: &mut StepGraph, deadline: Option<Instant>) -> Result<DispatchOutcome> {
        graph.reset();
        let problem = Arc::clone(graph.problem());
        let ops = problem.operations();
        let routes: Vec<&[usize]> = problem
            .jobs()
            .iter()
            .map(|&job| problem.job_operations(job))
            .collect();
        let job_work: Vec<f64> = problem.jobs().iter().map(|&job| problem.job_length(job)).collect();
        let remaining_work = remaining_work(&problem);

        let mut next_position = vec![0usize; routes.len()];
        let mut job_ready = vec![0.0_f64; routes.len()];
        let mut context = DispatchContext {
            machine_available: problem.machines().iter().map(|&m| (m, 0.0)).collect(),
            ..Default::default()
        };
        let mut machine_tail: BTreeMap<Machine, StepId> = BTreeMap::new();
        let mut start = vec![0.0_f64; ops.len()];

        let mut candidates: Vec<Candidate> = Vec::with_capacity(routes.len());
        let mut owners: Vec<usize> = Vec::with_capacity(routes.len());

        for iteration in 0..ops.len() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(iteration, total = ops.len(), "dispatch deadline reached");
                return Ok(DispatchOutcome::TimedOut {
                    dispatched: iteration,
                });
            }

            candidates.clear();
            owners.clear();
            for (j, route) in routes.iter().enumerate() {
                let Some(&index) = route.get(next_position[j]) else {
                    continue;
                };
                let op = &ops[index];
                let available = context.machine_available(op.machine());
                candidates.push(Candidate {
                    step: StepId(index),
                    operation_id: op.id(),
                    job: op.job(),
                    machine: op.machine(),
                    duration: op.duration(),
                    earliest_start: job_ready[j].max(available),
                    job_ready: job_ready[j],
                    remaining_work: remaining_work[index],
                    remaining_operations: route.len() - next_position[j],
                    job_work: job_work[j],
                });
                owners.push(j);
            }

            context.iteration = iteration;
            context.clock = candidates
                .iter()
                .map(|c| c.earliest_start)
                .fold(f64::INFINITY, f64::min);
            let best = self.engine.select_best(&candidates, &context).ok_or_else(|| {
                ScheduleError::Internal(format!("no ready step at iteration {iteration}"))
            })?;

            let chosen = &candidates[best];
            let job_index = owners[best];
            let begin = chosen.earliest_start;
            let finish = begin + chosen.duration;

            if let Some(&tail) = machine_tail.get(&chosen.machine) {
                graph.set_machine_link(tail, chosen.step)?;
            }
            machine_tail.insert(chosen.machine, chosen.step);
            context.machine_available.insert(chosen.machine, finish);
            job_ready[job_index] = finish;
            next_position[job_index] += 1;
            start[chosen.step.0] = begin;

            debug!(
                iteration,
                step = %chosen.step,
                job = %chosen.job,
                machine = %chosen.machine,
                start = begin,
                candidates = candidates.len(),
                "step dispatched"
            );
        }

        graph.install_start_times(start.clone())?;
        let makespan = graph.makespan().unwrap_or(0.0);

        let evaluation = if self.verify {
            Some(verify_against_evaluator(graph, &start)?)
        } else {
            None
        };

        Ok(DispatchOutcome::Complete {
            makespan,
            evaluation,
        })
    }
}

impl Default for PriorityDispatchSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for PriorityDispatchSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, problem: Arc<Problem>, options: &SolveOptions) -> SolutionResult {
        let started = Instant::now();
        let mut graph = StepGraph::build(problem);

        let result = match self.dispatch(&mut graph, options.deadline(started)) {
            Ok(DispatchOutcome::Complete {
                evaluation: Some(evaluation),
                ..
            }) => {
                info!(solver = %self.name, makespan = evaluation.makespan, "solution found");
                SolutionResult::solved(&self.name, graph, evaluation, started.elapsed())
            }
            Ok(DispatchOutcome::Complete { evaluation: None, .. }) => {
                finalize_chains(&self.name, graph, started)
            }
            Ok(DispatchOutcome::TimedOut { .. }) => SolutionResult::no_solution(
                &self.name,
                NoSolutionReason::TimeLimit,
                started.elapsed(),
            ),
            Err(err) => {
                warn!(solver = %self.name, error = %err, "dispatch failed");
                SolutionResult::from_error(&self.name, &err, started.elapsed())
            }
        };
        options.notify_solution(&result);
        result
    }
}

/// Work left in the job from each operation onwards, indexed by step.
fn remaining_work(problem: &Problem) -> Vec<f64> {
    let ops = problem.operations();
    let mut remaining = vec![0.0; ops.len()];
    for &job in problem.jobs() {
        let mut acc = 0.0;
        for &index in problem.job_operations(job).iter().rev() {
            acc += ops[index].duration();
            remaining[index] = acc;
        }
    }
    remaining
}

fn verify_against_evaluator(graph: &mut StepGraph, dispatched: &[f64]) -> Result<Evaluation> {
    let evaluation = Evaluator::new().evaluate(graph)?;
    let evaluated = graph
        .start_times()
        .ok_or_else(|| ScheduleError::Internal("evaluated graph has no start times".to_string()))?;

    if let Some((i, (a, b))) = dispatched
        .iter()
        .zip(&evaluated)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(ScheduleError::Internal(format!(
            "S{i} dispatched at {a} but evaluates to {b}"
        )));
    }
    Ok(evaluation)
}
