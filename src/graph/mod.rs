//! Step graph: the disjunctive-graph representation of a solving attempt.
//!
//! One [`Step`] per operation. Job chains are wired once from each job's
//! position order and never change. Machine chains start empty and are
//! filled in by a solver, either link by link or a whole machine at a time.
//!
//! Start times are only meaningful while they reflect the current machine
//! chains: any machine-link edit marks them stale, and [`StepGraph::start_time`]
//! returns `None` until the graph is evaluated (or times are installed) again.
//!
//! A graph is exclusively owned by one solving attempt. Clone it to hand
//! independent copies to several solvers.
//!
//! # Reference
//! Roy & Sussmann (1964), "Les problèmes d'ordonnancement avec contraintes
//! disjonctives"; Balas (1969), "Machine Sequencing via Disjunctive Graphs"

mod step;

pub use step::{ChainIter, LinkKind, Links, Step, StepId};

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Result, ScheduleError};
use crate::models::{Assignment, Job, Machine, Operation, Problem, Schedule, Violation};

/// Scheduling variables for one problem.
#[derive(Debug, Clone)]
pub struct StepGraph {
    problem: Arc<Problem>,
    steps: Vec<Step>,
    /// Whether stored start times reflect the current machine chains.
    timed: bool,
}

impl StepGraph {
    /// Builds a graph with one step per operation and job chains wired.
    ///
    /// The problem was validated when it was constructed, so building
    /// cannot fail.
    pub fn build(problem: Arc<Problem>) -> Self {
        let mut steps: Vec<Step> = (0..problem.len()).map(|i| Step::new(StepId(i))).collect();

        for &job in problem.jobs() {
            for pair in problem.job_operations(job).windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                steps[prev].links_mut(LinkKind::Job).next = Some(StepId(next));
                steps[next].links_mut(LinkKind::Job).prev = Some(StepId(prev));
            }
        }

        Self {
            problem,
            steps,
            timed: false,
        }
    }

    /// The problem this graph schedules.
    pub fn problem(&self) -> &Arc<Problem> {
        &self.problem
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the graph has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps, indexed by `StepId`.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step by id.
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id.0)
    }

    /// Operation wrapped by step `id`.
    pub fn operation(&self, id: StepId) -> Option<&Operation> {
        self.problem.operation(id.0)
    }

    /// Steps of `job`, in position order.
    pub fn job_steps(&self, job: Job) -> Vec<StepId> {
        self.problem
            .job_operations(job)
            .iter()
            .map(|&i| StepId(i))
            .collect()
    }

    /// Steps assigned to `machine`, in no particular order.
    pub fn machine_steps(&self, machine: Machine) -> Vec<StepId> {
        self.problem
            .machine_operations(machine)
            .iter()
            .map(|&i| StepId(i))
            .collect()
    }

    /// Follows `next` links of `kind` starting at (and including) `from`.
    pub fn chain(&self, kind: LinkKind, from: StepId) -> ChainIter<'_> {
        ChainIter {
            steps: &self.steps,
            kind,
            current: self.step(from).map(|s| s.id()),
            remaining: self.steps.len(),
        }
    }

    /// Current machine chain of `machine`, walked from its head.
    ///
    /// With an incomplete assignment this is only the chain starting at
    /// the lowest-id head; steps not reachable from it are omitted.
    pub fn machine_sequence(&self, machine: Machine) -> Vec<StepId> {
        let mut heads: Vec<StepId> = self
            .machine_steps(machine)
            .into_iter()
            .filter(|&id| self.steps[id.0].machine.prev.is_none())
            .collect();
        heads.sort();
        match heads.first() {
            Some(&head) => self.chain(LinkKind::Machine, head).collect(),
            None => Vec::new(),
        }
    }

    /// Links `pred` directly before `succ` on their shared machine.
    ///
    /// # Errors
    /// `InvalidLink` if the steps are identical, sit on different machines,
    /// `pred` already has a machine successor or `succ` already has a
    /// machine predecessor. Existing links must be cleared first.
    pub fn set_machine_link(&mut self, pred: StepId, succ: StepId) -> Result<()> {
        self.check_pair(pred, succ)?;
        if let Some(existing) = self.steps[pred.0].machine.next {
            return Err(invalid_link(
                pred,
                succ,
                format!("{pred} already precedes {existing}"),
            ));
        }
        if let Some(existing) = self.steps[succ.0].machine.prev {
            return Err(invalid_link(
                pred,
                succ,
                format!("{succ} already follows {existing}"),
            ));
        }

        self.steps[pred.0].machine.next = Some(succ);
        self.steps[succ.0].machine.prev = Some(pred);
        self.timed = false;
        Ok(())
    }

    /// Removes the machine link `pred -> succ`.
    ///
    /// # Errors
    /// `InvalidLink` if that link is not present.
    pub fn clear_machine_link(&mut self, pred: StepId, succ: StepId) -> Result<()> {
        self.check_pair(pred, succ)?;
        if self.steps[pred.0].machine.next != Some(succ) {
            return Err(invalid_link(pred, succ, "link is not set".to_string()));
        }

        self.steps[pred.0].machine.next = None;
        self.steps[succ.0].machine.prev = None;
        self.timed = false;
        Ok(())
    }

    /// Replaces the whole chain of `machine` with `sequence`.
    ///
    /// `sequence` must list every step of the machine exactly once. This is
    /// the entry point for solvers that produce a per-machine permutation.
    pub fn set_machine_sequence(&mut self, machine: Machine, sequence: &[StepId]) -> Result<()> {
        let expected: HashSet<StepId> = self.machine_steps(machine).into_iter().collect();
        let mut seen = HashSet::with_capacity(sequence.len());
        for &id in sequence {
            self.get(id)?;
            if !expected.contains(&id) || !seen.insert(id) {
                let first = sequence.first().copied().unwrap_or(id);
                return Err(invalid_link(
                    first,
                    id,
                    format!("{id} is not a distinct step of {machine}"),
                ));
            }
        }
        if seen.len() != expected.len() {
            let first = sequence.first().copied().unwrap_or(StepId(0));
            let last = sequence.last().copied().unwrap_or(first);
            return Err(invalid_link(
                first,
                last,
                format!(
                    "sequence covers {} of {} steps on {machine}",
                    seen.len(),
                    expected.len()
                ),
            ));
        }

        self.clear_machine_chain(machine);
        for pair in sequence.windows(2) {
            self.set_machine_link(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// Removes every machine link of `machine`.
    pub fn clear_machine_chain(&mut self, machine: Machine) {
        for id in self.machine_steps(machine) {
            self.steps[id.0].machine = Links::default();
        }
        self.timed = false;
    }

    /// Clears all machine links and start times, keeping job chains.
    ///
    /// Used between solver attempts on the same graph.
    pub fn reset(&mut self) {
        for step in &mut self.steps {
            step.machine = Links::default();
            step.start_time = None;
        }
        self.timed = false;
    }

    /// Whether stored start times reflect the current machine chains.
    pub fn is_timed(&self) -> bool {
        self.timed
    }

    /// Start time of step `id`, if current.
    pub fn start_time(&self, id: StepId) -> Option<f64> {
        if !self.timed {
            return None;
        }
        self.step(id).and_then(|s| s.start_time)
    }

    /// End time (start + duration) of step `id`, if current.
    pub fn end_time(&self, id: StepId) -> Option<f64> {
        let start = self.start_time(id)?;
        Some(start + self.operation(id)?.duration())
    }

    /// All start times in `StepId` order, if current.
    pub fn start_times(&self) -> Option<Vec<f64>> {
        if !self.timed {
            return None;
        }
        self.steps.iter().map(|s| s.start_time).collect()
    }

    /// Makespan of the current start times.
    pub fn makespan(&self) -> Option<f64> {
        if !self.timed {
            return None;
        }
        Some(
            self.steps
                .iter()
                .filter_map(|s| self.end_time(s.id()))
                .fold(0.0, f64::max),
        )
    }

    /// Installs start times computed by a solver directly.
    ///
    /// Only the shape of the input is checked here; feasibility against
    /// job and machine constraints is checked by
    /// [`Evaluator::check_start_times`](crate::evaluation::Evaluator::check_start_times).
    ///
    /// # Errors
    /// `InvalidStartTimes` if the length differs from the step count or a
    /// value is negative or not finite.
    pub fn install_start_times(&mut self, times: Vec<f64>) -> Result<()> {
        if times.len() != self.steps.len() {
            return Err(ScheduleError::InvalidStartTimes(format!(
                "expected {} start times, got {}",
                self.steps.len(),
                times.len()
            )));
        }
        if let Some((i, t)) = times
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_finite() || **t < 0.0)
        {
            return Err(ScheduleError::InvalidStartTimes(format!(
                "step S{i} has start time {t}"
            )));
        }
        self.write_start_times(&times);
        Ok(())
    }

    /// Rebuilds every machine chain from start-time order.
    ///
    /// Ties are broken by end time, then position within the job, then job
    /// id and step id. For start times that pass
    /// [`Evaluator::check_start_times`](crate::evaluation::Evaluator::check_start_times)
    /// every job edge then points forward in chain order, so zero-duration
    /// steps sharing an instant never form a cycle. Stored start times are
    /// kept and remain current if they were before, since the derived
    /// chains agree with them.
    ///
    /// On error the graph is left unchanged.
    pub fn derive_machine_chains(&mut self) -> Result<()> {
        let times: Vec<f64> = self
            .steps
            .iter()
            .map(|s| s.start_time)
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| {
                ScheduleError::InvalidStartTimes("not every step has a start time".to_string())
            })?;

        let problem = Arc::clone(&self.problem);
        let ops = problem.operations();
        let end = |i: usize| times[i] + ops[i].duration();
        let sequences: Vec<(Machine, Vec<StepId>)> = problem
            .machines()
            .iter()
            .map(|&machine| {
                let mut sequence = self.machine_steps(machine);
                sequence.sort_by(|a, b| {
                    times[a.0]
                        .total_cmp(&times[b.0])
                        .then(end(a.0).total_cmp(&end(b.0)))
                        .then(ops[a.0].position().cmp(&ops[b.0].position()))
                        .then(ops[a.0].job().cmp(&ops[b.0].job()))
                        .then(a.cmp(b))
                });
                (machine, sequence)
            })
            .collect();

        let was_timed = self.timed;
        let saved = self.steps.clone();
        for (machine, sequence) in &sequences {
            if let Err(err) = self.set_machine_sequence(*machine, sequence) {
                self.steps = saved;
                self.timed = was_timed;
                return Err(err);
            }
        }

        self.timed = was_timed;
        Ok(())
    }

    /// Flat reporting view of the current start times.
    ///
    /// Steps without a current start time are reported as `Unscheduled`
    /// violations instead of assignments.
    pub fn to_schedule(&self) -> Schedule {
        let mut schedule = Schedule::new();
        for (step, op) in self.steps.iter().zip(self.problem.operations()) {
            match self.start_time(step.id()) {
                Some(start) => schedule.add_assignment(Assignment::new(
                    op.id(),
                    op.job(),
                    op.machine(),
                    start,
                    start + op.duration(),
                )),
                None => schedule.add_violation(Violation::unscheduled(op.id())),
            }
        }
        schedule
    }

    pub(crate) fn write_start_times(&mut self, times: &[f64]) {
        for (step, &t) in self.steps.iter_mut().zip(times) {
            step.start_time = Some(t);
        }
        self.timed = true;
    }

    fn get(&self, id: StepId) -> Result<&Step> {
        self.steps.get(id.0).ok_or(ScheduleError::UnknownStep(id))
    }

    fn check_pair(&self, pred: StepId, succ: StepId) -> Result<()> {
        self.get(pred)?;
        self.get(succ)?;
        if pred == succ {
            return Err(invalid_link(pred, succ, "a step cannot precede itself".to_string()));
        }
        let ops = self.problem.operations();
        let (a, b) = (ops[pred.0].machine(), ops[succ.0].machine());
        if a != b {
            return Err(invalid_link(
                pred,
                succ,
                format!("steps run on different machines ({a} vs {b})"),
            ));
        }
        Ok(())
    }
}

fn invalid_link(from: StepId, to: StepId, reason: String) -> ScheduleError {
    ScheduleError::InvalidLink { from, to, reason }
}
