//! Candidate and dispatch state passed to dispatching rules.

use std::collections::BTreeMap;

use crate::graph::StepId;
use crate::models::{Job, Machine};

/// A ready step together with the quantities rules score on.
///
/// Times share the unit of operation durations.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Step to dispatch.
    pub step: StepId,
    /// Id of the wrapped operation.
    pub operation_id: usize,
    pub job: Job,
    pub machine: Machine,
    /// Processing time of this operation.
    pub duration: f64,
    /// `max(job ready, machine available)`.
    pub earliest_start: f64,
    /// Finish time of the job's previous operation (0 for the first).
    pub job_ready: f64,
    /// Work left in the job, this operation included.
    pub remaining_work: f64,
    /// Operations left in the job, this one included.
    pub remaining_operations: usize,
    /// Total processing time of the job.
    pub job_work: f64,
}

/// Runtime dispatch state.
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    /// Dispatch iteration (0-based; one step dispatched per iteration).
    pub iteration: usize,
    /// Smallest earliest start among the current candidates.
    pub clock: f64,
    /// Time each machine becomes free.
    pub machine_available: BTreeMap<Machine, f64>,
}

impl DispatchContext {
    /// Creates a context for the given iteration.
    pub fn at_iteration(iteration: usize) -> Self {
        Self {
            iteration,
            ..Default::default()
        }
    }

    /// Sets the clock.
    pub fn with_clock(mut self, clock: f64) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the available time of a machine.
    pub fn with_machine_available(mut self, machine: Machine, time: f64) -> Self {
        self.machine_available.insert(machine, time);
        self
    }

    /// Time `machine` becomes free (0 if never used).
    pub fn machine_available(&self, machine: Machine) -> f64 {
        self.machine_available.get(&machine).copied().unwrap_or(0.0)
    }
}
