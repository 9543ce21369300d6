//! Schedule quality metrics (KPIs).
//!
//! Computes standard performance indicators from an evaluated step graph.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Lower bound | max(heaviest machine load, longest job) |
//! | Gap | (C_max - LB) / LB |
//! | Avg Utilization | Mean machine busyness over the makespan |
//! | Avg Completion | Mean job completion time |
//! | Total Idle | Sum over machines of (C_max - busy time) |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use crate::graph::StepGraph;
use crate::models::Machine;

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleKpi {
    /// Latest completion time.
    pub makespan: f64,
    /// Trivial makespan lower bound of the problem.
    pub lower_bound: f64,
    /// Per-machine utilization (0.0..1.0).
    pub utilization_by_machine: BTreeMap<Machine, f64>,
    /// Average machine utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Mean completion time over jobs with operations.
    pub avg_job_completion: f64,
    /// Machine time not spent processing, up to the makespan.
    pub total_idle: f64,
    /// Steps without a current start time.
    pub unscheduled: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from the current start times of `graph`.
    ///
    /// An unevaluated graph yields zero times and counts every step as
    /// unscheduled.
    pub fn calculate(graph: &StepGraph) -> Self {
        let problem = graph.problem();
        let schedule = graph.to_schedule();
        let makespan = schedule.makespan();

        let utilization_by_machine: BTreeMap<Machine, f64> = problem
            .machines()
            .iter()
            .filter_map(|&m| schedule.machine_utilization(m, makespan).map(|u| (m, u)))
            .collect();
        let avg_utilization = if utilization_by_machine.is_empty() {
            0.0
        } else {
            utilization_by_machine.values().sum::<f64>() / utilization_by_machine.len() as f64
        };

        let completions: Vec<f64> = problem
            .jobs()
            .iter()
            .filter_map(|&job| schedule.job_completion_time(job))
            .collect();
        let avg_job_completion = if completions.is_empty() {
            0.0
        } else {
            completions.iter().sum::<f64>() / completions.len() as f64
        };

        let busy: f64 = schedule.assignments.iter().map(|a| a.duration()).sum();
        let total_idle = if schedule.assignments.is_empty() {
            0.0
        } else {
            makespan * problem.machines().len() as f64 - busy
        };

        Self {
            makespan,
            lower_bound: problem.lower_bound(),
            utilization_by_machine,
            avg_utilization,
            avg_job_completion,
            total_idle,
            unscheduled: schedule.violations.len(),
        }
    }

    /// Relative distance of the makespan above the lower bound.
    ///
    /// Returns `None` when the lower bound is zero.
    pub fn gap(&self) -> Option<f64> {
        (self.lower_bound > 0.0).then(|| (self.makespan - self.lower_bound) / self.lower_bound)
    }

    /// Whether the schedule is complete and meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_gap: f64, min_utilization: f64) -> bool {
        self.unscheduled == 0
            && self.gap().unwrap_or(0.0) <= max_gap
            && self.avg_utilization >= min_utilization
    }
}
