//! Constructive schedulers and KPI evaluation.
//!
//! # Algorithm
//!
//! `PriorityDispatchSolver` is a greedy list scheduler: it repeatedly
//! dispatches the best-scored ready operation at its earliest feasible
//! start. It is not optimal, but gives fast baseline solutions and a
//! starting point for improvement methods.
//!
//! # KPI
//!
//! `ScheduleKpi` computes makespan, lower-bound gap, utilization, job
//! completion and idle time.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4, 7
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod dispatch;
mod kpi;

pub use dispatch::{DispatchOutcome, PriorityDispatchSolver};
pub use kpi::ScheduleKpi;
