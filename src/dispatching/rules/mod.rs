//! Built-in dispatching rules.
//!
//! # Categories
//!
//! - **Operation**: SPT, LPT
//! - **Job**: SJF, LJF, LWKR, MWKR, MWKRP, MOPR
//! - **Time**: EST, FIFO
//!
//! # Score Convention
//! All rules return lower scores for higher priority candidates.
//!
//! # References
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use super::{Candidate, DispatchContext, DispatchingRule, RuleScore};

// ======================== Operation rules ========================

/// Shortest Processing Time.
///
/// Prioritizes the ready operation with the shortest duration.
///
/// # Reference
/// Smith (1956), optimal for minimizing mean flow time on single machine.
#[derive(Debug, Clone, Copy)]
pub struct Spt;

impl DispatchingRule for Spt {
    fn name(&self) -> &'static str {
        "SPT"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        candidate.duration
    }

    fn description(&self) -> &'static str {
        "Shortest Processing Time"
    }
}

/// Longest Processing Time.
#[derive(Debug, Clone, Copy)]
pub struct Lpt;

impl DispatchingRule for Lpt {
    fn name(&self) -> &'static str {
        "LPT"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        -candidate.duration
    }

    fn description(&self) -> &'static str {
        "Longest Processing Time"
    }
}

// ======================== Job rules ========================

/// Shortest Job First: smallest total job processing time.
#[derive(Debug, Clone, Copy)]
pub struct Sjf;

impl DispatchingRule for Sjf {
    fn name(&self) -> &'static str {
        "SJF"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        candidate.job_work
    }

    fn description(&self) -> &'static str {
        "Shortest Job First"
    }
}

/// Longest Job First.
#[derive(Debug, Clone, Copy)]
pub struct Ljf;

impl DispatchingRule for Ljf {
    fn name(&self) -> &'static str {
        "LJF"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        -candidate.job_work
    }

    fn description(&self) -> &'static str {
        "Longest Job First"
    }
}

/// Least Work Remaining.
///
/// Prioritizes jobs closest to completion.
#[derive(Debug, Clone, Copy)]
pub struct Lwkr;

impl DispatchingRule for Lwkr {
    fn name(&self) -> &'static str {
        "LWKR"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        candidate.remaining_work
    }

    fn description(&self) -> &'static str {
        "Least Work Remaining"
    }
}

/// Most Work Remaining.
///
/// Prioritizes the jobs with the most remaining work, which tends to keep
/// long jobs off the critical path late in the schedule.
#[derive(Debug, Clone, Copy)]
pub struct Mwkr;

impl DispatchingRule for Mwkr {
    fn name(&self) -> &'static str {
        "MWKR"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        -candidate.remaining_work
    }

    fn description(&self) -> &'static str {
        "Most Work Remaining"
    }
}

/// Most Work Remaining, less 1.5 times the processing time.
///
/// Favours long jobs like MWKR but penalises long ready operations. Used
/// as the secondary rule behind [`Est`] in
/// [`RuleEngine::est_mwkrp`](super::RuleEngine::est_mwkrp).
///
/// # Reference
/// Huang Zhi, "A heuristic algorithm for the job shop scheduling problem"
#[derive(Debug, Clone, Copy)]
pub struct Mwkrp;

impl Mwkrp {
    /// Weight of the ready operation's own duration.
    pub const DURATION_WEIGHT: f64 = 1.5;
}

impl DispatchingRule for Mwkrp {
    fn name(&self) -> &'static str {
        "MWKRP"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        Self::DURATION_WEIGHT * candidate.duration - candidate.remaining_work
    }

    fn description(&self) -> &'static str {
        "Most Work Remaining less 1.5 x Processing Time"
    }
}

/// Most Operations Remaining.
#[derive(Debug, Clone, Copy)]
pub struct Mopr;

impl DispatchingRule for Mopr {
    fn name(&self) -> &'static str {
        "MOPR"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        -(candidate.remaining_operations as f64)
    }

    fn description(&self) -> &'static str {
        "Most Operations Remaining"
    }
}

// ======================== Time rules ========================

/// Earliest Start Time.
///
/// Prioritizes the candidate that can start soonest given job readiness
/// and machine availability. Combined with a secondary rule this gives
/// a non-delay style dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct Est;

impl DispatchingRule for Est {
    fn name(&self) -> &'static str {
        "EST"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        candidate.earliest_start
    }

    fn description(&self) -> &'static str {
        "Earliest Start Time"
    }
}

/// First In First Out: the job that became ready first.
#[derive(Debug, Clone, Copy)]
pub struct Fifo;

impl DispatchingRule for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &DispatchContext) -> RuleScore {
        candidate.job_ready
    }

    fn description(&self) -> &'static str {
        "First In First Out"
    }
}
