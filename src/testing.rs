//! Shared fixtures for unit tests.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::instance::generate;
use crate::models::{Job, Machine, Operation, Problem};

/// Builds operations from `jobs[j] = [(machine, duration), ...]`,
/// numbering operation ids job by job.
pub(crate) fn ops_from_routes(jobs: &[&[(usize, f64)]]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for (j, route) in jobs.iter().enumerate() {
        for (pos, &(m, d)) in route.iter().enumerate() {
            let id = ops.len();
            ops.push(Operation::new(id, Job::new(j), Machine::new(m), d, pos).unwrap());
        }
    }
    ops
}

/// Job0 = [(M0,3),(M1,2)]; Job1 = [(M1,2),(M0,3)].
///
/// Steps: S0 = J0/M0, S1 = J0/M1, S2 = J1/M1, S3 = J1/M0.
pub(crate) fn two_by_two() -> Problem {
    Problem::new(ops_from_routes(&[&[(0, 3.0), (1, 2.0)], &[(1, 2.0), (0, 3.0)]])).unwrap()
}

/// Three jobs on three machines with distinct routes.
pub(crate) fn three_by_three() -> Problem {
    Problem::new(ops_from_routes(&[
        &[(0, 3.0), (1, 2.0), (2, 2.0)],
        &[(0, 2.0), (2, 1.0), (1, 4.0)],
        &[(1, 4.0), (2, 3.0), (0, 1.0)],
    ]))
    .unwrap()
}

/// Seeded random instances of assorted sizes.
pub(crate) fn random_problems(count: u64) -> Vec<Arc<Problem>> {
    (0..count)
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let jobs = 2 + (seed as usize % 5);
            let machines = 2 + (seed as usize % 4);
            Arc::new(generate(jobs, machines, &mut rng).unwrap())
        })
        .collect()
}
