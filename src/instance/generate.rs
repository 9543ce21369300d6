//! Random instance generation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::models::{Job, Machine, Operation, Problem};

/// Smallest generated duration.
pub const MIN_DURATION: u32 = 10;
/// Largest generated duration.
pub const MAX_DURATION: u32 = 50;

/// Generates a square-routed instance: every job visits every machine
/// exactly once, in a random order, with integer durations in
/// `MIN_DURATION..=MAX_DURATION`.
///
/// The randomness source is passed in so that a seeded RNG reproduces the
/// same instance.
///
/// # Example
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use u_jobshop::instance::generate;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let problem = generate(4, 3, &mut rng).unwrap();
/// assert_eq!(problem.len(), 12);
/// ```
pub fn generate<R: Rng + ?Sized>(num_jobs: usize, num_machines: usize, rng: &mut R) -> Result<Problem> {
    let mut route: Vec<Machine> = (0..num_machines).map(Machine::new).collect();
    let mut operations = Vec::with_capacity(num_jobs * num_machines);

    for j in 0..num_jobs {
        route.shuffle(rng);
        for (position, &machine) in route.iter().enumerate() {
            let duration = rng.random_range(MIN_DURATION..=MAX_DURATION);
            operations.push(Operation::new(
                operations.len(),
                Job::new(j),
                machine,
                f64::from(duration),
                position,
            )?);
        }
    }

    Problem::with_resources(
        (0..num_jobs).map(Job::new).collect(),
        (0..num_machines).map(Machine::new).collect(),
        operations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    #[test]
    fn test_every_job_visits_every_machine_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = generate(5, 4, &mut rng).unwrap();
        assert_eq!(p.len(), 20);
        for &job in p.jobs() {
            let machines: BTreeSet<Machine> = p
                .job_operations(job)
                .iter()
                .map(|&i| p.operations()[i].machine())
                .collect();
            assert_eq!(machines.len(), 4);
        }
        for op in p.operations() {
            assert!(op.duration() >= 10.0 && op.duration() <= 50.0);
            assert_eq!(op.duration().fract(), 0.0);
        }
    }

    #[test]
    fn test_same_seed_same_instance() {
        let a = generate(6, 6, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = generate(6, 6, &mut StdRng::seed_from_u64(11)).unwrap();
        let c = generate(6, 6, &mut StdRng::seed_from_u64(12)).unwrap();
        assert_eq!(a.operations(), b.operations());
        assert_ne!(a.operations(), c.operations());
    }

    #[test]
    fn test_degenerate_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate(0, 3, &mut rng).unwrap().is_empty());
        let p = generate(3, 0, &mut rng).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.jobs().len(), 3);
    }
}
