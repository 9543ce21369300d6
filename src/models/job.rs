//! Job and machine identities.
//!
//! Both are pure value objects: identity and equality by `id`, nothing else.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};
use std::fmt;

/// A job: an ordered sequence of operations that must run in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: usize,
}

impl Job {
    /// Creates a job with the given ID.
    pub const fn new(id: usize) -> Self {
        Self { id }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.id)
    }
}

/// A machine: processes at most one operation at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier.
    pub id: usize,
}

impl Machine {
    /// Creates a machine with the given ID.
    pub const fn new(id: usize) -> Self {
        Self { id }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_by_id() {
        assert_eq!(Job::new(3), Job { id: 3 });
        assert_ne!(Machine::new(0), Machine::new(1));
        assert!(Machine::new(0) < Machine::new(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Job::new(2).to_string(), "J2");
        assert_eq!(Machine::new(7).to_string(), "M7");
    }
}
