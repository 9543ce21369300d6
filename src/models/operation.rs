//! Operation model.
//!
//! An operation is the smallest schedulable unit: one job, one machine, a
//! processing time and its position inside the job's sequence. Operations
//! are immutable once created; the only check performed here is that the
//! duration is a finite, non-negative number.

use serde::{Deserialize, Serialize};

use super::{Job, Machine};
use crate::validation::{ValidationError, ValidationErrorKind};

/// An operation (one processing step of a job on a machine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    id: usize,
    job: Job,
    machine: Machine,
    duration: f64,
    position: usize,
}

impl Operation {
    /// Creates an operation.
    ///
    /// `position` is the 0-based index of this operation within its job.
    ///
    /// # Errors
    /// `InvalidDuration` if `duration` is NaN, infinite or negative.
    pub fn new(
        id: usize,
        job: Job,
        machine: Machine,
        duration: f64,
        position: usize,
    ) -> Result<Self, ValidationError> {
        check_duration(id, duration)?;
        Ok(Self {
            id,
            job,
            machine,
            duration,
            position,
        })
    }

    /// Operation identifier.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Owning job.
    #[inline]
    pub fn job(&self) -> Job {
        self.job
    }

    /// Machine this operation must run on.
    #[inline]
    pub fn machine(&self) -> Machine {
        self.machine
    }

    /// Processing time.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Index within the job's operation sequence (0-based).
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}

pub(crate) fn check_duration(id: usize, duration: f64) -> Result<(), ValidationError> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            ValidationErrorKind::InvalidDuration,
            format!("Operation {id} has invalid duration {duration}"),
        ))
    }
}
