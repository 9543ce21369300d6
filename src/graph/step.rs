//! Step: the scheduling variable wrapping one operation.
//!
//! A step sits on two chains at once. Rather than being "both" a job node
//! and a machine node, it owns two independent [`Links`] records, and
//! traversal picks one of them by [`LinkKind`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a step inside its [`StepGraph`](super::StepGraph).
///
/// Equal to the index of the wrapped operation in the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepId(pub usize);

impl StepId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Which precedence chain a link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// Fixed order of a job's operations.
    Job,
    /// Solver-assigned order of a machine's operations.
    Machine,
}

/// Predecessor/successor pair on one chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    pub prev: Option<StepId>,
    pub next: Option<StepId>,
}

impl Links {
    /// Neither end is linked.
    pub fn is_detached(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }
}

/// One operation's scheduling state.
#[derive(Debug, Clone)]
pub struct Step {
    id: StepId,
    pub(super) start_time: Option<f64>,
    pub(super) job: Links,
    pub(super) machine: Links,
}

impl Step {
    pub(super) fn new(id: StepId) -> Self {
        Self {
            id,
            start_time: None,
            job: Links::default(),
            machine: Links::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> StepId {
        self.id
    }

    /// Index of the wrapped operation in the problem.
    #[inline]
    pub fn operation_index(&self) -> usize {
        self.id.0
    }

    #[inline]
    pub fn job_links(&self) -> Links {
        self.job
    }

    #[inline]
    pub fn machine_links(&self) -> Links {
        self.machine
    }

    /// Links on the chain of the given kind.
    #[inline]
    pub fn links(&self, kind: LinkKind) -> Links {
        match kind {
            LinkKind::Job => self.job,
            LinkKind::Machine => self.machine,
        }
    }

    pub(super) fn links_mut(&mut self, kind: LinkKind) -> &mut Links {
        match kind {
            LinkKind::Job => &mut self.job,
            LinkKind::Machine => &mut self.machine,
        }
    }
}

/// Iterator following `next` links of one kind.
pub struct ChainIter<'g> {
    pub(super) steps: &'g [Step],
    pub(super) kind: LinkKind,
    pub(super) current: Option<StepId>,
    /// Guards against looping forever on a cyclic machine chain.
    pub(super) remaining: usize,
}

impl Iterator for ChainIter<'_> {
    type Item = StepId;

    fn next(&mut self) -> Option<StepId> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        self.remaining -= 1;
        self.current = self.steps[id.0].links(self.kind).next;
        Some(id)
    }
}
