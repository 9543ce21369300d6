//! Job-shop domain models.
//!
//! Immutable problem facts (`Job`, `Machine`, `Operation`, `Problem`) and
//! the flat reporting view of a solution (`Schedule`).
//!
//! # Domain Mappings
//!
//! | u-jobshop | Manufacturing | Computing |
//! |-----------|---------------|-----------|
//! | Job | Order / Part routing | Pipeline |
//! | Operation | Process step | Stage |
//! | Machine | Workstation | Executor |
//! | Schedule | Production plan | Execution plan |

mod job;
pub(crate) mod operation;
mod problem;
mod schedule;

pub use job::{Job, Machine};
pub use operation::Operation;
pub use problem::Problem;
pub use schedule::{Assignment, Schedule, Violation, ViolationType};
