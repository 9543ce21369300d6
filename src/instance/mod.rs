//! Problem ingestion: text instances, random instances and the benchmark
//! catalog.

mod catalog;
mod generate;
mod parse;

pub use catalog::{Benchmark, BenchmarkCatalog, BenchmarkEntry, Bounds};
pub use generate::{generate, MAX_DURATION, MIN_DURATION};
pub use parse::{load_problem, parse_problem};
