//! Benchmark catalog.
//!
//! A JSON index of named instances with their best known values:
//!
//! ```json
//! [
//!   { "name": "ft06", "path": "ft06.txt", "optimum": 55 },
//!   { "name": "ta51", "path": "ta51.txt", "optimum": null,
//!     "bounds": { "lower": 2760, "upper": 2844 } }
//! ]
//! ```
//!
//! Paths are relative to the directory holding the index file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parse::load_problem;
use crate::error::{Result, ScheduleError};
use crate::models::Problem;

/// Known lower/upper bounds of an instance without a proven optimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub optimum: Option<f64>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

impl BenchmarkEntry {
    /// Best known value: the optimum, else the upper bound.
    pub fn best_known(&self) -> Option<f64> {
        self.optimum.or(self.bounds.map(|b| b.upper))
    }

    /// Relative error of `makespan` against the best known value, in percent.
    pub fn error_percent(&self, makespan: f64) -> Option<f64> {
        self.best_known()
            .filter(|&best| best > 0.0)
            .map(|best| (makespan - best) / best * 100.0)
    }
}

/// A loaded benchmark instance.
#[derive(Debug, Clone)]
pub struct Benchmark {
    pub problem: Problem,
    pub entry: BenchmarkEntry,
}

/// Named benchmark instances rooted at a directory.
#[derive(Debug, Clone)]
pub struct BenchmarkCatalog {
    root: PathBuf,
    entries: Vec<BenchmarkEntry>,
}

impl BenchmarkCatalog {
    /// Parses a catalog from JSON; instance paths resolve against `root`.
    pub fn from_json(json: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let entries: Vec<BenchmarkEntry> = serde_json::from_str(json)?;
        Ok(Self {
            root: root.into(),
            entries,
        })
    }

    /// Reads a catalog index file (e.g. `benchmark/instances.json`).
    pub fn open(index: impl AsRef<Path>) -> Result<Self> {
        let index = index.as_ref();
        let json = fs::read_to_string(index)?;
        let root = index.parent().map(Path::to_path_buf).unwrap_or_default();
        let catalog = Self::from_json(&json, root)?;
        debug!(path = %index.display(), entries = catalog.entries.len(), "benchmark catalog opened");
        Ok(catalog)
    }

    pub fn entries(&self) -> &[BenchmarkEntry] {
        &self.entries
    }

    /// Looks up an entry by name.
    ///
    /// # Errors
    /// `UnknownBenchmark` if no entry has that name.
    pub fn entry(&self, name: &str) -> Result<&BenchmarkEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ScheduleError::UnknownBenchmark(name.to_string()))
    }

    /// Loads the named instance. The problem is named after the entry.
    pub fn load(&self, name: &str) -> Result<Benchmark> {
        let entry = self.entry(name)?;
        let problem = load_problem(self.root.join(&entry.path))?.with_name(&entry.name);
        Ok(Benchmark {
            problem,
            entry: entry.clone(),
        })
    }
}
