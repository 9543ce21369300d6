//! Text instance format.
//!
//! ```text
//! # optional comment lines
//! <num_jobs> <num_machines>
//! <machine> <duration> <machine> <duration> ...   (one line per job)
//! ```
//!
//! This is the layout of the classic OR-Library job-shop instances
//! (ft06, la01, ...). Operation ids are assigned job by job in reading
//! order. Blank lines are skipped; lines after the last job are ignored.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::models::{Job, Machine, Operation, Problem};

/// Parses a problem from the text format.
///
/// # Errors
/// `Parse` with the 1-based line number for malformed content,
/// `Validation` if the resulting operations are rejected.
pub fn parse_problem(input: &str) -> Result<Problem> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (header_line, header) = lines.next().ok_or_else(|| parse_error(1, "missing header"))?;
    let header = numbers(header_line, header)?;
    let &[num_jobs, num_machines] = header.as_slice() else {
        return Err(parse_error(
            header_line,
            format!("expected `num_jobs num_machines`, got {} values", header.len()),
        ));
    };

    let mut operations = Vec::new();
    for j in 0..num_jobs {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(header_line, format!("missing line for job {j}")))?;
        let fields = numbers(line_no, line)?;
        if fields.len() % 2 != 0 {
            return Err(parse_error(
                line_no,
                "expected alternating `machine duration` pairs",
            ));
        }

        for (position, pair) in fields.chunks_exact(2).enumerate() {
            let (machine, duration) = (pair[0], pair[1]);
            if machine >= num_machines {
                return Err(parse_error(
                    line_no,
                    format!("machine {machine} out of range (num_machines = {num_machines})"),
                ));
            }
            let op = Operation::new(
                operations.len(),
                Job::new(j),
                Machine::new(machine),
                duration as f64,
                position,
            )?;
            operations.push(op);
        }
    }

    debug!(num_jobs, num_machines, operations = operations.len(), "parsed instance");
    Problem::with_resources(
        (0..num_jobs).map(Job::new).collect(),
        (0..num_machines).map(Machine::new).collect(),
        operations,
    )
}

/// Reads and parses a problem file, naming the problem after the file stem.
pub fn load_problem(path: impl AsRef<Path>) -> Result<Problem> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let problem = parse_problem(&text)?;
    Ok(match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => problem.with_name(stem),
        None => problem,
    })
}

fn numbers(line_no: usize, line: &str) -> Result<Vec<usize>> {
    line.split_whitespace()
        .map(|field| {
            field
                .parse::<usize>()
                .map_err(|_| parse_error(line_no, format!("`{field}` is not a non-negative integer")))
        })
        .collect()
}

fn parse_error(line: usize, message: impl Into<String>) -> ScheduleError {
    ScheduleError::Parse {
        line,
        message: message.into(),
    }
}
