//! Parser and validator for PoET's JSON trace-file format.
//!
//! A trace file declares the number of processes of the recorded system and
//! lists its events in a linearization consistent with their causal order:
//!
//! ```json
//! {
//!   "processes": 2,
//!   "process_names": ["client", "server"],
//!   "events": [
//!     ["e1", ["P1"], ["req"], [1, 0]],
//!     ["e2", ["P2"], ["resp"], [1, 1]]
//!   ]
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod parser;

use anyhow::Context;
use builder::build;
use log::info;
use parser::TraceFile;
use poet_core::Event;
use std::{fs::File, io::Read, path::Path};

pub use builder::{TraceFormatError, TraceModelData};

/// Reads and validates a trace file, producing the event sequence in trace
/// order together with the trace's display metadata.
pub fn load(path: &Path) -> anyhow::Result<(Vec<Event>, TraceModelData)> {
    let time = std::time::Instant::now();
    info!(target: "trace", "parsing trace file '{}'", path.display());
    let mut file =
        File::open(path).with_context(|| format!("failed to open file '{}'", path.display()))?;
    let size = file.metadata().map(|data| data.len()).unwrap_or_default();
    let mut buf = String::new();
    // Reserve enough bytes in buf to avoid reallocation.
    buf.reserve(size as usize);
    file.read_to_string(&mut buf)
        .with_context(|| format!("failed to read file '{}' to string", path.display()))?;
    let (events, model) = load_str(&buf)
        .with_context(|| format!("failed to parse trace file '{}'", path.display()))?;
    info!(target: "trace", "parsed {} events in {:?}", events.len(), time.elapsed());
    Ok((events, model))
}

/// Parses and validates trace-file content.
pub fn load_str(content: &str) -> anyhow::Result<(Vec<Event>, TraceModelData)> {
    let trace: TraceFile =
        serde_json::from_str(content).context("trace is not valid JSON of the expected shape")?;
    let (events, model) = build(trace)?;
    Ok((events, model))
}
