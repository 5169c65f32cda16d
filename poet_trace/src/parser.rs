use serde::Deserialize;

/// Top-level structure of a trace file.
#[derive(Debug, Deserialize)]
pub(crate) struct TraceFile {
    pub(crate) processes: usize,
    #[serde(default)]
    pub(crate) process_names: Option<Vec<String>>,
    pub(crate) events: Vec<RawEvent>,
}

/// One event entry: `[id, participants, propositions, clock]`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEvent(
    pub(crate) String,
    pub(crate) Vec<String>,
    pub(crate) Vec<String>,
    pub(crate) Vec<u32>,
);
