use crate::parser::TraceFile;
use poet_core::{Event, VectorClock};
use std::collections::HashSet;
use std::fmt;

/// Enumerates the structural defects a trace file can have.
#[derive(Debug)]
pub enum TraceFormatError {
    /// The trace declares zero processes.
    NoProcesses,
    /// `process_names` does not list one name per process.
    ProcessNames {
        /// Declared process count.
        expected: usize,
        /// Number of names provided.
        got: usize,
    },
    /// An event's clock width differs from the process count.
    ClockWidth {
        /// Offending event id.
        event: String,
        /// Declared process count.
        expected: usize,
        /// Clock width found.
        got: usize,
    },
    /// An event names a participant outside `P1..PN`.
    UnknownParticipant {
        /// Offending event id.
        event: String,
        /// The unrecognized participant.
        participant: String,
    },
    /// An event has no participants.
    NoParticipants {
        /// Offending event id.
        event: String,
    },
    /// Two events share an id.
    DuplicateEvent {
        /// The repeated id.
        event: String,
    },
}

impl fmt::Display for TraceFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceFormatError::NoProcesses => write!(f, "trace declares zero processes"),
            TraceFormatError::ProcessNames { expected, got } => {
                write!(f, "expected {expected} process names, found {got}")
            }
            TraceFormatError::ClockWidth {
                event,
                expected,
                got,
            } => write!(
                f,
                "event '{event}' has a clock of width {got}, expected {expected}"
            ),
            TraceFormatError::UnknownParticipant { event, participant } => {
                write!(f, "event '{event}' names unknown participant '{participant}'")
            }
            TraceFormatError::NoParticipants { event } => {
                write!(f, "event '{event}' has no participants")
            }
            TraceFormatError::DuplicateEvent { event } => {
                write!(f, "event id '{event}' appears more than once")
            }
        }
    }
}

impl std::error::Error for TraceFormatError {}

/// Display metadata retained from a trace file.
#[derive(Debug, Clone)]
pub struct TraceModelData {
    /// Number of processes of the recorded system.
    pub processes: usize,
    /// Display names of the processes; defaults to `P1..PN`.
    pub process_names: Vec<String>,
}

pub(crate) fn build(trace: TraceFile) -> Result<(Vec<Event>, TraceModelData), TraceFormatError> {
    if trace.processes == 0 {
        return Err(TraceFormatError::NoProcesses);
    }
    let process_names = match trace.process_names {
        Some(names) => {
            if names.len() != trace.processes {
                return Err(TraceFormatError::ProcessNames {
                    expected: trace.processes,
                    got: names.len(),
                });
            }
            names
        }
        None => (1..=trace.processes).map(|k| format!("P{k}")).collect(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut events = Vec::with_capacity(trace.events.len());
    for raw in trace.events {
        let (id, participants, propositions, clock) = (raw.0, raw.1, raw.2, raw.3);
        if clock.len() != trace.processes {
            return Err(TraceFormatError::ClockWidth {
                event: id,
                expected: trace.processes,
                got: clock.len(),
            });
        }
        if participants.is_empty() {
            return Err(TraceFormatError::NoParticipants { event: id });
        }
        let mut indices = Vec::with_capacity(participants.len());
        for participant in &participants {
            let index = participant
                .strip_prefix('P')
                .and_then(|digits| digits.parse::<usize>().ok())
                .filter(|k| (1..=trace.processes).contains(k));
            match index {
                Some(k) => indices.push(k - 1),
                None => {
                    return Err(TraceFormatError::UnknownParticipant {
                        event: id,
                        participant: participant.clone(),
                    });
                }
            }
        }
        if !seen.insert(id.clone()) {
            return Err(TraceFormatError::DuplicateEvent { event: id });
        }
        events.push(Event::new(id, indices, propositions, VectorClock::new(clock)));
    }

    Ok((
        events,
        TraceModelData {
            processes: trace.processes,
            process_names,
        },
    ))
}
