//! Runtime verification of partial-order executions against past-time
//! branching temporal logic (PCTL)[^1].
//!
//! Events of a distributed system, annotated with Fidge–Mattern vector
//! clocks, are ingested one at a time. The engine incrementally constructs
//! the lattice of consistent global states reachable from the partial
//! order the clocks induce, labels each state with the atomic propositions
//! holding there, evaluates a PCTL property over the state graph, and
//! reports a verdict at the maximal state after every event.
//!
//! [^1]: Baier, C., & Katoen, J. (2008). *Principles of model checking*.
//!   MIT Press.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod event;
mod frontier;
mod monitor;
mod observe;
mod parser;
mod pctl;
mod vector_clock;

use lrlex::lrlex_mod;
use lrpar::lrpar_mod;

lrlex_mod!("pctl.l");
lrpar_mod!("pctl.y");

pub use event::Event;
pub use frontier::{EventId, Frontier, FrontierId};
pub use monitor::{Monitor, MonitorError};
pub use observe::{MaximalCut, Observer, RunOutcome, RunSummary, StepRecord};
pub use parser::{ParseError, parse};
pub use pctl::{Op, Pctl, Property, Quant};
pub use vector_clock::VectorClock;
