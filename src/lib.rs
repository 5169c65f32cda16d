//! # PoET
//!
//! PoET is a runtime verification tool for distributed systems: it checks
//! whether a recorded partial-order execution satisfies a past-time
//! branching temporal logic (PCTL) property.
//!
//! A run takes a trace file (events annotated with Fidge–Mattern vector
//! clocks) and a property file (PCTL source text), reconstructs the
//! lattice of global states reachable from the partial order the clocks
//! induce, evaluates the property at every state, and reports the verdict
//! at the maximal state after the last event.

mod progress;
mod render;
mod report;
mod verify;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, info};
use poet_core::{Monitor, Property, RunOutcome};
use progress::Bar;
use report::Report;
use std::fs::{self, File};
use std::path::PathBuf;
use verify::ConsoleObserver;

/// How much the monitor prints while processing a trace.
#[deny(missing_docs)]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputLevel {
    /// No output at all; the run is observable through the exit code and
    /// the optional graph file.
    Nothing,
    /// Only the final report, for benchmark harnesses.
    Experiment,
    /// A verdict line per event, plus the final report.
    #[default]
    Default,
    /// A record of every maximal global state per event, plus the report.
    #[value(alias = "max_state")]
    MaxState,
    /// Everything, with per-event state counts; also enables debug logs.
    Debug,
}

/// A PCTL runtime verifier for partial-order executions.
///
/// PoET reads a recorded trace of a distributed system and a past-time CTL
/// property, reconstructs the global states reachable from the causal
/// order of the trace's events, and reports whether the property holds
/// after the final event.
#[derive(Parser)]
#[deny(missing_docs)]
#[command(version, about, long_about)]
pub struct Cli {
    /// Path to the property file (PCTL source text).
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    property: PathBuf,
    /// Path to the trace file (JSON).
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    trace: PathBuf,
    /// Prune global states that no future event can extend.
    ///
    /// Pruned states keep only their cached verdicts, so verdicts are
    /// unaffected while the live state set stays small on streaming
    /// workloads.
    #[arg(short, long)]
    reduce: bool,
    /// Write the final state graph as Graphviz DOT to the given path.
    #[arg(short, long, value_name = "DOT_FILE")]
    visual: Option<PathBuf>,
    /// How much to print while processing.
    #[arg(long, value_enum, default_value = "default")]
    output_level: OutputLevel,
    /// Redirect log output to a file instead of stderr.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
    /// Comma-separated list of log categories to enable, or "none".
    ///
    /// Known categories are "parser", "trace" and "monitor". By default
    /// all categories are enabled.
    #[arg(long, value_name = "CSV")]
    log_categories: Option<String>,
    /// Print the final report as JSON.
    #[arg(long)]
    json: bool,
    /// Print a progress bar while the trace is processed.
    #[arg(long, value_enum)]
    progress: Option<Bar>,
}

impl Cli {
    /// Initializes the global logger according to the CLI flags.
    pub fn init_logger(&self) -> anyhow::Result<()> {
        let level = if matches!(self.output_level, OutputLevel::Debug) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        };
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level);
        if let Some(categories) = &self.log_categories {
            let enabled = if level > LevelFilter::Info {
                level
            } else {
                LevelFilter::Info
            };
            builder.filter_level(LevelFilter::Off);
            if categories != "none" {
                for category in categories.split(',').map(str::trim) {
                    if !category.is_empty() {
                        builder.filter_module(category, enabled);
                    }
                }
            }
        }
        if let Some(path) = &self.log_file {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file '{}'", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        builder.parse_default_env();
        builder.init();
        Ok(())
    }

    /// Runs the verification described by the CLI flags.
    pub fn run(self) -> anyhow::Result<()> {
        let model = self
            .trace
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "trace".to_owned());

        let source = fs::read_to_string(&self.property).with_context(|| {
            format!("failed to read property file '{}'", self.property.display())
        })?;
        let formula = poet_core::parse(&source).map_err(anyhow::Error::new).with_context(|| {
            format!("failed to parse property file '{}'", self.property.display())
        })?;
        info!(target: "parser", "parsed property '{formula}'");
        let property = Property::compile(&formula);

        let (events, trace_model) = poet_trace::load(&self.trace)?;

        let mut monitor = Monitor::new(property, trace_model.processes, self.reduce);
        let bar = self.progress.map(|bar| bar.bar(events.len() as u64));
        let mut observer =
            ConsoleObserver::new(self.output_level, trace_model.process_names, bar);
        let (summary, halted) = match monitor.run(events, &mut observer) {
            RunOutcome::Completed(summary) => (summary, None),
            RunOutcome::Halted { error, summary } => (summary, Some(error)),
        };

        let report = Report::new(
            model,
            formula.to_string(),
            self.reduce,
            &summary,
            halted.as_ref().map(|error| error.to_string()),
        );
        if self.output_level != OutputLevel::Nothing {
            report.print(self.json);
        }

        if let Some(path) = &self.visual {
            fs::write(path, render::dot(&monitor))
                .with_context(|| format!("failed to write graph to '{}'", path.display()))?;
            info!("wrote state graph to '{}'", path.display());
        }

        if let Some(error) = halted {
            bail!(error);
        }
        Ok(())
    }
}

// From Clap tutorial <https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing>
#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
