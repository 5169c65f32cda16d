use crate::OutputLevel;
use indicatif::ProgressBar;
use poet_core::{Observer, RunSummary, StepRecord, VectorClock};

fn verdict(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// Prints observation records according to the selected output level and
/// keeps the progress bar moving.
pub(crate) struct ConsoleObserver {
    level: OutputLevel,
    process_names: Vec<String>,
    bar: Option<ProgressBar>,
}

impl ConsoleObserver {
    pub(crate) fn new(
        level: OutputLevel,
        process_names: Vec<String>,
        bar: Option<ProgressBar>,
    ) -> Self {
        Self {
            level,
            process_names,
            bar,
        }
    }

    /// A cut rendered with the trace's process names, e.g.
    /// `⟨client:1, server:0⟩`.
    fn named_cut(&self, cut: &VectorClock) -> String {
        let parts: Vec<String> = self
            .process_names
            .iter()
            .zip(cut.components())
            .map(|(name, count)| format!("{name}:{count}"))
            .collect();
        format!("⟨{}⟩", parts.join(", "))
    }
}

impl Observer for ConsoleObserver {
    fn observe(&mut self, step: &StepRecord) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        match self.level {
            OutputLevel::Nothing | OutputLevel::Experiment => {}
            OutputLevel::Default => {
                println!(
                    "{}: cut {} verdict {}",
                    step.event_id,
                    step.delivered,
                    verdict(step.verdict)
                );
            }
            OutputLevel::MaxState => {
                for maximal in &step.maximal {
                    println!(
                        "{}:{} → {} props={{{}}} verdict={}",
                        step.event_id,
                        step.delivered,
                        self.named_cut(&maximal.cut),
                        maximal.propositions.join(", "),
                        verdict(maximal.verdict)
                    );
                }
            }
            OutputLevel::Debug => {
                println!(
                    "{}: cut {} ({} new states) verdict {}",
                    step.event_id,
                    step.delivered,
                    step.new_frontiers,
                    verdict(step.verdict)
                );
                for maximal in &step.maximal {
                    println!(
                        "  maximal {} props={{{}}} verdict={}",
                        self.named_cut(&maximal.cut),
                        maximal.propositions.join(", "),
                        verdict(maximal.verdict)
                    );
                }
            }
        }
    }

    fn finalize(&mut self, _summary: &RunSummary) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
