use poet_core::RunSummary;
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;

/// Per-event timing entry of the final report.
#[derive(Serialize)]
pub(crate) struct EventTime {
    pub(crate) event: String,
    pub(crate) seconds: f64,
}

impl EventTime {
    fn new(entry: &(String, Duration)) -> Self {
        Self {
            event: entry.0.clone(),
            seconds: entry.1.as_secs_f64(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct Report {
    pub(crate) model: String,
    pub(crate) property: String,
    pub(crate) reduction: bool,
    pub(crate) total_events: usize,
    pub(crate) total_states: usize,
    pub(crate) max_event_time: Option<EventTime>,
    pub(crate) min_event_time: Option<EventTime>,
    pub(crate) avg_event_time_seconds: f64,
    pub(crate) verdict: &'static str,
    pub(crate) halted: Option<String>,
}

impl Report {
    pub(crate) fn new(
        model: String,
        property: String,
        reduction: bool,
        summary: &RunSummary,
        halted: Option<String>,
    ) -> Self {
        Self {
            model,
            property,
            reduction,
            total_events: summary.total_events,
            total_states: summary.total_states,
            max_event_time: summary.max_event_time.as_ref().map(EventTime::new),
            min_event_time: summary.min_event_time.as_ref().map(EventTime::new),
            avg_event_time_seconds: summary.avg_event_time.as_secs_f64(),
            verdict: if summary.final_verdict { "TRUE" } else { "FALSE" },
            halted,
        }
    }

    pub(crate) fn print(&self, json: bool) {
        if json {
            let report = serde_json::ser::to_string_pretty(&self).expect("report serialization");
            println!("{report}");
        } else {
            // Print final report
            println!("{self}");
        };
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "PoET results for {} (property '{}'{})",
            self.model,
            self.property,
            if self.reduction { ", reduced" } else { "" }
        )?;
        writeln!(
            f,
            "Processed {} events across {} global states",
            self.total_events, self.total_states
        )?;
        if let (Some(max), Some(min)) = (&self.max_event_time, &self.min_event_time) {
            writeln!(
                f,
                "Event times: max {:.6}s ('{}'), min {:.6}s ('{}'), avg {:.6}s",
                max.seconds, max.event, min.seconds, min.event, self.avg_event_time_seconds
            )?;
        }
        if let Some(reason) = &self.halted {
            writeln!(f, "Monitoring halted early: {reason}")?;
        }
        write!(f, "[FINAL VERDICT]: {}", self.verdict)
    }
}
