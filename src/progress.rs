use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};

/// Trace-processing progress bar
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum Bar {
    /// Fancy Unicode progress bar
    #[default]
    Unicode,
    /// Basic ASCII progress bar
    Ascii,
}

impl Bar {
    pub(crate) fn bar(&self, total_events: u64) -> ProgressBar {
        const FINE_BAR: &str = "█▉▊▋▌▍▎▏  ";
        const ASCII_BAR: &str = "#--";

        let style = if let Bar::Ascii = self {
            ProgressStyle::with_template("{bar:50} {percent:>3}% ({pos}/{len}) ETA: {eta}")
                .unwrap()
                .progress_chars(ASCII_BAR)
        } else {
            ProgressStyle::with_template(
                "{bar:50.white.on_black} {percent:>3}% ({pos}/{len}) ETA: {eta}",
            )
            .unwrap()
            .progress_chars(FINE_BAR)
        };
        ProgressBar::new(total_events).with_style(style)
    }
}
