//! Terminal progress bars for the probe and concat stages

use crate::pipeline::ProgressEvent;
use indicatif::{HumanDuration, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{prefix:20} {bar:40.cyan/blue} | {percent}% | {pos}/{len} | ETA: {eta} | {wide_msg}";

/// Two stacked bars, "Processing Chapters" then "Concatenating Files".
///
/// Hidden entirely in quiet mode; events are still accepted.
pub struct ProgressDisplay {
    multi: MultiProgress,
    style: ProgressStyle,
    probe: Option<ProgressBar>,
    concat: Option<ProgressBar>,
}

impl ProgressDisplay {
    pub fn new(quiet: bool) -> Self {
        let target = if quiet {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        Self {
            multi: MultiProgress::with_draw_target(target),
            style,
            probe: None,
            concat: None,
        }
    }

    fn add_bar(&self, len: u64, label: &'static str) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(len));
        bar.set_style(self.style.clone());
        bar.set_prefix(label);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub fn handle(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::ProbeStarted { files } => {
                self.probe = Some(self.add_bar(files as u64, "Processing Chapters"));
            }
            ProgressEvent::ChapterProbed { title } => {
                if let Some(bar) = &self.probe {
                    bar.set_message(title);
                    bar.inc(1);
                }
            }
            ProgressEvent::ConcatStarted { total_seconds } => {
                if let Some(bar) = self.probe.take() {
                    bar.finish_with_message("done");
                }
                let bar = self.add_bar(100, "Concatenating Files");
                let total = Duration::from_secs_f64(total_seconds.max(0.0));
                bar.set_message(format!("{} total", HumanDuration(total)));
                self.concat = Some(bar);
            }
            ProgressEvent::ConcatProgress { percent } => {
                if let Some(bar) = &self.concat {
                    bar.set_position(u64::from(percent));
                }
            }
        }
    }

    /// Stop drawing. Bars that did not reach the end are left where they stopped.
    pub fn finish(&mut self) {
        for bar in [self.probe.take(), self.concat.take()].into_iter().flatten() {
            if bar.position() >= bar.length().unwrap_or(0) {
                bar.finish();
            } else {
                bar.abandon();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_display_tracks_events() {
        let mut display = ProgressDisplay::new(true);
        display.handle(ProgressEvent::ProbeStarted { files: 2 });
        display.handle(ProgressEvent::ChapterProbed {
            title: "One".to_string(),
        });
        assert_eq!(display.probe.as_ref().map(ProgressBar::position), Some(1));

        display.handle(ProgressEvent::ConcatStarted {
            total_seconds: 90.0,
        });
        assert!(display.probe.is_none());
        display.handle(ProgressEvent::ConcatProgress { percent: 42 });
        assert_eq!(display.concat.as_ref().map(ProgressBar::position), Some(42));

        display.finish();
        assert!(display.concat.is_none());
    }

    #[test]
    fn test_progress_before_start_is_ignored() {
        let mut display = ProgressDisplay::new(true);
        display.handle(ProgressEvent::ConcatProgress { percent: 10 });
        display.finish();
    }
}
