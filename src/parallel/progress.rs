use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Per-format progress: one bar plus a status line per finished job.
///
/// Status lines are printed above the bar while it is drawn. When stdout is
/// not a terminal the bar is hidden and lines go straight to stdout, so logs
/// and pipes still see one line per job.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(total_jobs: usize, label: &str) -> Self {
        let style = ProgressStyle::with_template("{spinner} {prefix:.bold} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");

        let bar = ProgressBar::with_draw_target(Some(total_jobs as u64), ProgressDrawTarget::stdout());
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        if !bar.is_hidden() {
            bar.enable_steady_tick(Duration::from_millis(100));
        }

        Self { bar: Some(bar) }
    }

    /// Reporter that prints nothing (quiet and JSON modes)
    pub fn hidden() -> Self {
        Self { bar: None }
    }

    /// Record one finished job and print its status line
    pub fn job_finished(&self, line: &str) {
        let Some(bar) = &self.bar else {
            return;
        };

        if bar.is_hidden() {
            println!("{line}");
        } else {
            bar.println(line);
        }
        bar.inc(1);
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_reporter_is_inert() {
        let reporter = ProgressReporter::hidden();
        assert!(reporter.bar.is_none());
        reporter.job_finished("✔ a.tex (0.10s)");
        reporter.finish();
    }

    #[test]
    fn test_reporter_counts_jobs() {
        let reporter = ProgressReporter::new(2, "TeX");
        reporter.job_finished("✔ a.tex (0.10s)");
        reporter.job_finished("✖ b.tex (exit 1)");
        assert_eq!(reporter.bar.as_ref().map(|bar| bar.position()), Some(2));
        reporter.finish();
    }
}
