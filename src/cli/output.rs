//! Styled terminal output for docbatch
//!
//! Status messages go to stdout, errors to stderr. Quiet mode keeps only
//! errors.

use console::style;

use crate::report::{FormatReport, FormatStatus, RunReport};

/// Output handler for consistent CLI formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Errors are shown even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Only printed with `-v`
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let styled_value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {} {}", style(key).dim(), styled_value);
        }
    }

    pub fn separator(&self) {
        if !self.quiet {
            println!("{}", style("─".repeat(50)).dim());
        }
    }

    /// Indented block on stderr, used for failure logs
    pub fn error_detail(&self, text: &str) {
        for line in text.trim_end().lines() {
            eprintln!("    {}", style(line).dim());
        }
    }

    /// Per-format line printed as soon as a format finishes
    pub fn format_finished(&self, report: &FormatReport) {
        let line = report.summary_line();
        match &report.status {
            FormatStatus::Skipped { .. } => self.error(&line),
            FormatStatus::Completed if report.stats.failed > 0 => self.warning(&line),
            FormatStatus::Completed if report.stats.file_count == 0 => {
                self.info(&format!(
                    "No {} files found in {}",
                    report.label,
                    report.source_dir.display()
                ));
            }
            FormatStatus::Completed => self.success(&line),
        }

        for result in report.failed_results() {
            self.error(&format!("{} failed", result.input_path.display()));
            self.error_detail(&result.log_text);
        }

        if let Some(cleanup) = &report.cleanup {
            self.verbose(&format!("Removed {} auxiliary files", cleanup.deleted));
            for path in &cleanup.failed {
                self.warning(&format!("Could not remove {}", path.display()));
            }
        }
    }

    /// Final summary table
    pub fn run_summary(&self, report: &RunReport) {
        self.header("Summary");
        self.separator();
        if !self.quiet {
            print!("{}", report.render_text());
        }
        self.separator();
    }
}
