//! Run statistics and the final summary
//!
//! [`RunStatistics`] is a commutative accumulator over compile results, so
//! results may be added in any completion order. [`RunReport`] collects one
//! [`FormatReport`] per format run and renders the summary table.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::compile::CompileResult;
use crate::compile::cleanup::CleanupSummary;

/// Per-format totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub format_id: String,
    /// Sum of job durations in seconds
    pub total_duration: f64,
    pub file_count: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunStatistics {
    pub fn new(format_id: &str) -> Self {
        Self {
            format_id: format_id.to_string(),
            ..Default::default()
        }
    }

    pub fn from_results(format_id: &str, results: &[CompileResult]) -> Self {
        let mut stats = Self::new(format_id);
        for result in results {
            stats.record(result);
        }
        stats
    }

    pub fn record(&mut self, result: &CompileResult) {
        self.file_count += 1;
        self.total_duration += result.duration_seconds.max(0.0);
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn merge(&mut self, other: &RunStatistics) {
        self.file_count += other.file_count;
        self.total_duration += other.total_duration;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    /// `None` when nothing was compiled
    pub fn mean_duration(&self) -> Option<f64> {
        if self.file_count == 0 {
            None
        } else {
            Some(self.total_duration / self.file_count as f64)
        }
    }
}

/// Whether a format ran at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FormatStatus {
    Completed,
    /// Planning or pre-flight failed; no job was started
    Skipped { reason: String },
}

/// Outcome of one format pipeline over one source directory
#[derive(Debug, Clone, Serialize)]
pub struct FormatReport {
    pub format_id: String,
    pub label: String,
    pub source_dir: PathBuf,
    pub output_root: PathBuf,
    #[serde(flatten)]
    pub status: FormatStatus,
    pub stats: RunStatistics,
    pub wall_seconds: f64,
    pub results: Vec<CompileResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupSummary>,
}

impl FormatReport {
    pub fn skipped(format_id: &str, label: &str, source_dir: PathBuf, output_root: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            format_id: format_id.to_string(),
            label: label.to_string(),
            source_dir,
            output_root,
            status: FormatStatus::Skipped { reason: reason.into() },
            stats: RunStatistics::new(format_id),
            wall_seconds: 0.0,
            results: Vec::new(),
            cleanup: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, FormatStatus::Skipped { .. })
    }

    pub fn failed_results(&self) -> impl Iterator<Item = &CompileResult> {
        self.results.iter().filter(|result| !result.success)
    }

    /// One summary line, e.g.
    /// `TeX (bills): 2 files, 1 ok, 1 failed, total 3.10s, mean 1.55s/file, wall 1.80s`
    pub fn summary_line(&self) -> String {
        let name = self
            .source_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_dir.display().to_string());

        if let FormatStatus::Skipped { reason } = &self.status {
            return format!("{} ({}): skipped: {}", self.label, name, reason);
        }

        let stats = &self.stats;
        let mean = match stats.mean_duration() {
            Some(mean) => format!("mean {mean:.2}s/file"),
            None => "no files compiled".to_string(),
        };
        format!(
            "{} ({}): {} files, {} ok, {} failed, total {:.2}s, {}, wall {:.2}s",
            self.label, name, stats.file_count, stats.succeeded, stats.failed, stats.total_duration, mean, self.wall_seconds
        )
    }
}

/// Everything one invocation did
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub formats: Vec<FormatReport>,
    /// Auto mode subdirectories that matched no format
    pub unrecognized: Vec<PathBuf>,
    pub total_seconds: f64,
}

impl RunReport {
    pub fn push(&mut self, report: FormatReport) {
        self.formats.push(report);
    }

    pub fn has_failures(&self) -> bool {
        self.formats
            .iter()
            .any(|format| format.is_skipped() || format.stats.failed > 0)
    }

    /// Totals across every completed format
    pub fn totals(&self) -> RunStatistics {
        let mut totals = RunStatistics::new("all");
        for format in &self.formats {
            totals.merge(&format.stats);
        }
        totals
    }

    /// Plain-text summary table
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for format in &self.formats {
            let _ = writeln!(out, "{}", format.summary_line());
        }
        for dir in &self.unrecognized {
            let _ = writeln!(out, "unrecognized: {}", dir.display());
        }
        if self.formats.len() > 1 {
            let totals = self.totals();
            let _ = writeln!(
                out,
                "All formats: {} files, {} ok, {} failed, total {:.2}s",
                totals.file_count, totals.succeeded, totals.failed, totals.total_duration
            );
        }
        let _ = writeln!(out, "Total run time: {:.2}s", self.total_seconds);
        out
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompileTask;

    fn result(name: &str, success: bool, duration: f64) -> CompileResult {
        let task = CompileTask::new(name, format!("out/{name}.pdf"), "out");
        let mut result = CompileResult::failed(&task, duration, "");
        result.success = success;
        result.exit_code = Some(if success { 0 } else { 2 });
        result
    }

    fn completed(label: &str, results: Vec<CompileResult>, wall: f64) -> FormatReport {
        FormatReport {
            format_id: label.to_lowercase(),
            label: label.to_string(),
            source_dir: PathBuf::from("docs/bills"),
            output_root: PathBuf::from("output_pdf/bills"),
            status: FormatStatus::Completed,
            stats: RunStatistics::from_results(&label.to_lowercase(), &results),
            wall_seconds: wall,
            results,
            cleanup: None,
        }
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let results = vec![
            result("a", true, 0.5),
            result("b", false, 1.25),
            result("c", true, 2.0),
            result("d", true, 0.25),
        ];
        let forward = RunStatistics::from_results("tex", &results);

        let mut reversed_results = results.clone();
        reversed_results.reverse();
        let reversed = RunStatistics::from_results("tex", &reversed_results);

        let rotated: Vec<CompileResult> = results[2..].iter().chain(&results[..2]).cloned().collect();
        let rotated = RunStatistics::from_results("tex", &rotated);

        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
        assert_eq!(forward.file_count, 4);
        assert_eq!(forward.succeeded, 3);
        assert_eq!(forward.failed, 1);
        assert_eq!(forward.total_duration, 4.0);
        assert_eq!(forward.mean_duration(), Some(1.0));
    }

    #[test]
    fn test_zero_files() {
        let stats = RunStatistics::new("md");
        assert_eq!(stats.mean_duration(), None);

        let report = completed("Markdown", vec![], 0.01);
        assert!(report.summary_line().contains("no files compiled"));
        assert!(report.summary_line().contains("0 files"));
    }

    #[test]
    fn test_summary_line_format() {
        let report = completed("TeX", vec![result("x.tex", true, 1.0), result("y.tex", false, 2.1)], 1.8);
        assert_eq!(
            report.summary_line(),
            "TeX (bills): 2 files, 1 ok, 1 failed, total 3.10s, mean 1.55s/file, wall 1.80s"
        );
    }

    #[test]
    fn test_skipped_format_counts_as_failure() {
        let mut run = RunReport::default();
        run.push(completed("Typst", vec![result("a.typ", true, 0.1)], 0.1));
        assert!(!run.has_failures());

        run.push(FormatReport::skipped(
            "tex",
            "TeX",
            PathBuf::from("docs/latex"),
            PathBuf::from("out/latex"),
            "Backend executable 'xelatex' not found on PATH",
        ));
        assert!(run.has_failures());
        assert!(run.render_text().contains("TeX (latex): skipped: Backend executable 'xelatex' not found on PATH"));
    }

    #[test]
    fn test_failed_job_marks_run_failed() {
        let mut run = RunReport::default();
        run.push(completed("TeX", vec![result("y.tex", false, 0.3)], 0.3));
        assert!(run.has_failures());
        assert_eq!(run.formats[0].failed_results().count(), 1);
    }

    #[test]
    fn test_render_text_totals_and_unrecognized() {
        let mut run = RunReport {
            total_seconds: 4.5,
            ..Default::default()
        };
        run.push(completed("TeX", vec![result("x.tex", true, 1.0)], 1.0));
        run.push(completed("Markdown", vec![result("a.md", true, 0.5), result("b.md", true, 0.5)], 0.6));
        run.unrecognized.push(PathBuf::from("docs/random_notes"));

        let text = run.render_text();
        assert!(text.contains("unrecognized: docs/random_notes"));
        assert!(text.contains("All formats: 3 files, 3 ok, 0 failed, total 2.00s"));
        assert!(text.ends_with("Total run time: 4.50s\n"));
    }

    #[test]
    fn test_json_report_shape() {
        let mut run = RunReport::default();
        run.push(completed("TeX", vec![result("x.tex", false, 1.0)], 1.0));
        run.push(FormatReport::skipped("typ", "Typst", "t".into(), "o/t".into(), "no backend"));

        let value: serde_json::Value = serde_json::from_str(&run.to_json().unwrap()).unwrap();
        assert_eq!(value["formats"][0]["status"], "completed");
        assert_eq!(value["formats"][0]["stats"]["failed"], 1);
        assert_eq!(value["formats"][0]["results"][0]["exit_code"], 2);
        assert_eq!(value["formats"][1]["status"], "skipped");
        assert_eq!(value["formats"][1]["reason"], "no backend");
    }
}
