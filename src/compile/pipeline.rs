//! One format over one source directory: pre-flight, plan, schedule,
//! clean up, summarize.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::planner::plan;
use super::scheduler::{ScheduleOptions, run_all};
use crate::backend::{FormatConfig, locate_backend};
use crate::config::DocBatchConfig;
use crate::parallel::{ExecutionStrategy, ProgressReporter};
use crate::report::{FormatReport, FormatStatus, RunStatistics};

/// Resolved run parameters shared by every format of an invocation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Top-level output directory; each format writes below
    /// `<output_dir>/<source dir name>`
    pub output_dir: PathBuf,
    pub workers: usize,
    pub timeout: Option<Duration>,
    pub log_tail_lines: usize,
    /// Draw a progress bar and per-job lines
    pub show_progress: bool,
}

impl CompileOptions {
    pub fn from_config(config: &DocBatchConfig, output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            workers: ExecutionStrategy::calculate_optimal_workers(
                config.general.jobs,
                config.general.thread_percentage,
            ),
            timeout: config.timeout(),
            log_tail_lines: config.latex.log_tail_lines,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn schedule_options(&self) -> ScheduleOptions {
        ScheduleOptions {
            max_workers: self.workers,
            timeout: self.timeout,
            log_tail_lines: self.log_tail_lines,
        }
    }

    /// `<output_dir>/<basename(source_root)>`
    pub fn output_root_for(&self, source_root: &Path) -> PathBuf {
        let name = source_root
            .file_name()
            .map(|name| name.to_os_string())
            .or_else(|| {
                source_root
                    .canonicalize()
                    .ok()
                    .and_then(|path| path.file_name().map(|name| name.to_os_string()))
            });

        match name {
            Some(name) => self.output_dir.join(name),
            None => self.output_dir.clone(),
        }
    }
}

/// Apply the clean policy to the top-level output directory, then create it.
///
/// Both steps are fatal for the run when they fail.
pub fn prepare_output_dir(output_dir: &Path, clean: bool) -> Result<()> {
    if clean && output_dir.exists() {
        tracing::info!("Removing previous output in {}", output_dir.display());
        std::fs::remove_dir_all(output_dir)
            .with_context(|| format!("Failed to clean output directory {}", output_dir.display()))?;
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    Ok(())
}

/// Run one format over `source_root`.
///
/// Never fails: pre-flight and planning errors produce a skipped report,
/// job failures live in the report's results.
pub fn run_format(format: &FormatConfig, source_root: &Path, options: &CompileOptions) -> FormatReport {
    let started = Instant::now();
    let output_root = options.output_root_for(source_root);
    let skipped = |reason: String| {
        tracing::warn!("Skipping {} in {}: {}", format.label, source_root.display(), reason);
        FormatReport::skipped(&format.id, &format.label, source_root.to_path_buf(), output_root.clone(), reason)
    };

    let executable = format.builder.executable();
    match locate_backend(executable) {
        Ok(path) => tracing::debug!("{} backend: {}", format.label, path.display()),
        Err(e) => return skipped(e.to_string()),
    }

    let tasks = match plan(source_root, &format.extension, &output_root) {
        Ok(tasks) => tasks,
        Err(e) => return skipped(format!("{e:#}")),
    };

    tracing::info!(
        "{}: {} {} files in {} -> {}",
        format.label,
        tasks.len(),
        format.extension,
        source_root.display(),
        output_root.display()
    );

    if tasks.is_empty() {
        tracing::info!("No {} files found in {}", format.extension, source_root.display());
        return FormatReport {
            format_id: format.id.clone(),
            label: format.label.clone(),
            source_dir: source_root.to_path_buf(),
            output_root,
            status: FormatStatus::Completed,
            stats: RunStatistics::new(&format.id),
            wall_seconds: started.elapsed().as_secs_f64(),
            results: Vec::new(),
            cleanup: None,
        };
    }

    let progress = if options.show_progress {
        ProgressReporter::new(tasks.len(), &format.label)
    } else {
        ProgressReporter::hidden()
    };

    let results = run_all(
        tasks,
        format.builder.clone(),
        &format.label,
        &options.schedule_options(),
        &progress,
    );
    progress.finish();

    let cleanup = format.post_process.as_ref().map(|hook| hook.run(&output_root));
    let stats = RunStatistics::from_results(&format.id, &results);

    FormatReport {
        format_id: format.id.clone(),
        label: format.label.clone(),
        source_dir: source_root.to_path_buf(),
        output_root,
        status: FormatStatus::Completed,
        stats,
        wall_seconds: started.elapsed().as_secs_f64(),
        results,
        cleanup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CommandBuilder;
    use std::ffi::OsString;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct MissingBackend;

    impl CommandBuilder for MissingBackend {
        fn executable(&self) -> &str {
            "docbatch-no-such-backend-12345"
        }

        fn build(&self, input_path: &Path, _output_path: &Path, _working_dir: &Path) -> Vec<OsString> {
            vec![self.executable().into(), input_path.into()]
        }
    }

    /// `sh <input>`: the fixture file is the backend script
    struct ShellBackend;

    impl CommandBuilder for ShellBackend {
        fn executable(&self) -> &str {
            "sh"
        }

        fn build(&self, input_path: &Path, output_path: &Path, _working_dir: &Path) -> Vec<OsString> {
            vec!["sh".into(), input_path.into(), output_path.into()]
        }
    }

    fn options(output_dir: &Path) -> CompileOptions {
        CompileOptions {
            output_dir: output_dir.to_path_buf(),
            workers: 2,
            timeout: None,
            log_tail_lines: 10,
            show_progress: false,
        }
    }

    #[test]
    fn test_output_root_uses_source_basename() {
        let opts = options(Path::new("/out"));
        assert_eq!(opts.output_root_for(Path::new("docs/bills")), PathBuf::from("/out/bills"));
    }

    #[test]
    fn test_prepare_output_dir_cleans() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("output_pdf");
        std::fs::create_dir_all(out.join("old")).unwrap();
        std::fs::write(out.join("old/stale.pdf"), "").unwrap();

        prepare_output_dir(&out, false).unwrap();
        assert!(out.join("old/stale.pdf").exists());

        prepare_output_dir(&out, true).unwrap();
        assert!(out.is_dir());
        assert!(!out.join("old").exists());
    }

    #[test]
    fn test_prepare_output_dir_fails_on_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("output_pdf");
        std::fs::write(&out, "").unwrap();

        let err = prepare_output_dir(&out, false).unwrap_err();
        assert!(err.to_string().contains("Failed to create output directory"));
    }

    #[test]
    fn test_missing_backend_skips_format() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("bills");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("a.doc"), "").unwrap();

        let format = FormatConfig::new("doc", "Doc", ".doc", &["doc"], Arc::new(MissingBackend));
        let report = run_format(&format, &src, &options(&dir.path().join("out")));

        assert!(report.is_skipped());
        assert!(report.results.is_empty());
        assert!(report.summary_line().contains("not found on PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_source_skips_format() {
        let dir = TempDir::new().unwrap();
        let format = FormatConfig::new("sh", "Shell", ".sh", &["shell"], Arc::new(ShellBackend));
        let report = run_format(&format, &dir.path().join("missing"), &options(&dir.path().join("out")));

        assert!(report.is_skipped());
        assert!(report.summary_line().contains("Cannot read source directory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_format_end_to_end() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("scripts");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("good.sh"), "echo building; touch \"$1\"\n").unwrap();
        std::fs::write(src.join("nested/bad.sh"), "echo broken >&2; exit 4\n").unwrap();

        let format = FormatConfig::new("sh", "Shell", ".sh", &["shell"], Arc::new(ShellBackend));
        let report = run_format(&format, &src, &options(&dir.path().join("out")));

        assert_eq!(report.status, FormatStatus::Completed);
        assert_eq!(report.stats.file_count, 2);
        assert_eq!(report.stats.succeeded, 1);
        assert_eq!(report.stats.failed, 1);
        assert!(dir.path().join("out/scripts/good.pdf").exists());
        assert!(dir.path().join("out/scripts/nested").is_dir());

        let failure = report.failed_results().next().unwrap();
        assert_eq!(failure.file_name, "bad.sh");
        assert!(failure.log_text.contains("exit code 4"));
        assert!(failure.log_text.contains("broken"));
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_source_reports_no_files() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("empty");
        std::fs::create_dir_all(&src).unwrap();

        let format = FormatConfig::new("sh", "Shell", ".sh", &["shell"], Arc::new(ShellBackend));
        let report = run_format(&format, &src, &options(&dir.path().join("out")));

        assert_eq!(report.status, FormatStatus::Completed);
        assert_eq!(report.stats.file_count, 0);
        assert!(report.summary_line().contains("no files compiled"));
    }
}
