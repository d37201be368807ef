//! Subcommand implementations and the setup they share

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{Output, ReportFormat};
use crate::backend::FormatRegistry;
use crate::compile::{CompileOptions, prepare_output_dir};
use crate::config::{ConfigOverrides, DocBatchConfig, GeneralOverrides, PandocOverrides};
use crate::report::RunReport;

pub mod auto;
pub mod check;
pub mod compile;
pub mod config;

/// Global flags, detached from clap parsing
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config: Option<String>,
    pub output_dir: Option<String>,
    pub no_clean: bool,
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
    pub report: ReportFormat,
    pub verbose: u8,
    pub quiet: bool,
}

impl GlobalOptions {
    /// Command-line layer of the configuration
    pub fn overrides(&self, font: Option<String>) -> ConfigOverrides {
        ConfigOverrides {
            general: GeneralOverrides {
                output_dir: self.output_dir.clone(),
                clean: self.no_clean.then_some(false),
                jobs: self.jobs,
                timeout_secs: self.timeout,
            },
            pandoc: PandocOverrides { font },
        }
    }

    pub fn load_config(&self, font: Option<String>) -> Result<DocBatchConfig> {
        DocBatchConfig::load(self.config.as_deref(), Some(self.overrides(font)))
    }
}

/// Everything a compile command needs once setup succeeded
pub struct RunContext {
    pub registry: FormatRegistry,
    pub options: CompileOptions,
}

/// Load configuration, check the source directory and prepare the output
/// directory. Every failure here is fatal for the invocation.
pub fn prepare_run(global: &GlobalOptions, font: Option<String>, source_dir: &Path, output: &Output) -> Result<RunContext> {
    let config = global.load_config(font)?;

    if !source_dir.is_dir() {
        anyhow::bail!("Source directory {} does not exist or is not a directory", source_dir.display());
    }

    let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
    let output_dir = cwd.join(&config.general.output_dir);
    prepare_output_dir(&output_dir, config.general.clean)?;

    let options = CompileOptions::from_config(&config, output_dir)
        .with_progress(!global.quiet && global.report == ReportFormat::Text);

    output.verbose(&format!("Output directory: {}", options.output_dir.display()));
    output.verbose(&format!("Workers: {}", options.workers));
    if let Some(timeout) = options.timeout {
        output.verbose(&format!("Job timeout: {}s", timeout.as_secs()));
    }

    let registry = FormatRegistry::from_config(&config);
    Ok(RunContext { registry, options })
}

/// Run blocking engine work off the async runtime
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("Compile run terminated unexpectedly")
}

/// Print the final report and turn it into the process exit status
pub fn finish(report: &RunReport, global: &GlobalOptions, output: &Output) -> Result<ExitCode> {
    match global.report {
        ReportFormat::Json => println!("{}", report.to_json()?),
        ReportFormat::Text => output.run_summary(report),
    }

    if report.has_failures() {
        let failed: usize = report.formats.iter().map(|format| format.stats.failed).sum();
        let skipped = report.formats.iter().filter(|format| format.is_skipped()).count();
        output.error(&format!("{failed} job(s) failed, {skipped} format run(s) skipped"));
        Ok(ExitCode::FAILURE)
    } else {
        output.success("All documents compiled");
        Ok(ExitCode::SUCCESS)
    }
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
