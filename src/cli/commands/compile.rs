use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use super::{GlobalOptions, absolute, finish, prepare_run, run_blocking};
use crate::cli::Output;
use crate::compile::run_format;
use crate::report::RunReport;

#[derive(Args)]
pub struct SourceArgs {
    /// Directory scanned recursively for source files
    pub source_dir: PathBuf,
}

#[derive(Args)]
pub struct PandocArgs {
    /// Directory scanned recursively for source files
    pub source_dir: PathBuf,

    /// Main font passed to pandoc
    #[arg(long)]
    pub font: Option<String>,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Format id (tex, md, rst, typ or a configured pandoc.extra id)
    #[arg(long = "format", value_name = "ID")]
    pub format_id: String,

    /// Directory scanned recursively for source files
    pub source_dir: PathBuf,

    /// Main font for pandoc formats
    #[arg(long)]
    pub font: Option<String>,
}

pub async fn execute(args: CompileArgs, global: &GlobalOptions, output: Output) -> Result<ExitCode> {
    run_single(args.format_id, args.source_dir, args.font, global, output).await
}

/// `tex`, `md`, `rst` and `typ` subcommands
pub async fn execute_builtin(
    format_id: &str,
    source_dir: PathBuf,
    font: Option<String>,
    global: &GlobalOptions,
    output: Output,
) -> Result<ExitCode> {
    run_single(format_id.to_string(), source_dir, font, global, output).await
}

async fn run_single(
    format_id: String,
    source_dir: PathBuf,
    font: Option<String>,
    global: &GlobalOptions,
    output: Output,
) -> Result<ExitCode> {
    let started = Instant::now();
    let source_dir = absolute(&source_dir);
    let ctx = prepare_run(global, font, &source_dir, &output)?;

    let Some(format) = ctx.registry.get(&format_id).cloned() else {
        let known: Vec<&str> = ctx.registry.iter().map(|format| format.id.as_str()).collect();
        anyhow::bail!("Unknown format '{}'. Known formats: {}", format_id, known.join(", "));
    };

    output.header(&format!("Compiling {} documents in {}", format.label, source_dir.display()));

    let options = ctx.options;
    let format_report = run_blocking(move || run_format(&format, &source_dir, &options)).await?;
    output.format_finished(&format_report);

    let mut report = RunReport::default();
    report.push(format_report);
    report.total_seconds = started.elapsed().as_secs_f64();

    finish(&report, global, &output)
}
