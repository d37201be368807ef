use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;

use super::{GlobalOptions, absolute, finish, prepare_run, run_blocking};
use crate::cli::Output;
use crate::compile::auto_run;

#[derive(Args)]
pub struct AutoArgs {
    /// Directory whose subdirectories are named after their format
    /// (e.g. `latex_bills`, `markdown_notes`)
    pub source_dir: PathBuf,

    /// Main font for pandoc formats
    #[arg(long)]
    pub font: Option<String>,
}

pub async fn execute(args: AutoArgs, global: &GlobalOptions, output: Output) -> Result<ExitCode> {
    let source_dir = absolute(&args.source_dir);
    let ctx = prepare_run(global, args.font, &source_dir, &output)?;

    output.header(&format!("Auto-detecting formats in {}", source_dir.display()));

    let registry = ctx.registry;
    let options = ctx.options;
    let parent = source_dir.clone();
    let (report, registry) = run_blocking(move || {
        auto_run(&parent, &registry, &options, |format_report| output.format_finished(format_report))
            .map(|report| (report, registry))
    })
    .await??;

    for dir in &report.unrecognized {
        output.warning(&format!("Unrecognized directory skipped: {}", dir.display()));
    }
    if report.formats.is_empty() {
        output.info(&format!(
            "No format subdirectories found in {}. Name them after a format using one of: {}",
            source_dir.display(),
            registry.all_keywords().join(", ")
        ));
    }

    finish(&report, global, &output)
}
