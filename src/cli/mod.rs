//! Command-line interface for docbatch
//!
//! Global flags select configuration layers and run-wide overrides; each
//! subcommand lives in its own file under `commands/`.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::process::ExitCode;

mod commands;
mod output;

pub use commands::GlobalOptions;
pub use output::Output;

#[derive(Parser)]
#[command(
    name = "docbatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Parallel batch compiler for LaTeX, Typst, Markdown and reStructuredText documents",
    long_about = "docbatch walks a source tree, compiles every matching document to PDF with \
                  xelatex, typst or pandoc on a bounded worker pool, mirrors the directory \
                  structure into an output tree and prints per-format statistics."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Top-level output directory
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output_dir: Option<String>,

    /// Keep the previous output directory instead of wiping it
    #[arg(long, global = true)]
    pub no_clean: bool,

    /// Number of parallel jobs (default: one per CPU core)
    #[arg(short, long, value_name = "N", global = true)]
    pub jobs: Option<usize>,

    /// Kill a backend process after this many seconds (0 = never)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Summary format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text, global = true)]
    pub report: ReportFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the format of every subdirectory by name and compile them all
    Auto(commands::auto::AutoArgs),
    /// Compile LaTeX sources with xelatex
    Tex(commands::compile::SourceArgs),
    /// Compile Markdown sources with pandoc
    Md(commands::compile::PandocArgs),
    /// Compile reStructuredText sources with pandoc
    Rst(commands::compile::PandocArgs),
    /// Compile Typst sources with typst
    Typ(commands::compile::SourceArgs),
    /// Compile any registered format, including configured pandoc formats
    Compile(commands::compile::CompileArgs),
    /// Check that every backend executable is available
    Check(commands::check::CheckArgs),
    /// Configuration management
    Config(commands::config::ConfigArgs),
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir).with_context(|| format!("Cannot change directory to {dir}"))?;
        }

        setup_logging(self.verbose, self.quiet);

        let global = GlobalOptions {
            config: self.config,
            output_dir: self.output_dir,
            no_clean: self.no_clean,
            jobs: self.jobs,
            timeout: self.timeout,
            report: self.report,
            verbose: self.verbose,
            quiet: self.quiet,
        };
        // JSON goes to stdout untouched
        let output = Output::new(self.verbose > 0, self.quiet || self.report == ReportFormat::Json);

        match self.command {
            Some(Commands::Auto(args)) => commands::auto::execute(args, &global, output).await,
            Some(Commands::Tex(args)) => commands::compile::execute_builtin("tex", args.source_dir, None, &global, output).await,
            Some(Commands::Md(args)) => {
                commands::compile::execute_builtin("md", args.source_dir, args.font, &global, output).await
            }
            Some(Commands::Rst(args)) => {
                commands::compile::execute_builtin("rst", args.source_dir, args.font, &global, output).await
            }
            Some(Commands::Typ(args)) => commands::compile::execute_builtin("typ", args.source_dir, None, &global, output).await,
            Some(Commands::Compile(args)) => commands::compile::execute(args, &global, output).await,
            Some(Commands::Check(args)) => commands::check::execute(args, &global, &output).await,
            Some(Commands::Config(args)) => commands::config::execute(args, &global, &output).await,
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => tracing_subscriber::EnvFilter::new("warn"),
        1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
        2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
