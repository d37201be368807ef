//! # docbatch - parallel batch document compilation
//!
//! docbatch walks a tree of source documents, hands every LaTeX, Typst,
//! Markdown or reStructuredText file to its external compiler (`xelatex`,
//! `typst`, `pandoc`) on a bounded worker pool, mirrors the source layout
//! into an output tree of PDFs and reports per-format timing statistics.
//!
//! ## Quick Start
//!
//! ```bash
//! # Compile every .tex file below ./bills into ./output_pdf/bills
//! docbatch tex ./bills
//!
//! # Let docbatch pick the backend per subdirectory name
//! docbatch auto ./exported_files -j 8
//!
//! # See which backends are installed
//! docbatch check
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use docbatch::backend::FormatRegistry;
//! use docbatch::compile::{CompileOptions, run_format};
//! use docbatch::config::DocBatchConfig;
//! use std::path::Path;
//!
//! let config = DocBatchConfig::load(None, None::<&()>)?;
//! let registry = FormatRegistry::from_config(&config);
//! let options = CompileOptions::from_config(&config, "output_pdf".into());
//!
//! let latex = registry.get("tex").expect("built-in format");
//! let report = run_format(latex, Path::new("bills"), &options);
//! println!("{} files compiled", report.stats.file_count);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod backend;
pub mod cli;
pub mod compile;
pub mod config;
pub mod parallel;
pub mod report;

pub use cli::{Cli, Output};
pub use config::DocBatchConfig;

/// Result type alias for docbatch operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
