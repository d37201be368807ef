//! Configuration management for docbatch
//!
//! Configuration is layered with figment (see [`core`]) and extracted into the
//! typed [`DocBatchConfig`] below. Everything the compile engine needs is
//! resolved here once at startup and passed down explicitly afterwards.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod core;
pub mod overrides;
pub mod smart_load;

pub use overrides::{ConfigOverrides, GeneralOverrides, PandocOverrides};

/// Main configuration structure for docbatch
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DocBatchConfig {
    /// Run-wide settings: output location, clean policy, parallelism
    pub general: GeneralConfig,

    /// Settings shared by every pandoc-driven format
    pub pandoc: PandocConfig,

    /// LaTeX backend settings
    pub latex: LatexConfig,
}

/// Run-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Top-level output directory
    pub output_dir: String,

    /// Remove the output directory before compiling
    pub clean: bool,

    /// Number of parallel jobs (0 = one per CPU core)
    pub jobs: usize,

    /// Percentage of CPU cores used when `jobs` is 0
    pub thread_percentage: u8,

    /// Per-job timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
}

/// Pandoc settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PandocConfig {
    /// Main font passed as `-V mainfont=...`
    pub font: String,

    /// Document language passed as `-V lang=...`
    pub lang: String,

    /// Page margin passed as `-V geometry:margin=...`
    pub margin: String,

    /// PDF engine passed as `--pdf-engine=...`
    pub pdf_engine: String,

    /// `--from` value used for Markdown sources
    pub markdown_from: String,

    /// `--from` value used for reStructuredText sources
    pub rst_from: String,

    /// Additional pandoc formats registered purely by configuration
    pub extra: Vec<ExtraPandocFormat>,
}

/// A pandoc-driven format declared in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtraPandocFormat {
    /// Identifier used by `docbatch compile --format <id>`
    pub id: String,

    /// Label shown in progress output and reports
    #[serde(default)]
    pub label: String,

    /// Source file suffix, including the leading dot
    pub extension: String,

    /// Value passed to pandoc as `--from=...`
    pub source_format: String,

    /// Directory-name keywords for auto detection
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// LaTeX settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexConfig {
    /// Auxiliary file suffixes removed after all LaTeX jobs finish
    pub cleanup_extensions: Vec<String>,

    /// Lines of the `.log` file appended to a failed job's diagnostics
    pub log_tail_lines: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: "output_pdf".to_string(),
            clean: true,
            jobs: 0,
            thread_percentage: 100,
            timeout_secs: 0,
        }
    }
}

impl Default for PandocConfig {
    fn default() -> Self {
        Self {
            font: "Noto Serif SC".to_string(),
            lang: "zh-CN".to_string(),
            margin: "1in".to_string(),
            pdf_engine: "xelatex".to_string(),
            markdown_from: "gfm".to_string(),
            rst_from: "rst".to_string(),
            extra: vec![],
        }
    }
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            cleanup_extensions: vec![".aux".to_string(), ".log".to_string(), ".out".to_string()],
            log_tail_lines: 30,
        }
    }
}

/// Identifiers of the built-in formats, reserved for `pandoc.extra`
const BUILTIN_FORMAT_IDS: &[&str] = &["tex", "md", "rst", "typ"];

impl DocBatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.general.thread_percentage == 0 || self.general.thread_percentage > 100 {
            anyhow::bail!(
                "general.thread_percentage must be between 1 and 100 (got {})",
                self.general.thread_percentage
            );
        }

        if self.general.output_dir.trim().is_empty() {
            anyhow::bail!("general.output_dir cannot be empty");
        }

        for ext in &self.latex.cleanup_extensions {
            if !ext.starts_with('.') {
                anyhow::bail!("latex.cleanup_extensions entry '{ext}' must start with '.'");
            }
        }

        let mut seen: HashSet<&str> = BUILTIN_FORMAT_IDS.iter().copied().collect();
        for extra in &self.pandoc.extra {
            if extra.id.trim().is_empty() {
                anyhow::bail!("pandoc.extra entries need a non-empty id");
            }
            if !seen.insert(extra.id.as_str()) {
                anyhow::bail!("Duplicate format id '{}' in pandoc.extra", extra.id);
            }
            if extra.extension.len() < 2 || !extra.extension.starts_with('.') {
                anyhow::bail!(
                    "pandoc.extra '{}': extension '{}' must look like '.ext'",
                    extra.id,
                    extra.extension
                );
            }
            if extra.source_format.trim().is_empty() {
                anyhow::bail!("pandoc.extra '{}': source_format cannot be empty", extra.id);
            }
        }

        Ok(())
    }

    /// Effective per-job timeout
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.general.timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.general.timeout_secs))
    }
}
