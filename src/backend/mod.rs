//! Compiler backends and the format registry
//!
//! A backend is an external executable (`xelatex`, `typst`, `pandoc`) that
//! turns one source file into one PDF. Each format pairs a file extension
//! with a [`CommandBuilder`] strategy and an optional [`PostProcessHook`].
//! New formats are added by registering another [`FormatConfig`] value.
//!
//! The registry order is the auto-detection tie-break: when a directory
//! name contains keywords of several formats, the earliest format wins.
//!
//! ```text
//! tex  ["latex", "tex"]       TeX       .tex   xelatex
//! md   ["markdown", "md"]     Markdown  .md    pandoc --from=gfm
//! rst  ["rst", "rest"]        RST       .rst   pandoc --from=rst
//! typ  ["typst", "typ"]       Typst     .typ   typst compile
//! ...  pandoc.extra entries, in configuration order
//! ```

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::compile::cleanup::{AuxFileCleanup, CleanupSummary};
use crate::compile::executor::run_captured;
use crate::compile::CompileTask;
use crate::config::DocBatchConfig;

pub mod latex;
pub mod pandoc;
pub mod typst;

pub use latex::LatexBuilder;
pub use pandoc::PandocBuilder;
pub use typst::TypstBuilder;

/// Maps one task to the argument vector of its backend process.
///
/// Implementations are pure: no I/O, same input gives the same vector.
pub trait CommandBuilder: Send + Sync {
    /// Executable looked up on `PATH`
    fn executable(&self) -> &str;

    /// Full argument vector, executable first
    fn build(&self, input_path: &Path, output_path: &Path, working_dir: &Path) -> Vec<OsString>;

    /// Backend log worth quoting when a job fails
    fn diagnostic_log(&self, _task: &CompileTask) -> Option<PathBuf> {
        None
    }
}

/// Cleanup step run once after every job of a format has finished
pub trait PostProcessHook: Send + Sync {
    fn run(&self, output_root: &Path) -> CleanupSummary;
}

/// Static description of one document format
#[derive(Clone)]
pub struct FormatConfig {
    /// Identifier used on the command line
    pub id: String,
    /// Human readable label for progress lines and reports
    pub label: String,
    /// Case-sensitive file name suffix, e.g. `.tex`
    pub extension: String,
    /// Lower-case directory name keywords for auto detection
    pub keywords: Vec<String>,
    pub builder: Arc<dyn CommandBuilder>,
    pub post_process: Option<Arc<dyn PostProcessHook>>,
}

impl std::fmt::Debug for FormatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatConfig")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("extension", &self.extension)
            .field("keywords", &self.keywords)
            .field("executable", &self.builder.executable())
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}

impl FormatConfig {
    pub fn new(
        id: &str,
        label: &str,
        extension: &str,
        keywords: &[&str],
        builder: Arc<dyn CommandBuilder>,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            extension: extension.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            builder,
            post_process: None,
        }
    }

    pub fn with_post_process(mut self, hook: Arc<dyn PostProcessHook>) -> Self {
        self.post_process = Some(hook);
        self
    }

    /// Case-insensitive substring match of any keyword against `dir_name`
    pub fn matches_dir_name(&self, dir_name: &str) -> bool {
        let lower = dir_name.to_lowercase();
        self.keywords.iter().any(|keyword| lower.contains(keyword.as_str()))
    }
}

/// Ordered set of formats known to a run
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<FormatConfig>,
}

impl FormatRegistry {
    /// Built-in formats followed by `pandoc.extra`
    pub fn from_config(config: &DocBatchConfig) -> Self {
        let pandoc = &config.pandoc;
        let pandoc_builder = |source_format: &str| {
            Arc::new(PandocBuilder::new(source_format, &pandoc.font)
                .with_pdf_engine(&pandoc.pdf_engine)
                .with_lang(&pandoc.lang)
                .with_margin(&pandoc.margin))
        };

        let mut registry = Self::default();
        registry.register(
            FormatConfig::new("tex", "TeX", ".tex", &["latex", "tex"], Arc::new(LatexBuilder))
                .with_post_process(Arc::new(AuxFileCleanup::new(config.latex.cleanup_extensions.clone()))),
        );
        registry.register(FormatConfig::new(
            "md",
            "Markdown",
            ".md",
            &["markdown", "md"],
            pandoc_builder(&pandoc.markdown_from),
        ));
        registry.register(FormatConfig::new(
            "rst",
            "RST",
            ".rst",
            &["rst", "rest"],
            pandoc_builder(&pandoc.rst_from),
        ));
        registry.register(FormatConfig::new("typ", "Typst", ".typ", &["typst", "typ"], Arc::new(TypstBuilder)));

        for extra in &pandoc.extra {
            let label = if extra.label.is_empty() { extra.id.as_str() } else { extra.label.as_str() };
            let keywords: Vec<&str> = extra.keywords.iter().map(String::as_str).collect();
            registry.register(FormatConfig::new(
                &extra.id,
                label,
                &extra.extension,
                &keywords,
                pandoc_builder(&extra.source_format),
            ));
        }

        registry
    }

    pub fn register(&mut self, format: FormatConfig) {
        self.formats.push(format);
    }

    pub fn get(&self, id: &str) -> Option<&FormatConfig> {
        self.formats.iter().find(|format| format.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatConfig> {
        self.formats.iter()
    }

    /// First format, in registry order, whose keywords occur in `dir_name`
    pub fn detect(&self, dir_name: &str) -> Option<&FormatConfig> {
        self.formats.iter().find(|format| format.matches_dir_name(dir_name))
    }

    /// Every keyword in detection order, for guidance messages
    pub fn all_keywords(&self) -> Vec<&str> {
        self.formats
            .iter()
            .flat_map(|format| format.keywords.iter().map(String::as_str))
            .collect()
    }
}

/// Pre-flight check: resolve a backend executable on `PATH`
pub fn locate_backend(executable: &str) -> Result<PathBuf> {
    which::which(executable)
        .with_context(|| format!("Backend executable '{executable}' not found on PATH"))
}

/// Availability details for `docbatch check`
#[derive(Debug, Clone)]
pub struct BackendStatus {
    pub executable: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

impl BackendStatus {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Locate `executable` and read the first line of `--version`
pub fn probe_backend(executable: &str, timeout: Duration) -> BackendStatus {
    let path = locate_backend(executable).ok();
    let version = path.as_ref().and_then(|_| {
        let command = [OsString::from(executable), OsString::from("--version")];
        match run_captured(&command, Some(timeout)) {
            Ok(output) => output
                .stdout
                .lines()
                .chain(output.stderr.lines())
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string),
            Err(e) => {
                tracing::warn!("'{executable} --version' failed: {e}");
                None
            }
        }
    });

    BackendStatus {
        executable: executable.to_string(),
        path,
        version,
    }
}
