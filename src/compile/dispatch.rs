//! Auto mode: pick a format for every subdirectory of a parent directory
//! by keywords in the subdirectory name.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::pipeline::{CompileOptions, run_format};
use crate::backend::{FormatConfig, FormatRegistry};
use crate::report::{FormatReport, RunReport};

/// Immediate subdirectories of `parent`, split into detected and
/// unrecognized, both sorted by name.
pub fn detect_subdirectories<'r>(
    parent: &Path,
    registry: &'r FormatRegistry,
) -> Result<(Vec<(PathBuf, &'r FormatConfig)>, Vec<PathBuf>)> {
    let entries = std::fs::read_dir(parent)
        .with_context(|| format!("Cannot read directory {}", parent.display()))?;

    let mut subdirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    let mut detected = Vec::new();
    let mut unrecognized = Vec::new();
    for dir in subdirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match registry.detect(&name) {
            Some(format) => {
                tracing::debug!("{} -> {}", name, format.label);
                detected.push((dir, format));
            }
            None => {
                tracing::debug!("{} matches no format", name);
                unrecognized.push(dir);
            }
        }
    }

    Ok((detected, unrecognized))
}

/// Run a full pipeline for every detected subdirectory of `parent`.
///
/// `on_format` sees each format report as soon as it is done. Only an
/// unreadable `parent` is an error.
pub fn auto_run<F>(parent: &Path, registry: &FormatRegistry, options: &CompileOptions, mut on_format: F) -> Result<RunReport>
where
    F: FnMut(&FormatReport),
{
    let started = Instant::now();
    let (detected, unrecognized) = detect_subdirectories(parent, registry)?;

    for dir in &unrecognized {
        tracing::info!("Skipping unrecognized directory {}", dir.display());
    }

    let mut report = RunReport {
        unrecognized,
        ..Default::default()
    };

    if detected.is_empty() {
        tracing::info!(
            "No format subdirectories found in {}; expected names containing one of: {}",
            parent.display(),
            registry.all_keywords().join(", ")
        );
    }

    for (dir, format) in detected {
        let format_report = run_format(format, &dir, options);
        on_format(&format_report);
        report.push(format_report);
    }

    report.total_seconds = started.elapsed().as_secs_f64();
    Ok(report)
}
