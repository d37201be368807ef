//! Post-processing: remove LaTeX auxiliary files from an output tree.

use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::backend::PostProcessHook;

/// What a cleanup pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub deleted: usize,
    /// Files that matched but could not be removed
    pub failed: Vec<PathBuf>,
}

/// Deletes every file under the output root whose name ends with one of
/// the configured extensions.
#[derive(Debug, Clone)]
pub struct AuxFileCleanup {
    extensions: Vec<String>,
}

impl AuxFileCleanup {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    fn is_auxiliary(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.extensions.iter().any(|ext| name.ends_with(ext.as_str())))
    }
}

impl PostProcessHook for AuxFileCleanup {
    fn run(&self, output_root: &Path) -> CleanupSummary {
        let mut summary = CleanupSummary::default();
        if !output_root.is_dir() {
            tracing::debug!("Nothing to clean, {} does not exist", output_root.display());
            return summary;
        }

        let mut builder = WalkBuilder::new(output_root);
        builder.standard_filters(false).follow_links(false);

        for entry in builder.build().filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            if !is_file || !self.is_auxiliary(path) {
                continue;
            }

            match std::fs::remove_file(path) {
                Ok(()) => {
                    tracing::trace!("Deleted {}", path.display());
                    summary.deleted += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete {}: {}", path.display(), e);
                    summary.failed.push(path.to_path_buf());
                }
            }
        }

        if summary.deleted == 0 && summary.failed.is_empty() {
            tracing::info!("No auxiliary files to clean under {}", output_root.display());
        } else {
            tracing::info!("Deleted {} auxiliary files under {}", summary.deleted, output_root.display());
        }
        summary
    }
}
