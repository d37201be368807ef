use serde::Serialize;
use std::path::{Path, PathBuf};

/// One source file to compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileTask {
    pub input_path: PathBuf,
    /// Target PDF; its parent mirrors the input's relative directory
    pub output_path: PathBuf,
    /// Directory the backend writes into, always `output_path`'s parent
    pub working_dir: PathBuf,
}

impl CompileTask {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Final path component of the input, used in status lines
    pub fn file_name(&self) -> String {
        display_name(&self.input_path)
    }
}

/// Outcome of one task; every task produces exactly one
#[derive(Debug, Clone, Serialize)]
pub struct CompileResult {
    pub file_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub success: bool,
    /// Wall-clock seconds from just before spawn to just after exit
    pub duration_seconds: f64,
    /// Backend exit status; `None` when it never ran to completion
    pub exit_code: Option<i32>,
    /// Captured stdout then stderr, plus any diagnostic notes
    pub log_text: String,
}

impl CompileResult {
    /// Failed result for a job that never produced an exit status
    pub fn failed(task: &CompileTask, duration_seconds: f64, log_text: impl Into<String>) -> Self {
        Self {
            file_name: task.file_name(),
            input_path: task.input_path.clone(),
            output_path: task.output_path.clone(),
            success: false,
            duration_seconds,
            exit_code: None,
            log_text: log_text.into(),
        }
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_no_exit_code() {
        let task = CompileTask::new("src/a/x.tex", "out/a/x.pdf", "out/a");
        let result = CompileResult::failed(&task, 0.5, "boom");
        assert_eq!(result.file_name, "x.tex");
        assert!(!result.success);
        assert!(result.exit_code.is_none());
        assert_eq!(result.log_text, "boom");
    }
}
