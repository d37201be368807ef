//! LaTeX backend (`xelatex`)
//!
//! xelatex writes `.aux`, `.log` and `.out` files next to the PDF, so it is
//! pointed at the task's output directory instead of a single output file.
//! The PDF lands at `<working_dir>/<stem>.pdf`, which is exactly the task's
//! `output_path`; the auxiliary files are removed by the format's cleanup hook.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::CommandBuilder;
use crate::compile::CompileTask;

#[derive(Debug, Clone, Copy, Default)]
pub struct LatexBuilder;

impl CommandBuilder for LatexBuilder {
    fn executable(&self) -> &str {
        "xelatex"
    }

    fn build(&self, input_path: &Path, _output_path: &Path, working_dir: &Path) -> Vec<OsString> {
        let mut output_directory = OsString::from("-output-directory=");
        output_directory.push(working_dir);

        vec![
            OsString::from(self.executable()),
            OsString::from("-interaction=nonstopmode"),
            output_directory,
            input_path.as_os_str().to_os_string(),
        ]
    }

    fn diagnostic_log(&self, task: &CompileTask) -> Option<PathBuf> {
        let stem = task.input_path.file_stem()?;
        let mut log_name = stem.to_os_string();
        log_name.push(".log");
        Some(task.working_dir.join(log_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latex_targets_directory() {
        let args = LatexBuilder.build(
            Path::new("src/a/x.tex"),
            Path::new("out/a/x.pdf"),
            Path::new("out/a"),
        );
        assert_eq!(
            args,
            vec!["xelatex", "-interaction=nonstopmode", "-output-directory=out/a", "src/a/x.tex"]
        );
    }

    #[test]
    fn test_latex_diagnostic_log_path() {
        let task = CompileTask::new("src/a/x.tex", "out/a/x.pdf", "out/a");
        assert_eq!(LatexBuilder.diagnostic_log(&task), Some(PathBuf::from("out/a/x.log")));
    }
}
