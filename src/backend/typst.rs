//! Typst backend: explicit input and output, no auxiliary files.

use std::ffi::OsString;
use std::path::Path;

use super::CommandBuilder;

#[derive(Debug, Clone, Copy, Default)]
pub struct TypstBuilder;

impl CommandBuilder for TypstBuilder {
    fn executable(&self) -> &str {
        "typst"
    }

    fn build(&self, input_path: &Path, output_path: &Path, _working_dir: &Path) -> Vec<OsString> {
        vec![
            OsString::from(self.executable()),
            OsString::from("compile"),
            input_path.as_os_str().to_os_string(),
            output_path.as_os_str().to_os_string(),
        ]
    }
}
