//! Pandoc backend shared by Markdown, reStructuredText and any format
//! declared under `pandoc.extra`.
//!
//! Variants differ only in the `--from` value; the font, language and margin
//! variables keep CJK text rendering correctly through the xelatex engine.

use std::ffi::OsString;
use std::path::Path;

use super::CommandBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PandocBuilder {
    source_format: String,
    font: String,
    pdf_engine: String,
    lang: String,
    margin: String,
}

impl PandocBuilder {
    pub fn new(source_format: &str, font: &str) -> Self {
        Self {
            source_format: source_format.to_string(),
            font: font.to_string(),
            pdf_engine: "xelatex".to_string(),
            lang: "zh-CN".to_string(),
            margin: "1in".to_string(),
        }
    }

    pub fn with_pdf_engine(mut self, pdf_engine: &str) -> Self {
        self.pdf_engine = pdf_engine.to_string();
        self
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    pub fn with_margin(mut self, margin: &str) -> Self {
        self.margin = margin.to_string();
        self
    }
}

impl CommandBuilder for PandocBuilder {
    fn executable(&self) -> &str {
        "pandoc"
    }

    fn build(&self, input_path: &Path, output_path: &Path, _working_dir: &Path) -> Vec<OsString> {
        vec![
            OsString::from(self.executable()),
            OsString::from(format!("--from={}", self.source_format)),
            input_path.as_os_str().to_os_string(),
            OsString::from("-o"),
            output_path.as_os_str().to_os_string(),
            OsString::from(format!("--pdf-engine={}", self.pdf_engine)),
            OsString::from("-V"),
            OsString::from(format!("mainfont={}", self.font)),
            OsString::from("-V"),
            OsString::from(format!("lang={}", self.lang)),
            OsString::from("-V"),
            OsString::from(format!("geometry:margin={}", self.margin)),
        ]
    }
}
