//! Command-line overrides merged as the highest-priority configuration layer.
//!
//! Unset fields are skipped during serialization so they never mask values
//! coming from files or the environment.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    pub general: GeneralOverrides,
    pub pandoc: PandocOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneralOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PandocOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}
