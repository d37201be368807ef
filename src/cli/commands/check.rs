use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::time::Duration;

use super::{GlobalOptions, run_blocking};
use crate::backend::{BackendStatus, FormatRegistry, probe_backend};
use crate::cli::Output;

const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Args, Default)]
pub struct CheckArgs {}

pub async fn execute(_args: CheckArgs, global: &GlobalOptions, output: &Output) -> Result<ExitCode> {
    let config = global.load_config(None)?;
    let registry = FormatRegistry::from_config(&config);

    // executable -> labels of the formats that use it
    let mut backends: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for format in registry.iter() {
        backends
            .entry(format.builder.executable().to_string())
            .or_default()
            .push(format.label.clone());
    }

    output.header("Backend availability");

    let executables: Vec<String> = backends.keys().cloned().collect();
    let statuses: Vec<BackendStatus> = run_blocking(move || {
        executables
            .iter()
            .map(|exe| probe_backend(exe, VERSION_PROBE_TIMEOUT))
            .collect()
    })
    .await?;

    let mut missing = 0;
    for status in &statuses {
        let formats = backends.get(&status.executable).map(|labels| labels.join(", ")).unwrap_or_default();
        match &status.path {
            Some(path) => {
                output.success(&format!("{} ({})", status.executable, formats));
                output.key_value("Path:", &path.display().to_string(), false);
                if let Some(version) = &status.version {
                    output.key_value("Version:", version, true);
                }
            }
            None => {
                missing += 1;
                output.error(&format!("{} not found on PATH ({} unavailable)", status.executable, formats));
            }
        }
    }

    if missing > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        output.success("All backends available");
        Ok(ExitCode::SUCCESS)
    }
}
