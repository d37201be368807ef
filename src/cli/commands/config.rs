use anyhow::Result;
use clap::{Args, Subcommand};
use std::process::ExitCode;

use super::GlobalOptions;
use crate::backend::FormatRegistry;
use crate::cli::Output;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: toml, json
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the merged configuration
    Validate,
}

pub async fn execute(args: ConfigArgs, global: &GlobalOptions, output: &Output) -> Result<ExitCode> {
    match args.command {
        ConfigCommand::Show { format } => {
            let config = global.load_config(None)?;
            let rendered = match format.to_lowercase().as_str() {
                "toml" => toml::to_string_pretty(&config)?,
                "json" => serde_json::to_string_pretty(&config)?,
                _ => anyhow::bail!("Unsupported format: {}. Use toml or json", format),
            };
            println!("{}", rendered.trim_end());
        }
        ConfigCommand::Validate => {
            let config = global.load_config(None)?;
            let registry = FormatRegistry::from_config(&config);
            output.success("Configuration is valid");
            output.key_value("Output directory:", &config.general.output_dir, false);
            output.key_value("Clean before run:", &config.general.clean.to_string(), false);
            let jobs = match config.general.jobs {
                0 => format!("auto ({}% of CPU cores)", config.general.thread_percentage),
                n => n.to_string(),
            };
            output.key_value("Jobs:", &jobs, false);
            let formats: Vec<&str> = registry.iter().map(|format| format.id.as_str()).collect();
            output.key_value("Formats:", &formats.join(", "), true);
        }
    }

    Ok(ExitCode::SUCCESS)
}
