use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::Serialize;
use std::path::Path;

use super::DocBatchConfig;
use super::smart_load;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

impl DocBatchConfig {
    /// Load the merged configuration and validate it
    pub fn load<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Result<Self> {
        let figment = Self::figment(custom_config, cli_overrides);

        let config: DocBatchConfig = figment
            .extract()
            .context("Failed to load docbatch configuration")?;
        config.validate()?;

        tracing::trace!("CONFIG LOAD: {:?}", config);
        Ok(config)
    }

    /// Build the layered figment, lowest priority first
    pub fn figment<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Figment {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            // User config - support multiple formats
            .merge(Toml::file(Self::user_config_path("toml")))
            .merge(Json::file(Self::user_config_path("json")))
            .merge(Yaml::file(Self::user_config_path("yaml")))
            .merge(Yaml::file(Self::user_config_path("yml")))
            // Project config - support multiple formats
            .merge(Toml::file("docbatch.toml"))
            .merge(Json::file("docbatch.json"))
            .merge(Yaml::file("docbatch.yaml"))
            .merge(Yaml::file("docbatch.yml"));

        if let Some(custom_path) = custom_config {
            if !Path::new(custom_path).exists() {
                tracing::warn!("Config file '{}' not found, ignoring it", custom_path);
            }
            figment = figment.merge(smart_load::auto(custom_path));
        }

        // Environment variables: DOCBATCH_GENERAL__JOBS=4
        figment = figment.merge(Env::prefixed("DOCBATCH_").split("__"));

        if let Some(cli) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(cli));
        }

        figment
    }

    fn user_config_path(extension: &str) -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/docbatch/config.{extension}"),
            Err(_) => format!("~/.config/docbatch/config.{extension}"),
        }
    }
}
