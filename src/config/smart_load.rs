use figment::providers::{Format, Json, Toml, Yaml};
use std::path::Path;

/// Pick a figment provider for a config file from its extension.
///
/// Files with an unknown extension are sniffed; anything unrecognised is
/// read as TOML.
pub fn auto<P: AsRef<Path>>(path: P) -> impl figment::Provider {
    let path = path.as_ref();
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "toml" => SmartProvider::Toml(Toml::file(path)),
        "json" => SmartProvider::Json(Json::file(path)),
        "yaml" | "yml" => SmartProvider::Yaml(Yaml::file(path)),
        _ => match std::fs::read_to_string(path).ok().and_then(|c| detect_format_from_content(&c)) {
            Some(ConfigFormat::Json) => SmartProvider::Json(Json::file(path)),
            Some(ConfigFormat::Yaml) => SmartProvider::Yaml(Yaml::file(path)),
            Some(ConfigFormat::Toml) | None => {
                tracing::debug!("Reading {} as TOML", path.display());
                SmartProvider::Toml(Toml::file(path))
            }
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

/// Wrapper enum to handle different provider types
enum SmartProvider {
    Toml(figment::providers::Data<Toml>),
    Json(figment::providers::Data<Json>),
    Yaml(figment::providers::Data<Yaml>),
}

impl figment::Provider for SmartProvider {
    fn metadata(&self) -> figment::Metadata {
        match self {
            SmartProvider::Toml(p) => p.metadata(),
            SmartProvider::Json(p) => p.metadata(),
            SmartProvider::Yaml(p) => p.metadata(),
        }
    }

    fn data(&self) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        match self {
            SmartProvider::Toml(p) => p.data(),
            SmartProvider::Json(p) => p.data(),
            SmartProvider::Yaml(p) => p.data(),
        }
    }
}

fn detect_format_from_content(content: &str) -> Option<ConfigFormat> {
    let trimmed = content.trim();

    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.contains('\n'))
    {
        return Some(ConfigFormat::Json);
    }

    // TOML section headers or `key = value`
    if trimmed.lines().any(|line| {
        let line = line.trim();
        (line.starts_with('[') && line.ends_with(']')) || (line.contains('=') && !line.contains(':'))
    }) {
        return Some(ConfigFormat::Toml);
    }

    if trimmed.starts_with("---") || trimmed.lines().any(|line| line.trim().contains(": ") || line.trim().ends_with(':')) {
        return Some(ConfigFormat::Yaml);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Figment;

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format_from_content(r#"{"general": {"jobs": 2}}"#), Some(ConfigFormat::Json));
        assert_eq!(detect_format_from_content("general:\n  jobs: 2"), Some(ConfigFormat::Yaml));
        assert_eq!(detect_format_from_content("[general]\njobs = 2"), Some(ConfigFormat::Toml));
        assert_eq!(detect_format_from_content("jobs = 2"), Some(ConfigFormat::Toml));
        assert_eq!(detect_format_from_content("   "), None);
    }

    #[test]
    fn test_sniffed_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docbatch.conf");
        std::fs::write(&path, "general:\n  jobs: 5\n").unwrap();

        let jobs: usize = Figment::new().merge(auto(&path)).extract_inner("general.jobs").unwrap();
        assert_eq!(jobs, 5);
    }
}
