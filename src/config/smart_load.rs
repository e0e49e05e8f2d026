use figment::providers::{Format, Json, Toml, Yaml};
use std::path::Path;

/// Smart configuration file loader that chooses the right format based on file extension
/// Returns a provider that can be directly used with figment.merge()
pub fn auto<P: AsRef<Path>>(path: P) -> impl figment::Provider {
    let path = path.as_ref();
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "toml" => SmartProvider::Toml(Toml::file(path)),
        "json" => SmartProvider::Json(Json::file(path)),
        "yaml" | "yml" => SmartProvider::Yaml(Yaml::file(path)),
        _ => {
            // Unknown extension: sniff the content, default to TOML
            let detected = std::fs::read_to_string(path)
                .ok()
                .and_then(|content| detect_format_from_content(&content));
            tracing::debug!(
                "Config {} has no known extension, detected format: {:?}",
                path.display(),
                detected
            );
            match detected {
                Some(ConfigFormat::Json) => SmartProvider::Json(Json::file(path)),
                Some(ConfigFormat::Yaml) => SmartProvider::Yaml(Yaml::file(path)),
                _ => SmartProvider::Toml(Toml::file(path)),
            }
        }
    }
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

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        match self {
            SmartProvider::Toml(p) => p.data(),
            SmartProvider::Json(p) => p.data(),
            SmartProvider::Yaml(p) => p.data(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

/// Attempt to detect configuration format from file content
fn detect_format_from_content(content: &str) -> Option<ConfigFormat> {
    let trimmed = content.trim();

    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.contains('='))
    {
        return Some(ConfigFormat::Json);
    }

    // TOML before YAML: a `[section]` header or `key = value` is unambiguous
    if trimmed.lines().any(|line| {
        let line = line.trim();
        (line.starts_with('[') && line.ends_with(']')) || (line.contains('=') && !line.contains(':'))
    }) {
        return Some(ConfigFormat::Toml);
    }

    if trimmed.contains("---")
        || trimmed.lines().any(|line| {
            let line = line.trim();
            line.contains(':') && !line.starts_with('#')
        })
    {
        return Some(ConfigFormat::Yaml);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format_from_content(r#"{"key": "value"}"#), Some(ConfigFormat::Json));
        assert_eq!(detect_format_from_content("key: value"), Some(ConfigFormat::Yaml));
        assert_eq!(detect_format_from_content("[section]\nkey = value"), Some(ConfigFormat::Toml));
        assert_eq!(detect_format_from_content("key = value"), Some(ConfigFormat::Toml));
        assert_eq!(detect_format_from_content(""), None);
    }
}
