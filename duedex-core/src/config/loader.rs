//! Configuration loader supporting YAML, TOML and JSON.

use super::traits::{Configurable, Validatable};
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml)
    #[default]
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "yaml" | "yml" => Some(Self::Yaml),
                "toml" => Some(Self::Toml),
                "json" => Some(Self::Json),
                _ => None,
            })
    }
}

/// Configuration loader with format detection and environment overrides.
///
/// ```rust,ignore
/// use duedex_core::config::{ClientConfig, ConfigLoader};
///
/// let config: ClientConfig = ConfigLoader::new()
///     .with_env_prefix("DUEDEX")
///     .load_file("duedex.yaml")?;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: Option<String>,
    validate: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that validates and applies no environment overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_prefix: None,
            validate: true,
        }
    }

    /// Sets the environment variable prefix for overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets whether to validate the configuration after loading.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Loads, overrides and validates configuration from a file.
    ///
    /// The format is detected from the file extension.
    pub fn load_file<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Configurable + Validatable,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason: "Unrecognized file extension. Supported: .yaml, .yml, .toml, .json".to_string(),
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = Self::parse(&content, format).map_err(|e| match e {
            ConfigError::InvalidFormat { reason, .. } => ConfigError::InvalidFormat {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        self.finish(config)
    }

    /// Loads, overrides and validates configuration from a string.
    pub fn load_str<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Configurable + Validatable,
    {
        let config = Self::parse(content, format)?;
        self.finish(config)
    }

    /// Parses content without overrides or validation.
    pub fn parse<T>(content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let invalid = |kind: &str, e: &dyn std::fmt::Display| ConfigError::InvalidFormat {
            path: "<string>".to_string(),
            reason: format!("{kind} parse error: {e}"),
        };
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| invalid("YAML", &e)),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| invalid("TOML", &e)),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| invalid("JSON", &e)),
        }
    }

    fn finish<T>(&self, mut config: T) -> Result<T, ConfigError>
    where
        T: Configurable + Validatable,
    {
        if let Some(prefix) = &self.env_prefix {
            config.apply_env_overrides(prefix)?;
        }
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Sample {
        host: String,
        port: u16,
    }

    impl Validatable for Sample {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.port == 0 {
                return Err(ConfigError::invalid_value("port", "must be non-zero"));
            }
            Ok(())
        }
    }

    impl Configurable for Sample {
        fn apply_env_overrides(&mut self, _prefix: &str) -> Result<(), ConfigError> {
            Ok(())
        }

        fn env_var_names(_prefix: &str) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("client.yml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("client.TOML")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("client.ini")), None);
    }

    #[test]
    fn test_load_each_format() {
        let loader = ConfigLoader::new();
        let yaml: Sample = loader
            .load_str("host: localhost\nport: 8080\n", ConfigFormat::Yaml)
            .unwrap();
        let toml: Sample = loader
            .load_str("host = \"localhost\"\nport = 8080\n", ConfigFormat::Toml)
            .unwrap();
        let json: Sample = loader
            .load_str(r#"{"host": "localhost", "port": 8080}"#, ConfigFormat::Json)
            .unwrap();
        for sample in [yaml, toml, json] {
            assert_eq!(sample.host, "localhost");
            assert_eq!(sample.port, 8080);
        }
    }

    #[test]
    fn test_validation_runs() {
        let result: Result<Sample, _> =
            ConfigLoader::new().load_str("host: x\nport: 0\n", ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result: Result<Sample, _> = ConfigLoader::new()
            .with_validation(false)
            .load_str("host: x\nport: 0\n", ConfigFormat::Yaml);
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_file_reports_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{not json").unwrap();

        let result: Result<Sample, _> = ConfigLoader::new().load_file(file.path());
        match result {
            Err(ConfigError::InvalidFormat { path, reason }) => {
                assert_eq!(path, file.path().display().to_string());
                assert!(reason.starts_with("JSON"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_extension() {
        let result: Result<Sample, _> = ConfigLoader::new().load_file("client.ini");
        assert!(matches!(result, Err(ConfigError::InvalidFormat { .. })));
    }
}
