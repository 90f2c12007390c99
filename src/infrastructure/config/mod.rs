use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use validator::Validate;

pub const DEFAULT_CONFIG_FILE: &str = "readiness.toml";
pub const ENV_PREFIX: &str = "READINESS_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub log_filter: String,
    #[validate(nested)]
    pub output: OutputConfig,
    #[validate(nested)]
    pub normalizer: NormalizerConfig,
    #[validate(nested)]
    pub csv: CsvConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            output: OutputConfig::default(),
            normalizer: NormalizerConfig::default(),
            csv: CsvConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputConfig {
    #[validate(length(min = 1))]
    pub report_path: String,
    #[validate(length(min = 1))]
    pub drift_report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: "reports/report.md".to_string(),
            drift_report_path: "reports/drift.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Recovers a case id from a raw test name when the id column is blank.
    #[validate(length(min = 1))]
    pub case_id_pattern: String,
    /// Lowercase alias -> canonical status.
    pub status_aliases: BTreeMap<String, String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let aliases = [
            ("pass", "passed"),
            ("ok", "passed"),
            ("success", "passed"),
            ("fail", "failed"),
            ("failure", "failed"),
            ("skip", "skipped"),
            ("ignored", "skipped"),
            ("pending", "skipped"),
            ("errored", "error"),
            ("broken", "error"),
        ];
        Self {
            case_id_pattern: r"[A-Z][A-Z0-9]*-\d+".to_string(),
            status_aliases: aliases
                .into_iter()
                .map(|(alias, status)| (alias.to_string(), status.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CsvConfig {
    /// Single ASCII character; auto-detected when unset.
    #[validate(length(equal = 1))]
    pub delimiter: Option<String>,
    pub trim: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvConfig {
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        match self.delimiter.as_deref() {
            None => Ok(None),
            Some(d) if d.len() == 1 && d.is_ascii() => Ok(d.bytes().next()),
            Some(d) => Err(AppError::ConfigError(format!(
                "csv.delimiter must be a single ASCII character, got '{}'",
                d
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `READINESS_*` environment variables.
    ///
    /// An explicit path must exist; the default `readiness.toml` is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let file: PathBuf = match explicit {
            Some(path) if !path.is_file() => {
                return Err(AppError::NotFound(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = Self::from_figment(figment)?;
        tracing::debug!(config_file = %file.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.check()?;
        Ok(config)
    }

    /// Field-level validation plus the checks derive attributes cannot express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        Regex::new(&self.normalizer.case_id_pattern).map_err(|e| {
            AppError::ConfigError(format!("normalizer.case_id_pattern is not a valid regex: {}", e))
        })?;
        self.csv.delimiter_byte()?;
        for (alias, status) in &self.normalizer.status_aliases {
            if !matches!(status.as_str(), "passed" | "failed" | "skipped" | "error") {
                return Err(AppError::ConfigError(format!(
                    "normalizer.status_aliases.{} maps to unknown status '{}'",
                    alias, status
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn from_toml(content: &str) -> Result<AppConfig> {
        AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default()))
                .merge(Toml::string(content)),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.output.report_path, "reports/report.md");
        assert_eq!(config.normalizer.status_aliases["ok"], "passed");
        assert_eq!(config.csv.delimiter_byte().unwrap(), None);
    }

    #[test]
    fn test_toml_overrides_nested_values() {
        let config = from_toml(
            r#"
            log_filter = "debug"
            [output]
            report_path = "out/r.md"
            [csv]
            delimiter = ";"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.output.report_path, "out/r.md");
        assert_eq!(config.output.drift_report_path, "reports/drift.md");
        assert_eq!(config.csv.delimiter_byte().unwrap(), Some(b';'));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for content in [
            "log_filter = \"\"",
            "[csv]\ndelimiter = \";;\"",
            "[normalizer]\ncase_id_pattern = \"(\"",
            "[normalizer.status_aliases]\nyes = \"green\"",
        ] {
            let err = from_toml(content).unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)), "{}: {:?}", content, err);
        }
    }

    #[test]
    fn test_explicit_missing_file_is_not_found() {
        let err = AppConfig::load(Some(Path::new("/no/such/readiness.toml"))).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_load_explicit_file() {
        let file = toml_file("[output]\ndrift_report_path = \"x/drift.md\"\n");
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.output.drift_report_path, "x/drift.md");
    }
}
