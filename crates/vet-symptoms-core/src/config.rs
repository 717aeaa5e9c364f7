//! Service configuration, loaded from TOML.
//!
//! Every key has a default, so an empty file (or no file at all) gives a
//! working configuration that reads `dataset.csv` from the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::DEFAULT_FUZZY_THRESHOLD;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Record table (CSV)
    pub dataset_path: PathBuf,
    /// Extra symptom terms (JSON object) merged over the embedded table
    pub dictionary_path: Option<PathBuf>,
    /// Minimum similarity for fuzzy token matching
    pub fuzzy_threshold: f64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_filter: String,
    pub speech: SpeechConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset.csv"),
            dictionary_path: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            log_filter: "info".to_string(),
            speech: SpeechConfig::default(),
        }
    }
}

/// Speech input/output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Directory for generated audio files
    pub audio_dir: PathBuf,
    /// Prefix of returned audio URLs
    pub url_prefix: String,
    /// Synthesis language code
    pub output_language: String,
    /// Transcription language hint
    pub input_language: String,
    /// When false, responses never carry audio
    pub enabled: bool,
    /// Per-request timeout for the synthesis backend
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("audio"),
            url_prefix: "/audio".to_string(),
            output_language: "ta".to_string(),
            input_language: "ta-IN".to_string(),
            enabled: true,
            timeout_secs: 10,
        }
    }
}

impl ServiceConfig {
    /// Load and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_threshold must be within 0.0..=1.0, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.speech.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "speech.timeout_secs must be positive".to_string(),
            ));
        }
        if self.speech.output_language.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "speech.output_language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.dataset_path, PathBuf::from("dataset.csv"));
        assert_eq!(config.fuzzy_threshold, 0.8);
        assert_eq!(config.speech.url_prefix, "/audio");
        assert!(config.speech.enabled);
    }

    #[test]
    fn test_partial_config() {
        let config = ServiceConfig::from_toml_str(
            r#"
dataset_path = "/srv/vet/dataset.csv"
fuzzy_threshold = 0.9

[speech]
enabled = false
"#,
        )
        .unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("/srv/vet/dataset.csv"));
        assert_eq!(config.fuzzy_threshold, 0.9);
        assert!(!config.speech.enabled);
        assert_eq!(config.speech.output_language, "ta");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = ServiceConfig::from_toml_str("fuzzy_threshold = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ServiceConfig::from_toml_str("dataset_path = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        let mut config = ServiceConfig::default();
        config.dictionary_path = Some(dir.path().join("extra.json"));
        fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(ServiceConfig::load(&path).unwrap(), config);
    }
}
