//! Configuration types for a digest run.
//!
//! [`DigestConfig`] is loaded from TOML. Every section uses `#[serde(default)]`
//! so a partial file (or no file at all) yields a working configuration.
//! API keys are never stored here; see [`Credentials`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use webdigest_search::SearchConfig;

use crate::error::{DigestError, Result};
use crate::llm::anthropic::DEFAULT_ANTHROPIC_MODEL;
use crate::llm::openai::DEFAULT_OPENAI_MODEL;

/// Recency windows, in days, a run may use.
pub const ALLOWED_RECENCY_DAYS: [u32; 5] = [7, 14, 30, 60, 90];

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Aggregation pipeline settings.
    pub pipeline: PipelineConfig,
    /// Search provider settings.
    pub search: SearchConfig,
    /// Model provider settings.
    pub model: ModelConfig,
}

impl DigestConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DigestError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DigestError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/webdigest/config.toml`.
    ///
    /// `WEBDIGEST_CONFIG_DIR` overrides the directory.
    pub fn default_config_path() -> PathBuf {
        if let Some(dir) = std::env::var_os("WEBDIGEST_CONFIG_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        dirs::config_dir()
            .map(|d| d.join("webdigest"))
            .unwrap_or_else(|| PathBuf::from("/tmp/webdigest-config"))
            .join("config.toml")
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.effective_search()
            .validate()
            .map_err(|e| DigestError::Config(format!("search: {e}")))?;
        self.model.validate()
    }

    /// Search settings with the pipeline's recency window and strictness applied.
    pub fn effective_search(&self) -> SearchConfig {
        SearchConfig {
            recency_days: self.pipeline.recency_days.days(),
            strict: self.pipeline.strict,
            ..self.search.clone()
        }
    }
}

/// A recency window restricted to [`ALLOWED_RECENCY_DAYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RecencyWindow(u32);

impl RecencyWindow {
    /// Window length in days.
    pub fn days(self) -> u32 {
        self.0
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self(30)
    }
}

impl TryFrom<u32> for RecencyWindow {
    type Error = String;

    fn try_from(days: u32) -> std::result::Result<Self, Self::Error> {
        if ALLOWED_RECENCY_DAYS.contains(&days) {
            Ok(Self(days))
        } else {
            Err(format!(
                "recency_days must be one of {ALLOWED_RECENCY_DAYS:?}, got {days}"
            ))
        }
    }
}

impl From<RecencyWindow> for u32 {
    fn from(window: RecencyWindow) -> Self {
        window.0
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}

/// Aggregation pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Only sources published within this many days are kept.
    pub recency_days: RecencyWindow,
    /// Maximum sources summarised (5 to 30).
    pub max_sources: usize,
    /// Search rounds (1 to 3). 1 disables query expansion.
    pub rounds: u8,
    /// Stricter filtering: drops non-web URLs and sanitises expanded queries.
    pub strict: bool,
    /// Sources summarised concurrently.
    pub summarize_concurrency: usize,
    /// Deadline for each external call, in seconds.
    pub call_timeout_seconds: u64,
    /// Output budget for the digest completion.
    pub digest_max_tokens: u32,
    /// Characters of page text given to the summariser.
    pub page_text_chars: usize,
    /// Round-one results used to seed query expansion.
    pub seed_snippets: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            recency_days: RecencyWindow::default(),
            max_sources: 12,
            rounds: 2,
            strict: true,
            summarize_concurrency: 4,
            call_timeout_seconds: 60,
            digest_max_tokens: 1200,
            page_text_chars: 5000,
            seed_snippets: 8,
        }
    }
}

impl PipelineConfig {
    /// Validate ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Config`] for the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        if !(5..=30).contains(&self.max_sources) {
            return Err(DigestError::Config(format!(
                "max_sources must be between 5 and 30, got {}",
                self.max_sources
            )));
        }
        if !(1..=3).contains(&self.rounds) {
            return Err(DigestError::Config(format!(
                "rounds must be between 1 and 3, got {}",
                self.rounds
            )));
        }
        if self.summarize_concurrency == 0 {
            return Err(DigestError::Config(
                "summarize_concurrency must be at least 1".into(),
            ));
        }
        if self.call_timeout_seconds == 0 {
            return Err(DigestError::Config(
                "call_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.digest_max_tokens == 0 {
            return Err(DigestError::Config(
                "digest_max_tokens must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Hosted model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// OpenAI Chat Completions.
    #[default]
    OpenAi,
    /// Anthropic Messages.
    Anthropic,
}

impl ModelProvider {
    /// Default model name for this provider.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }

    /// Environment variable holding this provider's key.
    pub fn key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Anthropic => f.write_str("anthropic"),
        }
    }
}

/// Model provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Which provider to call.
    pub provider: ModelProvider,
    /// Model name. `None` uses the provider default.
    pub model: Option<String>,
    /// Custom API base URL.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output budget for structured completions.
    pub json_max_tokens: u32,
    /// Transport timeout per request, in seconds.
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            model: None,
            base_url: None,
            temperature: 0.2,
            json_max_tokens: crate::llm::DEFAULT_JSON_MAX_TOKENS,
            timeout_seconds: 60,
        }
    }
}

impl ModelConfig {
    /// Configured model name, or the provider default.
    pub fn model_name(&self) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.provider.default_model())
            .to_owned()
    }

    /// Validate ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Config`] for the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DigestError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.json_max_tokens == 0 {
            return Err(DigestError::Config(
                "json_max_tokens must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// API keys for the collaborators.
///
/// Read once by the binary and passed into constructors.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Brave Search subscription token.
    pub brave_api_key: Option<String>,
    /// OpenAI API key.
    pub openai_api_key: Option<String>,
    /// Anthropic API key.
    pub anthropic_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("brave_api_key", &self.brave_api_key.as_ref().map(|_| "<set>"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "<set>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Read `BRAVE_API_KEY`, `OPENAI_API_KEY` and `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        Self {
            brave_api_key: read("BRAVE_API_KEY"),
            openai_api_key: read("OPENAI_API_KEY"),
            anthropic_api_key: read("ANTHROPIC_API_KEY"),
        }
    }

    /// The search key.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Config`] when it is missing.
    pub fn search_key(&self) -> Result<&str> {
        self.brave_api_key.as_deref().ok_or_else(|| {
            DigestError::Config("BRAVE_API_KEY not set; use --demo or provide an API key".into())
        })
    }

    /// The key for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Config`] when it is missing.
    pub fn model_key(&self, provider: ModelProvider) -> Result<&str> {
        let key = match provider {
            ModelProvider::OpenAi => self.openai_api_key.as_deref(),
            ModelProvider::Anthropic => self.anthropic_api_key.as_deref(),
        };
        key.ok_or_else(|| DigestError::Config(format!("{} not set", provider.key_env())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DigestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.recency_days.days(), 30);
        assert_eq!(config.pipeline.max_sources, 12);
        assert_eq!(config.pipeline.rounds, 2);
        assert!(config.pipeline.strict);
    }

    #[test]
    fn recency_window_accepts_only_allowed_values() {
        for days in ALLOWED_RECENCY_DAYS {
            assert!(RecencyWindow::try_from(days).is_ok());
        }
        assert!(RecencyWindow::try_from(0).is_err());
        assert!(RecencyWindow::try_from(45).is_err());
    }

    #[test]
    fn invalid_recency_in_toml_rejected() {
        let result: std::result::Result<DigestConfig, _> =
            toml::from_str("[pipeline]\nrecency_days = 45\n");
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: DigestConfig = toml::from_str(
            "[pipeline]\nrecency_days = 7\nrounds = 3\n\n[model]\nprovider = \"anthropic\"\n",
        )
        .expect("parse");
        assert_eq!(config.pipeline.recency_days.days(), 7);
        assert_eq!(config.pipeline.rounds, 3);
        assert_eq!(config.pipeline.max_sources, 12);
        assert_eq!(config.model.provider, ModelProvider::Anthropic);
        assert_eq!(config.model.model_name(), DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(config.search.count, 20);
    }

    #[test]
    fn max_sources_range_enforced() {
        let mut config = DigestConfig::default();
        config.pipeline.max_sources = 4;
        assert!(config.validate().is_err());
        config.pipeline.max_sources = 31;
        assert!(config.validate().is_err());
        config.pipeline.max_sources = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rounds_range_enforced() {
        let mut config = PipelineConfig::default();
        config.rounds = 0;
        assert!(config.validate().is_err());
        config.rounds = 4;
        assert!(config.validate().is_err());
        config.rounds = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_search_section_reported() {
        let mut config = DigestConfig::default();
        config.search.count = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("search"));
    }

    #[test]
    fn effective_search_follows_pipeline() {
        let mut config = DigestConfig::default();
        config.pipeline.recency_days = RecencyWindow::try_from(14).expect("allowed");
        config.pipeline.strict = false;
        let search = config.effective_search();
        assert_eq!(search.recency_days, 14);
        assert!(!search.strict);
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<ModelProvider>(), Ok(ModelProvider::OpenAi));
        assert_eq!(" anthropic ".parse::<ModelProvider>(), Ok(ModelProvider::Anthropic));
        assert!("gemini".parse::<ModelProvider>().is_err());
    }

    #[test]
    fn model_name_falls_back_to_provider_default() {
        let mut config = ModelConfig::default();
        assert_eq!(config.model_name(), DEFAULT_OPENAI_MODEL);
        config.model = Some("  ".into());
        assert_eq!(config.model_name(), DEFAULT_OPENAI_MODEL);
        config.model = Some("gpt-4o".into());
        assert_eq!(config.model_name(), "gpt-4o");
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let creds = Credentials::default();
        assert!(matches!(creds.search_key(), Err(DigestError::Config(_))));
        let err = creds.model_key(ModelProvider::Anthropic).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn credentials_debug_hides_values() {
        let creds = Credentials {
            brave_api_key: Some("brave-secret".into()),
            openai_api_key: Some("sk-secret".into()),
            anthropic_api_key: None,
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("brave-secret"));
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut config = DigestConfig::default();
        config.pipeline.rounds = 3;
        config.model.provider = ModelProvider::Anthropic;
        config.save_to_file(&path).expect("save");

        let loaded = DigestConfig::from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");
        assert!(matches!(
            DigestConfig::from_file(&path),
            Err(DigestError::Config(_))
        ));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = DigestConfig::default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
