//! Startup configuration for the assistant.
//!
//! Built once from defaults, the settings file and environment variables,
//! then handed to the registry and detector. Nothing here is global.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use url::Url;

use crate::assist::detector::{DEFAULT_DETECTOR_TIMEOUT, DEFAULT_DETECTOR_URL};
use crate::assist::registry::ModelBindings;
use crate::utils::settings::Settings;

/// Environment variable selecting the model provider.
pub const ENV_PROVIDER: &str = "CODE_ASSIST_PROVIDER";
/// Environment variable overriding the provider base URL.
pub const ENV_BASE_URL: &str = "CODE_ASSIST_BASE_URL";
/// Environment variables holding the provider API key, in priority order.
pub const ENV_API_KEYS: &[&str] = &["CODE_ASSIST_API_KEY", "OPENAI_API_KEY"];
/// Environment variable overriding the explanation model.
pub const ENV_EXPLANATION_MODEL: &str = "CODE_ASSIST_EXPLANATION_MODEL";
/// Environment variable overriding the generation model.
pub const ENV_GENERATION_MODEL: &str = "CODE_ASSIST_GENERATION_MODEL";
/// Environment variable overriding the translation model.
pub const ENV_TRANSLATION_MODEL: &str = "CODE_ASSIST_TRANSLATION_MODEL";
/// Environment variable overriding the default model.
pub const ENV_DEFAULT_MODEL: &str = "CODE_ASSIST_DEFAULT_MODEL";
/// Environment variable overriding the detector endpoint.
pub const ENV_DETECTOR_URL: &str = "CODE_ASSIST_DETECTOR_URL";
/// Environment variable overriding the detector timeout in seconds.
pub const ENV_DETECTOR_TIMEOUT: &str = "CODE_ASSIST_DETECTOR_TIMEOUT_SECS";
/// Environment variable setting a model deadline in seconds.
pub const ENV_MODEL_TIMEOUT: &str = "CODE_ASSIST_MODEL_TIMEOUT_SECS";

/// Backend serving the models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ProviderKind {
    /// Ollama's native generate API.
    #[default]
    #[serde(rename = "ollama")]
    Ollama,
    /// Any OpenAI-compatible chat completions API.
    #[serde(rename = "openai")]
    OpenAi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => bail!("Unknown provider '{other}', expected 'ollama' or 'openai'"),
        }
    }
}

/// Language detection endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorConfig {
    /// Classifier URL.
    pub endpoint: String,
    /// Request bound in seconds.
    pub timeout_secs: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DETECTOR_URL.to_string(),
            timeout_secs: DEFAULT_DETECTOR_TIMEOUT.as_secs(),
        }
    }
}

impl DetectorConfig {
    /// Returns the request bound.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Everything the assistant needs at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistConfig {
    /// Model backend.
    pub provider: ProviderKind,
    /// Backend base URL; the provider default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Bearer token for the backend.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model bound to each task kind.
    pub models: ModelBindings,
    /// Model for unrecognised task kinds; the explanation model when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Language detection endpoint.
    pub detector: DetectorConfig,
    /// Deadline for a single model invocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_timeout_secs: Option<u64>,
    /// Maximum in-flight requests per model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_requests: Option<usize>,
}

impl AssistConfig {
    /// Loads configuration from the default settings file and environment.
    pub fn load() -> Result<Self> {
        let settings = Settings::load()?;
        Self::from_settings(&settings)
    }

    /// Builds configuration from loaded settings plus the environment.
    ///
    /// Environment variables win over the settings file's `env` map, which
    /// wins over its `assist` section.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut config = settings.assist.clone().unwrap_or_default();
        config.apply_overrides(|key| settings.get_env_var(key))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, keyed by the `CODE_ASSIST_*` names.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = value(ENV_PROVIDER) {
            self.provider = provider
                .parse()
                .with_context(|| format!("Invalid {ENV_PROVIDER}"))?;
        }
        if let Some(base_url) = value(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }
        if let Some(api_key) = ENV_API_KEYS.iter().copied().find_map(|key| value(key)) {
            self.api_key = Some(api_key);
        }
        if let Some(model) = value(ENV_EXPLANATION_MODEL) {
            self.models.explanation = model;
        }
        if let Some(model) = value(ENV_GENERATION_MODEL) {
            self.models.generation = model;
        }
        if let Some(model) = value(ENV_TRANSLATION_MODEL) {
            self.models.translation = model;
        }
        if let Some(model) = value(ENV_DEFAULT_MODEL) {
            self.default_model = Some(model);
        }
        if let Some(endpoint) = value(ENV_DETECTOR_URL) {
            self.detector.endpoint = endpoint;
        }
        if let Some(secs) = value(ENV_DETECTOR_TIMEOUT) {
            self.detector.timeout_secs = parse_secs(ENV_DETECTOR_TIMEOUT, &secs)?;
        }
        if let Some(secs) = value(ENV_MODEL_TIMEOUT) {
            self.model_timeout_secs = Some(parse_secs(ENV_MODEL_TIMEOUT, &secs)?);
        }
        Ok(())
    }

    /// Rejects configurations the assistant cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (kind, model) in [
            ("explanation", &self.models.explanation),
            ("generation", &self.models.generation),
            ("translation", &self.models.translation),
        ] {
            if model.trim().is_empty() {
                bail!("Model for {kind} must not be empty");
            }
        }
        if let Some(model) = &self.default_model {
            if model.trim().is_empty() {
                bail!("Default model must not be empty");
            }
        }
        check_http_url("Detector endpoint", &self.detector.endpoint)?;
        if let Some(base_url) = &self.base_url {
            check_http_url("Provider base URL", base_url)?;
        }
        if self.detector.timeout_secs == 0 {
            bail!("Detector timeout must be at least one second");
        }
        if self.model_timeout_secs == Some(0) {
            bail!("Model timeout must be at least one second");
        }
        if let Some(limit) = self.max_concurrent_requests {
            if limit == 0 {
                bail!("maxConcurrentRequests must be at least 1");
            }
            if limit > Semaphore::MAX_PERMITS {
                bail!(
                    "maxConcurrentRequests must be at most {}",
                    Semaphore::MAX_PERMITS
                );
            }
        }
        Ok(())
    }

    /// Returns the model used for unrecognised task kinds.
    pub fn default_model(&self) -> &str {
        self.default_model
            .as_deref()
            .unwrap_or(&self.models.explanation)
    }

    /// Returns the model invocation deadline, if any.
    pub fn model_timeout(&self) -> Option<Duration> {
        self.model_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got '{value}'"))
}

fn check_http_url(what: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("{what} is not a valid URL: {value}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{what} must use http or https: {value}");
    }
    Ok(())
}
