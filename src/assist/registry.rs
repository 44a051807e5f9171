//! Task-kind to model bindings.
//!
//! The registry is built once from configuration at startup and is read-only
//! afterwards, so requests share it without locking.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::assist::ai::ollama::OllamaAiClient;
use crate::assist::ai::openai::OpenAiAiClient;
use crate::assist::ai::{AiClient, AiClientMetadata};
use crate::config::{AssistConfig, ProviderKind};

/// Model used for explanation and translation unless configured otherwise.
pub const DEFAULT_MODEL: &str = "codellama";

/// Model used for generation unless configured otherwise.
pub const DEFAULT_GENERATION_MODEL: &str = "deepseek-coder";

/// Sampling temperature sent to OpenAI-compatible backends.
const OPENAI_TEMPERATURE: f32 = 0.1;

/// The kind of work a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Explain what a snippet does.
    Explanation,
    /// Write code from a description.
    Generation,
    /// Port a snippet to another language.
    Translation,
}

impl TaskKind {
    /// All task kinds, in a stable order.
    pub const ALL: [Self; 3] = [Self::Explanation, Self::Generation, Self::Translation];

    /// Returns the configuration key for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explanation => "explanation",
            Self::Generation => "generation",
            Self::Translation => "translation",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a string that names no task kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown task kind: {0}")]
pub struct UnknownTaskKind(pub String);

impl FromStr for TaskKind {
    type Err = UnknownTaskKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| UnknownTaskKind(s.to_string()))
    }
}

/// Model id bound to each task kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelBindings {
    /// Model used to explain code.
    pub explanation: String,
    /// Model used to generate code.
    pub generation: String,
    /// Model used to translate code.
    pub translation: String,
}

impl Default for ModelBindings {
    fn default() -> Self {
        Self {
            explanation: DEFAULT_MODEL.to_string(),
            generation: DEFAULT_GENERATION_MODEL.to_string(),
            translation: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ModelBindings {
    /// Returns the model id bound to `kind`.
    pub fn model_for(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Explanation => &self.explanation,
            TaskKind::Generation => &self.generation,
            TaskKind::Translation => &self.translation,
        }
    }
}

/// Shared reference to a model's completion capability.
///
/// Cloning is cheap. When a concurrency limit is set, callers beyond the
/// limit wait in FIFO order for a permit.
#[derive(Clone)]
pub struct ModelHandle {
    client: Arc<dyn AiClient>,
    permits: Option<Arc<Semaphore>>,
}

impl ModelHandle {
    /// Wraps a client with no concurrency limit.
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self {
            client,
            permits: None,
        }
    }

    /// Limits in-flight completions on this handle to `limit`.
    ///
    /// The limit is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);
        self.permits = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    /// Returns metadata of the underlying client.
    pub fn metadata(&self) -> AiClientMetadata {
        self.client.get_metadata()
    }

    /// Returns the backing model id.
    pub fn model(&self) -> String {
        self.metadata().model
    }

    /// Whether both handles share the same client.
    pub fn same_model(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.client, &other.client)
    }

    /// Sends `prompt` to the model, waiting for a permit if limited.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let _permit = match &self.permits {
            Some(permits) => Some(
                permits
                    .acquire()
                    .await
                    .context("Model request queue closed")?,
            ),
            None => None,
        };
        self.client.complete(prompt).await
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.metadata();
        f.debug_struct("ModelHandle")
            .field("provider", &meta.provider)
            .field("model", &meta.model)
            .field("limited", &self.permits.is_some())
            .finish()
    }
}

/// Immutable mapping from task kind to model handle.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    bindings: HashMap<TaskKind, ModelHandle>,
    default: ModelHandle,
}

impl ModelRegistry {
    /// Creates a registry where every kind resolves to `default`.
    pub fn new(default: ModelHandle) -> Self {
        Self {
            bindings: HashMap::new(),
            default,
        }
    }

    /// Binds `kind` to `handle`.
    #[must_use]
    pub fn bind(mut self, kind: TaskKind, handle: ModelHandle) -> Self {
        self.bindings.insert(kind, handle);
        self
    }

    /// Builds handles for each bound model id using `factory`.
    ///
    /// Each distinct model id is built once; kinds bound to the same id
    /// share a handle, and so does the default when its id is bound.
    pub fn from_bindings<F>(bindings: &ModelBindings, default_model: &str, mut factory: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<ModelHandle>,
    {
        let mut built: HashMap<String, ModelHandle> = HashMap::new();
        let mut handle_for = |model: &str| -> Result<ModelHandle> {
            if let Some(handle) = built.get(model) {
                return Ok(handle.clone());
            }
            let handle = factory(model)
                .with_context(|| format!("Failed to create client for model {model}"))?;
            built.insert(model.to_string(), handle.clone());
            Ok(handle)
        };

        let mut registry = Self::new(handle_for(default_model)?);
        for kind in TaskKind::ALL {
            let model = bindings.model_for(kind);
            registry = registry.bind(kind, handle_for(model)?);
            debug!(task = %kind, model = %model, "Bound task kind to model");
        }
        Ok(registry)
    }

    /// Builds the registry described by `config`.
    pub fn from_config(config: &AssistConfig) -> Result<Self> {
        let default_model = config.default_model();
        let registry = Self::from_bindings(&config.models, default_model, |model| {
            let client: Arc<dyn AiClient> = match config.provider {
                ProviderKind::Ollama => Arc::new(OllamaAiClient::new(
                    model.to_string(),
                    config.base_url.clone(),
                )?),
                ProviderKind::OpenAi => Arc::new(OpenAiAiClient::new(
                    model.to_string(),
                    config.api_key.clone(),
                    config.base_url.clone(),
                    Some(OPENAI_TEMPERATURE),
                )?),
            };
            let handle = ModelHandle::new(client);
            Ok(match config.max_concurrent_requests {
                Some(limit) => handle.with_concurrency_limit(limit),
                None => handle,
            })
        })?;
        info!(
            provider = %config.provider,
            explanation = %config.models.explanation,
            generation = %config.models.generation,
            translation = %config.models.translation,
            default = %default_model,
            "Model registry initialised"
        );
        Ok(registry)
    }

    /// Resolves a task kind name; unrecognised names get the default model.
    pub fn select(&self, task_kind: &str) -> ModelHandle {
        match task_kind.parse::<TaskKind>() {
            Ok(kind) => self.select_kind(kind),
            Err(e) => {
                debug!(error = %e, "Using default model");
                self.default.clone()
            }
        }
    }

    /// Resolves a task kind; unbound kinds get the default model.
    pub fn select_kind(&self, kind: TaskKind) -> ModelHandle {
        self.bindings
            .get(&kind)
            .unwrap_or(&self.default)
            .clone()
    }

    /// Returns the handle used for unrecognised task kinds.
    pub fn default_handle(&self) -> &ModelHandle {
        &self.default
    }
}
