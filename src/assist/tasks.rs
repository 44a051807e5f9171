//! Explain, generate and translate orchestration.
//!
//! Each operation runs detect → select model → build prompt → invoke →
//! extract, and reports every failure as an [`AssistError`]. Nothing else
//! escapes these functions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assist::detector::{HttpLanguageDetector, LanguageDetector};
use crate::assist::error::AssistError;
use crate::assist::extract::{extract_code, passthrough};
use crate::assist::language::LanguageLabel;
use crate::assist::prompts;
use crate::assist::registry::{ModelRegistry, TaskKind};
use crate::config::AssistConfig;

/// A single unit of work for the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    /// Explain what `code` does.
    Explain {
        /// Snippet to explain.
        code: String,
    },
    /// Write `language` code for `description`.
    Generate {
        /// What the code should do.
        description: String,
        /// Language to write it in.
        language: String,
    },
    /// Port `code` to `target_language`.
    Translate {
        /// Snippet to translate.
        code: String,
        /// Language to translate into.
        target_language: String,
    },
}

impl TaskRequest {
    /// Returns the task kind used for model selection.
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Explain { .. } => TaskKind::Explanation,
            Self::Generate { .. } => TaskKind::Generation,
            Self::Translate { .. } => TaskKind::Translation,
        }
    }
}

/// Result of an explanation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    /// Detected language of the snippet.
    pub language: LanguageLabel,
    /// The model's explanation, trimmed.
    pub explanation: String,
}

/// Result of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCode {
    /// Requested language.
    pub language: String,
    /// Code isolated from the completion.
    pub generated_code: String,
}

/// Result of a translation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    /// Detected language of the input.
    #[serde(rename = "input_language")]
    pub source_language: LanguageLabel,
    /// Requested language.
    pub target_language: String,
    /// Code isolated from the completion.
    pub translated_code: String,
}

/// Outcome of [`CodeAssistant::run`].
///
/// Serialises with the field names of the HTTP API: a failure is just
/// `{"error": ...}` with no partial result fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskResult {
    /// Explanation succeeded.
    Explanation(Explanation),
    /// Generation succeeded.
    GeneratedCode(GeneratedCode),
    /// Translation succeeded.
    Translation(Translation),
    /// The request failed.
    Failed {
        /// Human-readable reason.
        error: String,
    },
}

impl TaskResult {
    /// Returns `true` for [`TaskResult::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<AssistError> for TaskResult {
    fn from(error: AssistError) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }
}

/// Coordinates the detector, model registry, prompts and extractor.
pub struct CodeAssistant {
    registry: ModelRegistry,
    detector: Arc<dyn LanguageDetector>,
    model_timeout: Option<Duration>,
}

impl CodeAssistant {
    /// Creates an assistant over the given collaborators.
    pub fn new(registry: ModelRegistry, detector: Arc<dyn LanguageDetector>) -> Self {
        Self {
            registry,
            detector,
            model_timeout: None,
        }
    }

    /// Bounds every model invocation by `timeout`.
    #[must_use]
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = Some(timeout);
        self
    }

    /// Builds an assistant from validated configuration.
    pub fn from_config(config: &AssistConfig) -> Result<Self> {
        let registry = ModelRegistry::from_config(config)?;
        let detector = HttpLanguageDetector::new(
            config.detector.endpoint.clone(),
            config.detector.timeout(),
        )?;
        let assistant = Self::new(registry, Arc::new(detector));
        Ok(match config.model_timeout() {
            Some(timeout) => assistant.with_model_timeout(timeout),
            None => assistant,
        })
    }

    /// Explains `code`, tagging the result with its detected language.
    ///
    /// A failed detection is not fatal; the language is reported as
    /// `Unknown`.
    pub async fn explain_code(&self, code: &str) -> Result<Explanation, AssistError> {
        let language = self.detector.detect(code).await;
        info!(language = %language, "Explaining code");

        let prompt = prompts::explanation_prompt(&language, code);
        let raw = self.invoke(TaskKind::Explanation, &prompt).await?;

        Ok(Explanation {
            language,
            explanation: passthrough(&raw),
        })
    }

    /// Generates `language` code for `description`.
    pub async fn generate_code(
        &self,
        description: &str,
        language: &str,
    ) -> Result<GeneratedCode, AssistError> {
        let language = language.trim();
        if language.is_empty() {
            return Err(AssistError::MissingLanguage);
        }
        info!(language = %language, "Generating code");

        let prompt = prompts::generation_prompt(language, description);
        let raw = self.invoke(TaskKind::Generation, &prompt).await?;

        let generated_code = extract_code(&raw, None).map_err(|e| {
            warn!(error = %e, raw_len = raw.len(), "Could not extract generated code");
            AssistError::from(e)
        })?;

        Ok(GeneratedCode {
            language: language.to_string(),
            generated_code,
        })
    }

    /// Translates `code` into `target_language`.
    ///
    /// Fails without calling the model when the target is blank or the
    /// source language cannot be detected.
    pub async fn translate_code(
        &self,
        code: &str,
        target_language: &str,
    ) -> Result<Translation, AssistError> {
        let target_language = target_language.trim();
        if target_language.is_empty() {
            return Err(AssistError::MissingLanguage);
        }
        let source_language = self.detector.detect(code).await;
        if source_language.is_unknown() {
            warn!("Refusing to translate: source language unknown");
            return Err(AssistError::UnknownSourceLanguage);
        }
        info!(source = %source_language, target = %target_language, "Translating code");

        let prompt = prompts::translation_prompt(&source_language, target_language, code);
        let raw = self.invoke(TaskKind::Translation, &prompt).await?;

        let target = LanguageLabel::new(target_language);
        let translated_code = extract_code(&raw, Some(&target)).map_err(|e| {
            warn!(error = %e, raw_len = raw.len(), "Could not extract translated code");
            AssistError::from(e)
        })?;

        Ok(Translation {
            source_language,
            target_language: target_language.to_string(),
            translated_code,
        })
    }

    /// Runs any request, folding failures into [`TaskResult::Failed`].
    pub async fn run(&self, request: TaskRequest) -> TaskResult {
        let outcome = match &request {
            TaskRequest::Explain { code } => {
                self.explain_code(code).await.map(TaskResult::Explanation)
            }
            TaskRequest::Generate {
                description,
                language,
            } => self
                .generate_code(description, language)
                .await
                .map(TaskResult::GeneratedCode),
            TaskRequest::Translate {
                code,
                target_language,
            } => self
                .translate_code(code, target_language)
                .await
                .map(TaskResult::Translation),
        };
        outcome.unwrap_or_else(|e| {
            debug!(task = %request.kind(), error = %e, "Task failed");
            e.into()
        })
    }

    async fn invoke(&self, kind: TaskKind, prompt: &str) -> Result<String, AssistError> {
        let handle = self.registry.select_kind(kind);
        debug!(task = %kind, model = %handle.model(), prompt_len = prompt.len(), "Invoking model");

        let completion = match self.model_timeout {
            Some(limit) => tokio::time::timeout(limit, handle.complete(prompt))
                .await
                .map_err(|_| {
                    warn!(task = %kind, ?limit, "Model invocation timed out");
                    AssistError::ModelTimeout(limit)
                })?,
            None => handle.complete(prompt).await,
        };

        completion.map_err(|e| {
            let reason = format!("{e:#}");
            warn!(task = %kind, error = %reason, "Model invocation failed");
            AssistError::ModelInvocation(reason)
        })
    }
}
