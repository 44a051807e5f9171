//! Shared test utilities for the `assist` module.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::assist::ai::{AiClient, AiClientMetadata};
use crate::assist::detector::LanguageDetector;
use crate::assist::error::DetectionError;
use crate::assist::language::LanguageLabel;

/// Mock AI client with a pre-programmed queue of completions.
///
/// Completions are returned in FIFO order. When the queue is exhausted,
/// subsequent calls return `Err("no more mock responses")`.
///
/// Every call to [`complete`](AiClient::complete) records the prompt so
/// tests can inspect what was dispatched. Use
/// [`prompt_handle`](Self::prompt_handle) to keep a handle after the client
/// has been moved into a [`ModelHandle`](super::registry::ModelHandle).
pub(crate) struct ConfigurableMockAiClient {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    metadata: AiClientMetadata,
    recorded_prompts: Arc<Mutex<Vec<String>>>,
}

impl ConfigurableMockAiClient {
    /// Creates a new mock client that will return the given responses in order.
    pub(crate) fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            metadata: AiClientMetadata {
                provider: "Mock".to_string(),
                model: "mock-model".to_string(),
            },
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the mock with a different reported model id.
    pub(crate) fn with_model(mut self, model: &str) -> Self {
        self.metadata.model = model.to_string();
        self
    }

    /// Returns a handle for inspecting which prompts were sent.
    pub(crate) fn prompt_handle(&self) -> PromptRecordHandle {
        PromptRecordHandle {
            recorded_prompts: self.recorded_prompts.clone(),
        }
    }
}

/// Shared handle to a mock client's recorded prompts.
pub(crate) struct PromptRecordHandle {
    recorded_prompts: Arc<Mutex<Vec<String>>>,
}

impl PromptRecordHandle {
    /// Returns all recorded prompts.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.recorded_prompts.lock().unwrap().clone()
    }

    /// Returns the number of model requests that were made.
    pub(crate) fn request_count(&self) -> usize {
        self.recorded_prompts.lock().unwrap().len()
    }
}

impl AiClient for ConfigurableMockAiClient {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let responses = self.responses.clone();
        let recorded = self.recorded_prompts.clone();
        let prompt = prompt.to_string();
        Box::pin(async move {
            recorded.lock().unwrap().push(prompt);
            responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no more mock responses")))
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        self.metadata.clone()
    }
}

/// Detector returning a fixed outcome and counting calls.
pub(crate) struct FixedDetector {
    outcome: Result<LanguageLabel, fn() -> DetectionError>,
    calls: Arc<Mutex<usize>>,
}

impl FixedDetector {
    /// Detector that always answers `language`.
    pub(crate) fn answering(language: &str) -> Self {
        Self {
            outcome: Ok(LanguageLabel::new(language)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Detector that always fails with the error built by `error`.
    pub(crate) fn failing(error: fn() -> DetectionError) -> Self {
        Self {
            outcome: Err(error),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns a shared counter of detection calls.
    pub(crate) fn call_counter(&self) -> Arc<Mutex<usize>> {
        self.calls.clone()
    }
}

impl LanguageDetector for FixedDetector {
    fn try_detect<'a>(
        &'a self,
        _code: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LanguageLabel, DetectionError>> + Send + 'a>> {
        *self.calls.lock().unwrap() += 1;
        let outcome = match &self.outcome {
            Ok(label) => Ok(label.clone()),
            Err(make) => Err(make()),
        };
        Box::pin(async move { outcome })
    }
}
