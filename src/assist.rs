//! Model-output extraction and task orchestration.

pub mod ai;
pub mod detector;
pub mod error;
pub mod extract;
pub mod language;
pub mod prompts;
pub mod registry;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ai::ollama::OllamaAiClient;
pub use ai::openai::OpenAiAiClient;
pub use ai::{AiClient, AiClientMetadata};
pub use detector::{HttpLanguageDetector, LanguageDetector};
pub use error::{AssistError, DetectionError, ExtractionError, ModelError};
pub use extract::{extract_code, passthrough};
pub use language::LanguageLabel;
pub use registry::{ModelBindings, ModelHandle, ModelRegistry, TaskKind};
pub use tasks::{CodeAssistant, Explanation, GeneratedCode, TaskRequest, TaskResult, Translation};
