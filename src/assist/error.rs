//! Error types for the code-assist core.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by model provider clients.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Model API request failed with error message.
    #[error("Model API request failed: {0}")]
    ApiRequestFailed(String),

    /// Invalid response format from the model API.
    #[error("Invalid response format from model API: {0}")]
    InvalidResponseFormat(String),

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Reasons a language detection call did not yield a label.
///
/// These never reach callers of the public operations; the orchestrators
/// collapse them to [`LanguageLabel::Unknown`](super::language::LanguageLabel::Unknown)
/// after logging.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Nothing left to classify after trimming.
    #[error("Code snippet is empty")]
    EmptyInput,

    /// The classifier did not answer within the configured bound.
    #[error("Language detection timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure talking to the classifier.
    #[error("Language detection request failed: {0}")]
    Network(String),

    /// The classifier answered with a non-success status.
    #[error("Language detection returned HTTP {status}: {body}")]
    HttpStatus {
        /// Status code returned by the classifier.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The classifier answered with a body that is not the expected JSON.
    #[error("Invalid language detection response: {0}")]
    InvalidResponse(String),
}

/// Reasons no code could be isolated from a model completion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The completion contained no fence delimiter.
    #[error("No code block found in model output")]
    NoCodeBlock,

    /// The selected fenced block was empty after trimming.
    #[error("Code block in model output is empty")]
    EmptyBlock,
}

/// User-visible failures of the explain, generate and translate operations.
#[derive(Error, Debug)]
pub enum AssistError {
    /// Translation needs a known source language.
    #[error("Unable to detect source language.")]
    UnknownSourceLanguage,

    /// A requested language was blank.
    #[error("Language must not be empty.")]
    MissingLanguage,

    /// The model output held no isolable code block.
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    /// The model boundary itself failed.
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// The model did not answer before the configured deadline.
    #[error("Model invocation timed out after {0:?}")]
    ModelTimeout(Duration),
}

impl AssistError {
    /// Whether repeating the same request may succeed.
    ///
    /// Deadline expiry and backend failures are transient; an undetectable
    /// source language or an unusable completion for the same input is not
    /// something this core retries.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ModelInvocation(_) | Self::ModelTimeout(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_language_message() {
        assert_eq!(
            AssistError::UnknownSourceLanguage.to_string(),
            "Unable to detect source language."
        );
    }

    #[test]
    fn extraction_error_converts() {
        let err: AssistError = ExtractionError::NoCodeBlock.into();
        assert_eq!(err.to_string(), "No code block found in model output");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn missing_language_is_not_recoverable() {
        assert_eq!(
            AssistError::MissingLanguage.to_string(),
            "Language must not be empty."
        );
        assert!(!AssistError::MissingLanguage.is_recoverable());
    }

    #[test]
    fn timeouts_are_recoverable() {
        assert!(AssistError::ModelTimeout(Duration::from_secs(5)).is_recoverable());
        assert!(AssistError::ModelInvocation("down".to_string()).is_recoverable());
    }

    #[test]
    fn http_status_message_includes_body() {
        let err = DetectionError::HttpStatus {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Language detection returned HTTP 503: busy");
    }
}
