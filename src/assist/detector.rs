//! Client for the remote language classification service.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assist::error::DetectionError;
use crate::assist::language::LanguageLabel;

/// Classifier endpoint used when none is configured.
pub const DEFAULT_DETECTOR_URL: &str = "http://ai.easv.dk:8989/tools/langrecog/";

/// Bound on a single classification call.
pub const DEFAULT_DETECTOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can name the language of a code snippet.
pub trait LanguageDetector: Send + Sync {
    /// Classifies `code`, reporting why when no label could be obtained.
    fn try_detect<'a>(
        &'a self,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LanguageLabel, DetectionError>> + Send + 'a>>;

    /// Classifies `code`, collapsing every failure to `Unknown`.
    ///
    /// Never fails; the cause is logged at `warn`.
    fn detect<'a>(
        &'a self,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = LanguageLabel> + Send + 'a>> {
        Box::pin(async move {
            match self.try_detect(code).await {
                Ok(label) => label,
                Err(e) => {
                    warn!(error = %e, "Language detection failed, using Unknown");
                    LanguageLabel::Unknown
                }
            }
        })
    }
}

#[derive(Serialize, Debug)]
struct DetectionRequest<'a> {
    codesnippet: &'a str,
    language: &'a str,
}

#[derive(Deserialize, Debug)]
struct DetectionResponse {
    #[serde(default)]
    language: Option<String>,
}

/// HTTP client for the classification endpoint.
pub struct HttpLanguageDetector {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpLanguageDetector {
    /// Creates a detector posting to `endpoint` with the given bound.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build language detection HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    async fn classify(&self, code: &str) -> Result<LanguageLabel, DetectionError> {
        let snippet = code.trim();
        if snippet.is_empty() {
            return Err(DetectionError::EmptyInput);
        }

        let request = DetectionRequest {
            codesnippet: snippet,
            language: "",
        };

        debug!(endpoint = %self.endpoint, snippet_len = snippet.len(), "Sending language detection request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;
        debug!(status = %status, response = %body, "Language detection response");

        if !status.is_success() {
            return Err(DetectionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DetectionResponse = serde_json::from_str(&body)
            .map_err(|e| DetectionError::InvalidResponse(e.to_string()))?;

        Ok(LanguageLabel::from(parsed.language))
    }

    fn transport_error(&self, e: &reqwest::Error) -> DetectionError {
        if e.is_timeout() {
            DetectionError::Timeout(self.timeout)
        } else {
            DetectionError::Network(e.to_string())
        }
    }
}

impl LanguageDetector for HttpLanguageDetector {
    fn try_detect<'a>(
        &'a self,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LanguageLabel, DetectionError>> + Send + 'a>> {
        Box::pin(self.classify(code))
    }
}
