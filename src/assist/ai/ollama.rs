//! Native Ollama client using the `/api/generate` endpoint.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    build_http_client, check_error_response, endpoint_url, log_response_success, AiClient,
    AiClientMetadata,
};
use crate::assist::error::ModelError;

/// Default address of a local Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama generate request body.
#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Ollama generate response body.
#[derive(Deserialize, Debug)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Client for a model served by Ollama.
pub struct OllamaAiClient {
    /// HTTP client for API requests
    client: Client,
    /// Model identifier
    model: String,
    /// Base URL, e.g. "http://localhost:11434"
    base_url: String,
}

impl OllamaAiClient {
    /// Creates a client for `model`, defaulting to the local server.
    pub fn new(model: String, base_url: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
        })
    }

    fn get_api_url(&self) -> String {
        let url = endpoint_url(&self.base_url, "/api/generate");
        debug!(base_url = %self.base_url, full_url = %url, "Constructed Ollama API URL");
        url
    }
}

impl AiClient for OllamaAiClient {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                prompt_len = prompt.len(),
                model = %self.model,
                "Preparing Ollama generate request"
            );

            let request = GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            };

            let api_url = self.get_api_url();
            info!(url = %api_url, model = %self.model, "Sending request to Ollama");

            let response = self
                .client
                .post(&api_url)
                .json(&request)
                .send()
                .await
                .map_err(|e| ModelError::NetworkError(e.to_string()))?;

            let response = check_error_response(response).await?;

            let body: GenerateResponse = response
                .json()
                .await
                .map_err(|e| ModelError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                model = ?body.model,
                eval_count = ?body.eval_count,
                "Received Ollama response"
            );

            let result = Ok(body.response);
            log_response_success("Ollama", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Ollama".to_string(),
            model: self.model.clone(),
        }
    }
}
