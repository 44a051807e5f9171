//! Chat-completions backend for OpenAI and servers that mimic its API.

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

/// Default address of the hosted OpenAI API.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// One chat turn.
#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Body of `POST /v1/chat/completions`.
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
}

/// Completion client for any `/v1/chat/completions` server.
///
/// The prompt is sent as a single user message.
pub struct OpenAiAiClient {
    client: Client,
    /// Bearer token; local servers usually need none.
    api_key: Option<String>,
    model: String,
    /// Server root, without the `/v1` suffix.
    base_url: String,
    temperature: Option<f32>,
}

impl OpenAiAiClient {
    /// Creates a client; `base_url` defaults to [`DEFAULT_OPENAI_URL`].
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        temperature: Option<f32>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            temperature,
        })
    }

    fn chat_url(&self) -> String {
        let url = endpoint_url(&self.base_url, "/v1/chat/completions");
        debug!(url = %url, "Resolved chat completions URL");
        url
    }
}

impl AiClient for OpenAiAiClient {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = ChatRequest {
                model: &self.model,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
                temperature: self.temperature,
                stream: false,
            };

            let url = self.chat_url();
            info!(model = %self.model, prompt_len = prompt.len(), "Requesting chat completion");

            let mut builder = self.client.post(&url).json(&request);
            if let Some(api_key) = &self.api_key {
                builder = builder.bearer_auth(api_key);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ModelError::NetworkError(e.to_string()))?;

            let response = check_error_response(response).await?;

            let body: ChatResponse = response
                .json()
                .await
                .map_err(|e| ModelError::InvalidResponseFormat(e.to_string()))?;

            debug!(choices = body.choices.len(), served_by = ?body.model, "Chat completion received");

            let result = body
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| {
                    ModelError::InvalidResponseFormat("No choices in response".to_string()).into()
                });

            log_response_success("OpenAI", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "OpenAI".to_string(),
            model: self.model.clone(),
        }
    }
}
