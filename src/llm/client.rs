//! Async HTTP chat client
//!
//! Model-agnostic client for the chat gateway. Speaks the Second Me local
//! chat API as well as Anthropic and OpenAI-compatible APIs (DeepSeek, etc).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{NationError, Result};
use crate::llm::gateway::{ChatGateway, ChatRequest, ChatRole};

const DEFAULT_API_URL: &str = "http://localhost:8002/api/kernel2/chat";

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    SecondMe,
    Anthropic,
    OpenAI,
}

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: Option<String>,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    pub fn new(api_key: Option<String>, api_url: String, model: Option<String>) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else if url.contains("/api/kernel2/") {
            ApiFormat::SecondMe
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Optional: LLM_API_URL (defaults to a local Second Me instance)
    /// Optional: LLM_API_KEY (required by Anthropic and OpenAI endpoints)
    /// Optional: LLM_MODEL
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let api_key = std::env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty());
        let model = std::env::var("LLM_MODEL").ok().filter(|m| !m.is_empty());

        let client = Self::new(api_key, api_url, model);
        if client.api_format != ApiFormat::SecondMe && client.api_key.is_none() {
            return Err(NationError::Gateway(format!(
                "LLM_API_KEY not set for {}",
                client.api_url
            )));
        }
        Ok(client)
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    async fn complete_second_me(&self, request: ChatRequest) -> Result<String> {
        let body = SecondMeRequest {
            messages: to_wire_messages(&request),
            stream: false,
            model: self.model.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self
            .client
            .post(&self.api_url)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NationError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(NationError::Gateway(format!("API error {}: {}", status, error_text)));
        }

        let completion: SecondMeResponse = response
            .json()
            .await
            .map_err(|e| NationError::Gateway(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| NationError::Gateway("Empty response".into()))
    }

    async fn complete_anthropic(&self, request: ChatRequest) -> Result<String> {
        // Anthropic takes the system prompt out of band
        let system = request
            .messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| Message {
                role: m.role.as_str().into(),
                content: m.content.clone(),
            })
            .collect();

        let body = AnthropicRequest {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| "claude-3-haiku-20240307".into()),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system,
            messages,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", self.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NationError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NationError::Gateway(format!("API error: {}", error_text)));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| NationError::Gateway(e.to_string()))?;

        completion
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| NationError::Gateway("Empty response".into()))
    }

    async fn complete_openai(&self, request: ChatRequest) -> Result<String> {
        let body = OpenAIRequest {
            model: self.model.clone().unwrap_or_else(|| "deepseek-chat".into()),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: to_wire_messages(&request),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.as_deref().unwrap_or_default()),
            )
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NationError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NationError::Gateway(format!("API error: {}", error_text)));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| NationError::Gateway(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| NationError::Gateway("Empty response".into()))
    }
}

#[async_trait]
impl ChatGateway for LlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        match self.api_format {
            ApiFormat::SecondMe => self.complete_second_me(request).await,
            ApiFormat::Anthropic => self.complete_anthropic(request).await,
            ApiFormat::OpenAI => self.complete_openai(request).await,
        }
    }
}

fn to_wire_messages(request: &ChatRequest) -> Vec<Message> {
    request
        .messages
        .iter()
        .map(|m| Message {
            role: m.role.as_str().into(),
            content: m.content.clone(),
        })
        .collect()
}

// Second Me local chat API
#[derive(Serialize)]
struct SecondMeRequest {
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct SecondMeResponse {
    choices: Vec<SecondMeChoice>,
}

#[derive(Deserialize)]
struct SecondMeChoice {
    delta: SecondMeDelta,
}

#[derive(Deserialize)]
struct SecondMeDelta {
    content: Option<String>,
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
