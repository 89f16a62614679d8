use std::env;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::engine_config::EngineConfig;
use crate::normalizer::{EngineError, EngineResult};

// LLM Provider enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum LLMProvider {
    Gemini,
    Anthropic,
    OpenRouter,
}

impl Default for LLMProvider {
    fn default() -> Self {
        LLMProvider::Gemini
    }
}

// Gemini API configuration
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

// Anthropic API configuration
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

// OpenRouter API configuration
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash-preview-05-20";

// Struct to hold the Gemini LLM response
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: String,
}

// Struct to hold the Anthropic LLM response
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
    #[serde(rename = "type")]
    content_type: String,
}

// Struct to hold the OpenRouter LLM response
#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<OpenRouterChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}

#[derive(Debug, Deserialize)]
struct OpenRouterMessage {
    content: String,
}

// LLM Provider implementation
pub struct LLMProviderImpl {
    provider_type: LLMProvider,
    client: Client,
    gemini_model: String,
    anthropic_model: String,
    openrouter_model: String,
}

impl LLMProviderImpl {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            provider_type: config.llm_provider.unwrap_or_default(),
            client: Client::new(),
            gemini_model: config
                .gemini_model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            anthropic_model: config
                .anthropic_model
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            openrouter_model: config
                .openrouter_model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
        }
    }

    /// The model identifier the active provider will be called with.
    pub fn model_name(&self) -> &str {
        match self.provider_type {
            LLMProvider::Gemini => &self.gemini_model,
            LLMProvider::Anthropic => &self.anthropic_model,
            LLMProvider::OpenRouter => &self.openrouter_model,
        }
    }

    pub fn provider_type(&self) -> LLMProvider {
        self.provider_type
    }

    /// Check the credential precondition without sending anything. The whole
    /// request chain refuses to start when this fails.
    pub fn check_credentials(&self) -> EngineResult<()> {
        let var = match self.provider_type {
            LLMProvider::Gemini => "GEMINI_API_KEY",
            LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
        };
        env::var(var)
            .map(|_| ())
            .map_err(|_| EngineError::Precondition(format!("{} environment variable not set", var)))
    }

    pub async fn send_prompt(&self, system_prompt: &str, user_prompt: &str) -> EngineResult<String> {
        match self.provider_type {
            LLMProvider::Gemini => self.send_gemini_prompt(system_prompt, user_prompt).await,
            LLMProvider::Anthropic => self.send_anthropic_prompt(system_prompt, user_prompt).await,
            LLMProvider::OpenRouter => self.send_openrouter_prompt(system_prompt, user_prompt).await,
        }
    }

    async fn send_gemini_prompt(&self, system_prompt: &str, user_prompt: &str) -> EngineResult<String> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| EngineError::Precondition("GEMINI_API_KEY environment variable not set".to_string()))?;

        // Gemini has no separate system role, so the prompts are combined
        let combined_prompt = format!("{}\n\n{}", system_prompt, user_prompt);

        let payload = json!({
            "contents": [
                {
                    "parts": [
                        {
                            "text": combined_prompt
                        }
                    ]
                }
            ]
        });

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_URL, self.gemini_model, api_key
        );
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let response = check_status(response)?;
        let response_body = response.json::<GeminiResponse>().await?;

        if let Some(candidate) = response_body.candidates.first() {
            if let Some(part) = candidate.content.parts.first() {
                return Ok(part.text.clone());
            }
        }

        Err(EngineError::EmptyResponse)
    }

    async fn send_anthropic_prompt(&self, system_prompt: &str, user_prompt: &str) -> EngineResult<String> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| EngineError::Precondition("ANTHROPIC_API_KEY environment variable not set".to_string()))?;

        let payload = json!({
            "model": self.anthropic_model,
            "system": system_prompt,
            "messages": [
                {
                    "role": "user",
                    "content": user_prompt
                }
            ],
            "max_tokens": 4096
        });

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let response = check_status(response)?;
        let response_body = response.json::<AnthropicResponse>().await?;

        if let Some(content) = response_body.content.first() {
            if content.content_type == "text" {
                return Ok(content.text.clone());
            }
        }

        Err(EngineError::EmptyResponse)
    }

    async fn send_openrouter_prompt(&self, system_prompt: &str, user_prompt: &str) -> EngineResult<String> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .map_err(|_| EngineError::Precondition("OPENROUTER_API_KEY environment variable not set".to_string()))?;

        let payload = json!({
            "model": self.openrouter_model,
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt
                },
                {
                    "role": "user",
                    "content": user_prompt
                }
            ]
        });

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let response = check_status(response)?;
        let response_body = response.json::<OpenRouterResponse>().await?;

        if let Some(choice) = response_body.choices.first() {
            return Ok(choice.message.content.clone());
        }

        Err(EngineError::EmptyResponse)
    }
}

// Rejected credentials are reported distinctly from other transport
// problems; both end in fallback substitution at the engine layer.
fn check_status(response: reqwest::Response) -> EngineResult<reqwest::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(EngineError::Auth(format!("provider rejected the API key ({})", status)));
    }
    Ok(response.error_for_status()?)
}

/// Strip exactly one surrounding markdown code fence, if present. Models
/// regularly wrap JSON in ```json ... ``` despite being told not to.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_prefix
        .strip_suffix("```")
        .unwrap_or(without_prefix)
        .trim()
}

/// Single parse attempt against the generation wire contract: fence-stripped
/// text must deserialize as JSON and carry the expected top-level key with an
/// array value. No retry and no repair beyond the fence strip.
pub fn parse_record_envelope(text: &str, expected_key: &str) -> EngineResult<Vec<Value>> {
    let parsed: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| EngineError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    match parsed.get(expected_key) {
        Some(Value::Array(records)) => Ok(records.clone()),
        Some(_) => Err(EngineError::MalformedResponse(format!(
            "top-level key '{}' is not an array",
            expected_key
        ))),
        None => Err(EngineError::MalformedResponse(format!(
            "top-level key '{}' missing",
            expected_key
        ))),
    }
}

/// Parse a step response that has no record envelope (the analysis step):
/// any JSON object is accepted.
pub fn parse_object(text: &str) -> EngineResult<Value> {
    let parsed: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| EngineError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if parsed.is_object() {
        Ok(parsed)
    } else {
        Err(EngineError::MalformedResponse(
            "response is not a JSON object".to_string(),
        ))
    }
}
