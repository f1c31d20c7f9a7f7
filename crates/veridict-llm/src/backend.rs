//! LLM backend trait and concrete implementations.
//!
//! Backends:
//!   OllamaBackend           — local Ollama (OpenAI-compatible)
//!   OpenAiBackend           — OpenAI API (gpt-4o, gpt-4o-mini, …)
//!   OpenAiCompatibleBackend — any OpenAI-compatible endpoint (LMStudio,
//!                             TogetherAI, Groq, OpenRouter, vLLM, …)
//!
//! Every backend carries a request timeout; an expired timeout surfaces as
//! an ordinary `LlmError` and is handled like any other external failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    fn backend_name(&self) -> &'static str;
    fn is_local(&self) -> bool;
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"].as_str().unwrap_or(fallback_model).to_string(),
        prompt_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

// ── 1. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model":       req.model.as_deref().unwrap_or(&self.model),
            "messages":    req.messages,
            "max_tokens":  req.max_tokens.unwrap_or(1024),
            "temperature": req.temperature.unwrap_or(0.1),
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
    fn backend_name(&self) -> &'static str {
        "ollama"
    }
    fn is_local(&self) -> bool {
        true
    }
}

// ── 2. OpenAI ─────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::Unavailable("OpenAI API key not configured".to_string()));
        }
        let body = serde_json::json!({
            "model":       req.model.as_deref().unwrap_or(&self.model),
            "messages":    req.messages,
            "max_tokens":  req.max_tokens.unwrap_or(1024),
            "temperature": req.temperature.unwrap_or(0.1),
        });
        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
    fn backend_name(&self) -> &'static str {
        "openai"
    }
    fn is_local(&self) -> bool {
        false
    }
}

// ── 3. OpenAI-Compatible (LMStudio, TogetherAI, Groq, OpenRouter, vLLM, …) ──

pub struct OpenAiCompatibleBackend {
    pub base_url: String,
    pub model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            client: http_client(timeout),
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(k) => req.bearer_auth(k),
            None => req,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model":       req.model.as_deref().unwrap_or(&self.model),
            "messages":    req.messages,
            "max_tokens":  req.max_tokens.unwrap_or(1024),
            "temperature": req.temperature.unwrap_or(0.1),
        });
        let resp = self.auth(self.client.post(&url)).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
    fn backend_name(&self) -> &'static str {
        "openai_compatible"
    }
    fn is_local(&self) -> bool {
        false
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_openai_backend_is_not_local() {
        let b = OpenAiBackend::new("sk-test", "gpt-4o-mini", TIMEOUT);
        assert!(!b.is_local());
        assert_eq!(b.model_id(), "gpt-4o-mini");
        assert_eq!(b.backend_name(), "openai");
    }

    #[test]
    fn test_ollama_is_local() {
        let b = OllamaBackend::new("http://localhost:11434", "llama3:8b", TIMEOUT);
        assert!(b.is_local());
    }

    #[test]
    fn test_openai_compatible_with_no_key() {
        let b = OpenAiCompatibleBackend::new("http://localhost:1234", "local-model", None, TIMEOUT);
        // No API key is valid for LMStudio / vLLM
        assert_eq!(b.model_id(), "local-model");
    }

    #[tokio::test]
    async fn test_openai_missing_key_errors_before_network() {
        let b = OpenAiBackend::new("", "gpt-4o-mini", TIMEOUT);
        let req = LlmRequest {
            messages: vec![],
            model: None,
            max_tokens: None,
            temperature: None,
        };
        match b.complete(req).await {
            Err(LlmError::Unavailable(msg)) => assert!(msg.contains("key")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_openai_response_defaults() {
        let json = serde_json::json!({
            "choices": [{"message": {"content": "hello"}}],
        });
        let resp = parse_openai_response(&json, "fallback-model");
        assert_eq!(resp.content, "hello");
        assert_eq!(resp.model, "fallback-model");
        assert_eq!(resp.prompt_tokens, 0);
    }
}
