//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use veridict_common::Result;
use veridict_common::VeridictError;
use veridict_llm::backend::{LlmBackend, OllamaBackend, OpenAiBackend, OpenAiCompatibleBackend};
use veridict_llm::requester::VerdictRequester;
use veridict_store::{SqliteVerdictRepository, VerdictRepository};

use crate::config::Config;
use crate::ratelimit::{RateLimiter, SystemClock};

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub repo: Arc<dyn VerdictRepository>,
    pub requester: VerdictRequester,
    pub limiter: RateLimiter,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = build_backend(config)?;
        let repo: Arc<dyn VerdictRepository> = Arc::new(
            SqliteVerdictRepository::open(&config.database.path)
                .map_err(|e| VeridictError::Persistence(e.to_string()))?,
        );
        Ok(Self::with_parts(
            repo,
            VerdictRequester::new(backend),
            RateLimiter::new(
                Duration::from_secs(config.rate_limit.window_secs),
                config.rate_limit.max_requests,
                Arc::new(SystemClock),
            ),
            config.server.max_body_bytes,
        ))
    }

    /// Assemble state from pre-built parts; used by tests to inject a
    /// stub backend, an in-memory store, or a manual clock.
    pub fn with_parts(
        repo: Arc<dyn VerdictRepository>,
        requester: VerdictRequester,
        limiter: RateLimiter,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            repo,
            requester,
            limiter,
            max_body_bytes,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Select the classification backend from config. A missing API key is not
/// fatal at startup: calls will fail and degrade to the default verdict.
fn build_backend(config: &Config) -> Result<Arc<dyn LlmBackend>> {
    let timeout = Duration::from_secs(config.llm.timeout_secs);
    let api_key = config.api_key();
    if api_key.is_none() && config.llm.backend != "ollama" {
        tracing::warn!(
            env = %config.llm.api_key_env,
            "no API key found; external classification calls will fail closed"
        );
    }

    match config.llm.backend.as_str() {
        "openai" => Ok(Arc::new(OpenAiBackend::new(
            api_key.map(|k| k.expose_secret().to_string()).unwrap_or_default(),
            &config.llm.model,
            timeout,
        ))),
        "openai_compatible" => Ok(Arc::new(OpenAiCompatibleBackend::new(
            &config.llm.base_url,
            &config.llm.model,
            api_key.map(|k| k.expose_secret().to_string()),
            timeout,
        ))),
        "ollama" => Ok(Arc::new(OllamaBackend::new(
            &config.llm.base_url,
            &config.llm.model,
            timeout,
        ))),
        other => Err(VeridictError::Config(format!(
            "unknown llm backend: {other}"
        ))),
    }
}
