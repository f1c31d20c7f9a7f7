//! Audit entries for external LLM calls.
//!
//! Only a hash of the model output is kept in the entry; the full raw
//! response travels with the cached verdict instead.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::backend::LlmResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub model: String,
    pub backend: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn new(backend: &str, response: &LlmResponse, latency_ms: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(response.content.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            model: response.model.clone(),
            backend: backend.to_string(),
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }
}
