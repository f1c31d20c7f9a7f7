//! Verdict requester — single best-effort external classification call.
//!
//! One attempt per request, no retries. Every failure mode (HTTP error,
//! non-success status, timeout, unsalvageable reply) terminates in a valid
//! verdict; nothing propagates past this boundary.

use std::sync::Arc;
use std::time::Instant;

use veridict_common::{NormalizedText, Verdict};

use crate::audit::LlmAuditEntry;
use crate::backend::LlmBackend;
use crate::extract::{extract_verdict, ExtractionPath};
use crate::prompt::classification_request;

/// Result of one classification attempt. Always carries a valid verdict.
#[derive(Debug, Clone)]
pub struct Classification {
    pub verdict: Verdict,
    pub path: ExtractionPath,
    /// Unmodified model output, retained as an audit blob. `None` when the
    /// external call itself failed.
    pub raw_response: Option<String>,
}

pub struct VerdictRequester {
    backend: Arc<dyn LlmBackend>,
}

impl VerdictRequester {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Classify a sanitized claim. Never fails: external-call errors and
    /// unsalvageable responses degrade to an uncertain default verdict.
    pub async fn request_verdict(&self, text: &NormalizedText) -> Classification {
        let req = classification_request(text);
        let started = Instant::now();

        match self.backend.complete(req).await {
            Ok(response) => {
                let entry = LlmAuditEntry::new(
                    self.backend.backend_name(),
                    &response,
                    started.elapsed().as_millis() as u64,
                );
                tracing::info!(
                    model = %entry.model,
                    backend = %entry.backend,
                    prompt_tokens = entry.prompt_tokens,
                    completion_tokens = entry.completion_tokens,
                    output_hash = %entry.output_hash,
                    latency_ms = entry.latency_ms,
                    "classification call completed"
                );

                let (verdict, path) = extract_verdict(&response.content, text.as_str());
                tracing::debug!(
                    path = path.as_str(),
                    status = verdict.status.as_str(),
                    confidence = verdict.confidence,
                    "verdict extracted"
                );
                Classification {
                    verdict,
                    path,
                    raw_response: Some(response.content),
                }
            }
            Err(err) => {
                tracing::warn!(
                    backend = self.backend.backend_name(),
                    error = %err,
                    "classification call failed, returning default verdict"
                );
                Classification {
                    verdict: Verdict::unverifiable(text.as_str()),
                    path: ExtractionPath::Fallback,
                    raw_response: None,
                }
            }
        }
    }
}
