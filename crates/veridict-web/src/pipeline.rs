//! Verification pipeline: sanitize → rate limit → cache → classify → persist.
//!
//! Terminal states are exactly the three response classes; failures in the
//! cache or the external call are absorbed here and never become errors.

use veridict_common::{fingerprint, sanitize, Verdict};
use veridict_store::{CachedVerdict, InsertOutcome};

use crate::ratelimit::Decision;
use crate::state::AppState;

/// Terminal outcome of one verification request.
#[derive(Debug)]
pub enum VerifyOutcome {
    Verdict { verdict: Verdict, cached: bool },
    InvalidInput { message: String },
    RateLimited { retry_after_secs: u64 },
}

pub async fn verify(state: &AppState, client_id: &str, raw_text: &str) -> VerifyOutcome {
    // 1. Sanitize before spending rate-limit budget or touching the cache.
    let text = match sanitize(raw_text) {
        Ok(text) => text,
        Err(err) => {
            return VerifyOutcome::InvalidInput {
                message: err.to_string(),
            }
        }
    };

    // 2. Rate limit per client identifier.
    if let Decision::Denied { retry_after_secs } = state.limiter.check(client_id) {
        tracing::debug!(client_id, retry_after_secs, "request rate limited");
        return VerifyOutcome::RateLimited { retry_after_secs };
    }

    // 3. Cache lookup. A store error here is logged and treated as a miss.
    let fp = fingerprint(&text);
    match state.repo.lookup(&fp).await {
        Ok(Some(hit)) => {
            tracing::info!(fingerprint = %fp, "cache hit");
            return VerifyOutcome::Verdict {
                verdict: hit.verdict,
                cached: true,
            };
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(fingerprint = %fp, error = %err, "cache lookup failed, treating as miss")
        }
    }

    // 4. External classification. Never fails; degrades to a default verdict.
    let classification = state.requester.request_verdict(&text).await;

    // 5. Best-effort persist. Only verdicts backed by an actual model
    //    response are cached; a transient backend outage must not pin an
    //    unverifiable verdict to this fingerprint forever. Conflicts and
    //    store errors never reach the client.
    if classification.raw_response.is_some() {
        let record = CachedVerdict::new(
            fp.clone(),
            text.as_str().to_string(),
            classification.verdict.clone(),
            classification.raw_response.clone(),
        );
        match state.repo.insert(&record).await {
            Ok(InsertOutcome::Inserted) => tracing::debug!(fingerprint = %fp, "verdict cached"),
            Ok(InsertOutcome::Conflict) => {
                tracing::debug!(fingerprint = %fp, "concurrent insert won the race")
            }
            Err(err) => {
                tracing::warn!(fingerprint = %fp, error = %err, "failed to cache verdict")
            }
        }
    }

    VerifyOutcome::Verdict {
        verdict: classification.verdict,
        cached: false,
    }
}
