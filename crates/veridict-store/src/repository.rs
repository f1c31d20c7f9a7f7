//! Verdict cache repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use veridict_common::Verdict;

use crate::error::Result;

/// A verdict as persisted in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedVerdict {
    /// Unique key derived from the normalized input text.
    pub fingerprint: String,
    /// The sanitized input the verdict was computed for.
    pub input_text: String,
    pub verdict: Verdict,
    /// Unmodified model output, retained as an audit blob. `None` when the
    /// verdict was produced without a usable model response.
    pub raw_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CachedVerdict {
    pub fn new(
        fingerprint: String,
        input_text: String,
        verdict: Verdict,
        raw_response: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            fingerprint,
            input_text,
            verdict,
            raw_response,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of an insert attempt.
///
/// The unique fingerprint key is the sole concurrency-correctness
/// mechanism: a losing concurrent writer sees `Conflict` and re-reads the
/// now-present row instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Conflict,
}

#[async_trait]
pub trait VerdictRepository: Send + Sync {
    /// Fetch the cached verdict for a fingerprint, if any.
    async fn lookup(&self, fingerprint: &str) -> Result<Option<CachedVerdict>>;

    /// Insert a verdict, keyed by its unique fingerprint. A duplicate key
    /// maps to [`InsertOutcome::Conflict`], never to an error.
    async fn insert(&self, record: &CachedVerdict) -> Result<InsertOutcome>;
}
