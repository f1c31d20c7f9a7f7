//! Input sanitization and content fingerprinting.
//!
//! `sanitize` is the single entry gate for user-supplied text: every layer
//! that accepts a claim runs it through here before doing anything else.
//! `fingerprint` turns the sanitized text into a deterministic cache key.

use std::fmt;

use crate::error::{Result, VeridictError};

/// Minimum claim length after sanitization.
pub const MIN_TEXT_CHARS: usize = 10;
/// Maximum claim length; longer input is truncated silently.
pub const MAX_TEXT_CHARS: usize = 2000;

const FORBIDDEN: [char; 5] = ['<', '>', '"', '\'', '&'];

/// Sanitized user text. Only produced by [`sanitize`], so every consumer
/// sees bounded, metacharacter-free, whitespace-collapsed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip HTML/script metacharacters, collapse whitespace runs, bound length.
///
/// Errors with `InvalidInput` if the result is shorter than
/// [`MIN_TEXT_CHARS`]; input beyond [`MAX_TEXT_CHARS`] is truncated without
/// error. Idempotent: sanitizing an already-sanitized text is a no-op.
pub fn sanitize(raw: &str) -> Result<NormalizedText> {
    let stripped: String = raw.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() < MIN_TEXT_CHARS {
        return Err(VeridictError::InvalidInput(format!(
            "text must be at least {MIN_TEXT_CHARS} characters after sanitization"
        )));
    }

    // Truncation can land right after a space; trim so the result survives
    // a second sanitization pass unchanged.
    let bounded = collapsed
        .chars()
        .take(MAX_TEXT_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string();

    Ok(NormalizedText(bounded))
}

/// Deterministic cache key for a sanitized text.
///
/// Case-folded and whitespace-normalized before hashing so trivially
/// different inputs (casing, repeated spaces) land on the same cache entry.
/// FNV-1a 64-bit, hex-encoded; collisions are an accepted false-merge risk
/// since this is a dedup key, not a security primitive.
pub fn fingerprint(text: &NormalizedText) -> String {
    let folded = text.as_str().to_lowercase();
    let canonical = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{:016x}", fnv64(canonical.as_bytes()))
}

/// FNV-1a 64-bit hash.
fn fnv64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
