//! Verdict types and field clamping.
//!
//! Everything coming back from the classification model passes through
//! [`Verdict::clamped`] so the response contract holds regardless of what
//! the model produced: status is always one of the three enumerated values,
//! confidence is always in [0,100], the justification is non-empty and
//! bounded, and the source list is never empty.

use serde::{Deserialize, Serialize};

pub const MAX_JUSTIFICATION_CHARS: usize = 1000;
pub const MAX_SOURCES: usize = 5;
pub const MAX_SOURCE_TITLE_CHARS: usize = 200;
pub const MAX_SOURCE_URL_CHARS: usize = 500;
pub const MAX_SOURCE_SUMMARY_CHARS: usize = 300;

/// Confidence assigned when verification could not be performed at all.
pub const UNVERIFIABLE_CONFIDENCE: u8 = 25;

const GENERIC_JUSTIFICATION: &str =
    "No detailed justification was provided for this classification.";
const UNVERIFIABLE_JUSTIFICATION: &str =
    "The claim could not be verified automatically. Treat it with caution \
     and consult the suggested sources manually.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Real,
    Fake,
    Uncertain,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Real => "real",
            VerdictStatus::Fake => "fake",
            VerdictStatus::Uncertain => "uncertain",
        }
    }

    /// Parse a model-supplied status, coercing anything unrecognized to
    /// `Uncertain`.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "real" | "true" | "verdadeiro" | "verdadeira" => VerdictStatus::Real,
            "fake" | "false" | "falso" | "falsa" => VerdictStatus::Fake,
            _ => VerdictStatus::Uncertain,
        }
    }

    /// Confidence substituted when the model supplied none or an
    /// out-of-range value.
    pub fn default_confidence(&self) -> u8 {
        match self {
            VerdictStatus::Real | VerdictStatus::Fake => 80,
            VerdictStatus::Uncertain => 50,
        }
    }
}

/// A supporting source proposed by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub summary: String,
}

impl SourceRef {
    /// Bound every field to its maximum length.
    pub fn clamped(self) -> Self {
        Self {
            title: truncate_chars(&self.title, MAX_SOURCE_TITLE_CHARS),
            url: truncate_chars(&self.url, MAX_SOURCE_URL_CHARS),
            summary: truncate_chars(&self.summary, MAX_SOURCE_SUMMARY_CHARS),
        }
    }

    /// Generic search-engine link for a claim, used whenever the model
    /// returned no usable sources so the response is never sources-empty.
    pub fn search_fallback(subject: &str) -> Self {
        Self {
            title: "Search for this claim".to_string(),
            url: format!(
                "https://www.google.com/search?q={}",
                query_encode(subject)
            ),
            summary: "Automatically generated search query to verify this claim manually."
                .to_string(),
        }
        .clamped()
    }
}

/// The classification result for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub confidence: u8,
    pub justification: String,
    pub sources: Vec<SourceRef>,
}

impl Verdict {
    /// Clamp every field into contract bounds.
    ///
    /// `subject` is the sanitized input text, used to synthesize a fallback
    /// source when the model supplied none.
    pub fn clamped(
        status: VerdictStatus,
        confidence: Option<i64>,
        justification: Option<String>,
        sources: Vec<SourceRef>,
        subject: &str,
    ) -> Self {
        let confidence = match confidence {
            Some(c) if (0..=100).contains(&c) => c as u8,
            _ => status.default_confidence(),
        };
        let justification = match justification {
            Some(j) if !j.trim().is_empty() => {
                truncate_chars(j.trim(), MAX_JUSTIFICATION_CHARS)
            }
            _ => GENERIC_JUSTIFICATION.to_string(),
        };
        let mut sources: Vec<SourceRef> = sources
            .into_iter()
            .take(MAX_SOURCES)
            .map(SourceRef::clamped)
            .collect();
        if sources.is_empty() {
            sources.push(SourceRef::search_fallback(subject));
        }
        Self {
            status,
            confidence,
            justification,
            sources,
        }
    }

    /// Safe default when the external classification could not be completed:
    /// uncertain, low confidence, with a verify-manually source.
    pub fn unverifiable(subject: &str) -> Self {
        Self {
            status: VerdictStatus::Uncertain,
            confidence: UNVERIFIABLE_CONFIDENCE,
            justification: UNVERIFIABLE_JUSTIFICATION.to_string(),
            sources: vec![SourceRef::search_fallback(subject)],
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Minimal percent-encoding for search query URLs: spaces become `+`,
/// unreserved ASCII passes through, everything else is encoded byte-wise.
fn query_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
