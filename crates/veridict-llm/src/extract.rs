//! Best-effort extraction of a structured verdict from model output.
//!
//! The model's reply is prose-adjacent and not guaranteed to be well-formed
//! JSON. Extraction runs as explicit stages, each independently testable:
//!
//!   1. strict parse of the whole reply
//!   2. code-fence stripping, then strict parse
//!   3. first balanced `{...}` span, then parse
//!   4. keyword scan over affirming vs denying vocabulary
//!
//! Whatever stage succeeds, the resulting object is clamped field by field
//! via `Verdict::clamped`, so the caller always receives a valid verdict.

use serde_json::Value;
use veridict_common::{SourceRef, Verdict, VerdictStatus};

/// Which stage produced the verdict. Logged for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    Strict,
    Fenced,
    Salvaged,
    Keyword,
    Fallback,
}

impl ExtractionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionPath::Strict => "strict",
            ExtractionPath::Fenced => "fenced",
            ExtractionPath::Salvaged => "salvaged",
            ExtractionPath::Keyword => "keyword",
            ExtractionPath::Fallback => "fallback",
        }
    }
}

/// Extract a verdict from raw model output. Total: every input, including
/// the empty string, yields a valid verdict.
pub fn extract_verdict(content: &str, subject: &str) -> (Verdict, ExtractionPath) {
    if content.trim().is_empty() {
        return (Verdict::unverifiable(subject), ExtractionPath::Fallback);
    }

    // Stage 1: the whole reply is a JSON object.
    if let Ok(value) = serde_json::from_str::<Value>(content.trim()) {
        if let Some(verdict) = verdict_from_value(&value, subject) {
            return (verdict, ExtractionPath::Strict);
        }
    }

    // Stage 2: reply wrapped in ``` fences, possibly with surrounding prose.
    if let Some(inner) = strip_code_fences(content) {
        if let Ok(value) = serde_json::from_str::<Value>(&inner) {
            if let Some(verdict) = verdict_from_value(&value, subject) {
                return (verdict, ExtractionPath::Fenced);
            }
        }
    }

    // Stage 3: first balanced {...} span anywhere in the reply.
    if let Some(span) = balanced_object_span(content) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            if let Some(verdict) = verdict_from_value(&value, subject) {
                return (verdict, ExtractionPath::Salvaged);
            }
        }
    }

    // Stage 4: keyword scan. Always yields a verdict.
    (keyword_verdict(content, subject), ExtractionPath::Keyword)
}

/// Pull verdict fields out of a parsed JSON value, tolerating wrong types
/// everywhere. Returns `None` only when the value is not an object at all.
fn verdict_from_value(value: &Value, subject: &str) -> Option<Verdict> {
    let obj = value.as_object()?;

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .map(VerdictStatus::coerce)
        .unwrap_or(VerdictStatus::Uncertain);

    let confidence = obj.get("confidence").and_then(value_as_int);

    let justification = obj
        .get("justification")
        .and_then(Value::as_str)
        .map(str::to_string);

    let sources = obj
        .get("sources")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(source_from_value).collect())
        .unwrap_or_default();

    Some(Verdict::clamped(status, confidence, justification, sources, subject))
}

/// Accept integers, whole floats, and numeric strings.
fn value_as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn source_from_value(value: &Value) -> Option<SourceRef> {
    let obj = value.as_object()?;
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    let source = SourceRef {
        title: field("title"),
        url: field("url"),
        summary: field("summary"),
    };
    if source.title.is_empty() && source.url.is_empty() {
        return None;
    }
    Some(source)
}

/// Return the content of the first ``` fence pair, with an optional `json`
/// language tag removed. `None` when the reply carries no fence.
fn strip_code_fences(content: &str) -> Option<String> {
    let start = content.find("```")?;
    let after = &content[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let end = after.find("```").unwrap_or(after.len());
    Some(after[..end].trim().to_string())
}

/// Find the first balanced top-level `{...}` span, respecting JSON string
/// literals and escapes.
fn balanced_object_span(content: &str) -> Option<&str> {
    let bytes = content.as_bytes();
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

const AFFIRMING: &[&str] = &[
    "true", "real", "accurate", "correct", "verified", "confirmed", "legitimate",
    "verdadeiro", "verdadeira", "confirmado", "correto",
];
const DENYING: &[&str] = &[
    "false", "fake", "incorrect", "misleading", "fabricated", "debunked", "hoax",
    "falso", "falsa", "boato", "mentira",
];

/// Last-resort heuristic: count affirming vs denying vocabulary. A decisive
/// majority gets confidence 80, anything else lands on uncertain at 50.
fn keyword_verdict(content: &str, subject: &str) -> Verdict {
    let lowered = content.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let affirming = words.iter().filter(|w| AFFIRMING.contains(*w)).count();
    let denying = words.iter().filter(|w| DENYING.contains(*w)).count();

    let (status, confidence, gist) = if affirming > denying {
        (VerdictStatus::Real, 80, "supports")
    } else if denying > affirming {
        (VerdictStatus::Fake, 80, "disputes")
    } else {
        (VerdictStatus::Uncertain, 50, "neither clearly supports nor disputes")
    };

    Verdict::clamped(
        status,
        Some(confidence),
        Some(format!(
            "The classifier's response could not be parsed as structured data; \
             its wording {gist} the claim."
        )),
        vec![],
        subject,
    )
}
