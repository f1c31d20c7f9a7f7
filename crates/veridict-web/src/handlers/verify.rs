//! Claim verification endpoint.
//!
//! The body is read raw rather than through the Json extractor so the 400
//! and 413 responses keep the documented `{error: ...}` shape instead of
//! axum's default rejections.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use veridict_common::{SourceRef, Verdict, VerdictStatus};

use crate::pipeline::{self, VerifyOutcome};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: VerdictStatus,
    pub confidence: u8,
    pub justification: String,
    pub sources: Vec<SourceRef>,
    pub cached: bool,
}

impl VerifyResponse {
    fn from_verdict(verdict: Verdict, cached: bool) -> Self {
        Self {
            status: verdict.status,
            confidence: verdict.confidence,
            justification: verdict.justification,
            sources: verdict.sources,
            cached,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct RateLimitBody {
    error: String,
    #[serde(rename = "retryAfter")]
    retry_after: u64,
}

pub async fn verify(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.len() > state.max_body_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorBody {
                error: "payload exceeds size limit".to_string(),
            }),
        )
            .into_response();
    }

    let request: VerifyRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "body must be a JSON object with a \"text\" field".to_string(),
                }),
            )
                .into_response()
        }
    };

    let client_id = client_id(&headers);
    match pipeline::verify(&state, &client_id, &request.text).await {
        VerifyOutcome::Verdict { verdict, cached } => (
            StatusCode::OK,
            Json(VerifyResponse::from_verdict(verdict, cached)),
        )
            .into_response(),
        VerifyOutcome::InvalidInput { message } => {
            (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
        }
        VerifyOutcome::RateLimited { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitBody {
                error: "rate limit exceeded".to_string(),
                retry_after: retry_after_secs,
            }),
        )
            .into_response(),
    }
}

/// Client identifier for rate limiting only; never persisted. Behind a
/// proxy the first x-forwarded-for hop is the caller; otherwise all
/// unattributed traffic shares one bucket.
fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Outermost boundary: even a panic in a handler answers with a
/// verdict-shaped body so a caller that only inspects status/confidence
/// does not break.
pub fn panic_fallback(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("handler panicked, returning safe fallback verdict");
    let body = serde_json::json!({
        "error": "internal server error",
        "status": "uncertain",
        "confidence": 20,
        "justification": "An internal error prevented verification. Please try again later.",
        "sources": [SourceRef::search_fallback("fact check")],
        "cached": false,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
