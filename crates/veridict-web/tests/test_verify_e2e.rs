//! End-to-end tests for the verification endpoint, driving the full router
//! with a stubbed classification backend and an in-memory cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use veridict_llm::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};
use veridict_llm::requester::VerdictRequester;
use veridict_store::SqliteVerdictRepository;
use veridict_web::ratelimit::{RateLimiter, SystemClock};
use veridict_web::router::build_router;
use veridict_web::state::AppState;

struct StubBackend {
    /// `None` injects an external-call failure.
    reply: Option<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn complete(&self, _req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(content) => Ok(LlmResponse {
                content: content.clone(),
                model: "stub-model".to_string(),
                prompt_tokens: 10,
                completion_tokens: 20,
            }),
            None => Err(LlmError::Unavailable("injected failure".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        "stub-model"
    }
    fn backend_name(&self) -> &'static str {
        "stub"
    }
    fn is_local(&self) -> bool {
        true
    }
}

fn test_app_with_cap(reply: Option<&str>, cap: u32) -> (Router, Arc<StubBackend>) {
    let backend = Arc::new(StubBackend {
        reply: reply.map(str::to_string),
        calls: AtomicUsize::new(0),
    });
    let repo = Arc::new(SqliteVerdictRepository::open_in_memory().expect("in-memory db"));
    let state = AppState::with_parts(
        repo,
        VerdictRequester::new(backend.clone()),
        RateLimiter::new(Duration::from_secs(60), cap, Arc::new(SystemClock)),
        64 * 1024,
    );
    (build_router(state), backend)
}

fn test_app(reply: Option<&str>) -> (Router, Arc<StubBackend>) {
    test_app_with_cap(reply, 1000)
}

async fn post_verify(app: &Router, text: &str) -> (StatusCode, Value) {
    post_raw(app, json!({ "text": text }).to_string()).await
}

async fn post_raw(app: &Router, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/verify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

const REAL_REPLY: &str = r#"{"status":"real","confidence":90,"justification":"O Amazonas tem a maior área territorial entre os estados brasileiros.","sources":[{"title":"IBGE","url":"https://www.ibge.gov.br","summary":"Dados territoriais oficiais."}]}"#;

#[tokio::test]
async fn test_fresh_verdict_then_cache_hit() {
    let (app, backend) = test_app(Some(REAL_REPLY));
    let claim = "O Amazonas é o maior estado do Brasil";

    let (status, body) = post_verify(&app, claim).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "real");
    assert_eq!(body["confidence"], 90);
    assert_eq!(body["cached"], false);
    assert!(body["sources"].as_array().unwrap().len() >= 1);

    let (status, second) = post_verify(&app, claim).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["status"], body["status"]);
    assert_eq!(second["confidence"], body["confidence"]);
    assert_eq!(second["justification"], body["justification"]);
    assert_eq!(second["sources"], body["sources"]);

    // The external API was only consulted once.
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_case_and_whitespace_variants_share_the_cache_entry() {
    let (app, backend) = test_app(Some(REAL_REPLY));

    let (_, first) = post_verify(&app, "O Amazonas é o maior estado do Brasil").await;
    assert_eq!(first["cached"], false);

    let (_, second) = post_verify(&app, "  o amazonas  É o MAIOR   estado do brasil ").await;
    assert_eq!(second["cached"], true);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_input_is_400_before_anything_else() {
    let (app, backend) = test_app(Some(REAL_REPLY));

    for text in ["", "   \t  ", "short", "<<<<<>>>>&&\"\"''"] {
        let (status, body) = post_verify(&app, text).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "input: {text:?}");
        assert!(body["error"].as_str().unwrap().len() > 0);
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_json_body_is_400() {
    let (app, _) = test_app(Some(REAL_REPLY));
    let (status, body) = post_raw(&app, "this is not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_oversize_payload_is_413() {
    let (app, _) = test_app(Some(REAL_REPLY));
    let huge = "x".repeat(100 * 1024);
    let (status, body) = post_raw(&app, json!({ "text": huge }).to_string()).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_long_text_is_truncated_not_rejected() {
    let (app, _) = test_app(Some(REAL_REPLY));
    // Over the 2000-char text bound but under the payload bound.
    let long = "palavra ".repeat(400);
    let (status, body) = post_verify(&app, &long).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "real");
}

#[tokio::test]
async fn test_backend_failure_still_yields_valid_verdict() {
    let (app, backend) = test_app(None);

    let (status, body) = post_verify(&app, "uma afirmação qualquer para checar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "uncertain");
    assert!(body["confidence"].as_u64().unwrap() <= 40);
    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty());
    assert!(sources[0]["url"].as_str().unwrap().len() > 0);

    // Failure verdicts are not cached: a second attempt asks again.
    let (_, second) = post_verify(&app, "uma afirmação qualquer para checar").await;
    assert_eq!(second["cached"], false);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unparseable_prose_recovered_by_keyword_scan() {
    let (app, _) = test_app(Some(
        "After reviewing the evidence, this claim is false and has been debunked repeatedly.",
    ));

    let (status, body) = post_verify(&app, "a claim answered only in prose").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "fake");
    assert_eq!(body["confidence"], 80);
    assert!(!body["sources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_limit_denies_with_retry_hint() {
    let (app, _) = test_app_with_cap(Some(REAL_REPLY), 2);

    for _ in 0..2 {
        let (status, _) = post_verify(&app, "a perfectly reasonable claim to check").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post_verify(&app, "a perfectly reasonable claim to check").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());
    assert!(body["retryAfter"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_rate_limit_buckets_by_forwarded_client() {
    let (app, _) = test_app_with_cap(Some(REAL_REPLY), 1);

    let send = |ip: &'static str| {
        let app = app.clone();
        async move {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", ip)
                .body(Body::from(
                    json!({ "text": "a perfectly reasonable claim to check" }).to_string(),
                ))
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        }
    };

    assert_eq!(send("203.0.113.1").await, StatusCode::OK);
    assert_eq!(send("203.0.113.2").await, StatusCode::OK);
    assert_eq!(send("203.0.113.1").await, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_cors_preflight_answered_without_body() {
    let (app, _) = test_app(Some(REAL_REPLY));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/verify")
        .header(header::ORIGIN, "https://example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_healthz_reports_ok() {
    let (app, _) = test_app(Some(REAL_REPLY));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}
