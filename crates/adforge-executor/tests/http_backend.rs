//! Integration tests for `HttpRenderBackend` using wiremock HTTP mocks.

use std::collections::BTreeSet;

use adforge_core::{AspectRatio, Capability, Framework, HookType, Pacing, Platform, Transition};
use adforge_executor::{HttpRenderBackend, HttpRenderConfig, RenderBackend, RenderError, RenderJob};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(max_retries: u32) -> HttpRenderConfig {
    HttpRenderConfig {
        request_timeout_secs: 5,
        max_retries,
        backoff_base_ms: 0,
        user_agent: "adforge-test/0.1".to_owned(),
        api_key: Some("render-key".to_owned()),
    }
}

fn job() -> RenderJob {
    RenderJob {
        plan_id: uuid::Uuid::nil(),
        variation_index: 3,
        framework: Framework::Aida,
        hook_type: HookType::Curiosity,
        pacing: Pacing::Fast,
        transitions: Transition::Zoom,
        target_duration: 22.5,
        required_capabilities: BTreeSet::from([Capability::Trim, Capability::Transitions]),
        aspect_ratio: AspectRatio::Vertical,
        platform: Platform::Tiktok,
    }
}

#[tokio::test]
async fn posts_job_and_returns_video_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .and(header("authorization", "Bearer render-key"))
        .and(header("user-agent", "adforge-test/0.1"))
        .and(body_partial_json(serde_json::json!({
            "variation_index": 3,
            "hook_type": "curiosity",
            "transitions": "zoom",
            "aspect_ratio": "9:16",
            "required_capabilities": ["trim", "transitions"]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "video_url": "https://cdn.test/v3.mp4" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpRenderBackend::new("cloud-a", &server.uri(), &config(0)).unwrap();
    let output = backend.render(&job()).await.expect("render should succeed");
    assert_eq!(output.video_url, "https://cdn.test/v3.mp4");
}

#[tokio::test]
async fn retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "video_url": "https://cdn.test/ok.mp4" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpRenderBackend::new("cloud-a", &server.uri(), &config(2)).unwrap();
    let output = backend.render(&job()).await.unwrap();
    assert_eq!(output.video_url, "https://cdn.test/ok.mp4");
}

#[tokio::test]
async fn rate_limit_exhausts_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let backend = HttpRenderBackend::new("cloud-a", &server.uri(), &config(1)).unwrap();
    let err = backend.render(&job()).await.unwrap_err();
    assert!(matches!(err, RenderError::RateLimited { .. }), "{err}");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpRenderBackend::new("cloud-a", &server.uri(), &config(3)).unwrap();
    let err = backend.render(&job()).await.unwrap_err();
    assert!(matches!(
        err,
        RenderError::UnexpectedStatus { status: 422, .. }
    ));
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = HttpRenderBackend::new("cloud-a", &server.uri(), &config(0)).unwrap();
    let err = backend.render(&job()).await.unwrap_err();
    assert!(matches!(err, RenderError::Deserialize { .. }));
}

#[tokio::test]
async fn empty_video_url_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "video_url": "" })))
        .mount(&server)
        .await;

    let backend = HttpRenderBackend::new("cloud-a", &server.uri(), &config(0)).unwrap();
    let err = backend.render(&job()).await.unwrap_err();
    assert!(matches!(err, RenderError::Rejected { .. }));
}
