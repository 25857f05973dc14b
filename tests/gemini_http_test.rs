use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use studiogen::{
    variants, GenerationConfig, ImageGenerationRequest, RetryPolicy, StudioClient, StudioConfig,
    StudioError,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/test-model:generateContent";

fn client_for(server: &MockServer) -> StudioClient {
    let config = StudioConfig::new()
        .with_api_key("test-key")
        .with_base_url(server.uri())
        .with_model("test-model")
        .with_retry(RetryPolicy::default().with_base_delay(Duration::from_millis(1)));
    StudioClient::new(config).expect("client")
}

fn image_body(data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"text": "Here you go"},
                {"inlineData": {"mimeType": "image/png", "data": data}}
            ]},
            "finishReason": "STOP"
        }]
    })
}

fn request(source: &str) -> ImageGenerationRequest {
    let config = GenerationConfig {
        preserve_product_label: true,
        preserve_pose: true,
        preserve_face: true,
        ..GenerationConfig::default()
    };
    ImageGenerationRequest::new(source, config).with_context("beach sunset")
}

#[tokio::test]
async fn retries_unavailable_responses_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("R0VORVJBVEVE")))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .image()
        .generate_variant(request("data:image/jpeg;base64,ABC123"))
        .await
        .expect("generation");

    assert_eq!(result.data_uri, "data:image/png;base64,R0VORVJBVEVE");
    assert_eq!(result.model, "test-model");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);
    let body: Value = serde_json::from_slice(&requests[2].body).unwrap();
    let parts = &body["contents"][0]["parts"];
    assert!(parts[0]["text"].as_str().unwrap().contains("beach sunset"));
    assert_eq!(parts[1]["inlineData"]["data"], "ABC123");
}

#[tokio::test]
async fn bad_request_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Request contains an invalid argument.", "status": "INVALID_ARGUMENT"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .image()
        .generate_variant(request("ABC123"))
        .await
        .unwrap_err();

    match err {
        StudioError::Service { status, message } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "Request contains an invalid argument.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn retry_budget_is_exhausted_on_persistent_overload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error encountered."))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .image()
        .generate_variant(request("ABC123"))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn remote_source_is_fetched_and_encoded() {
    let server = MockServer::start().await;
    let jpeg = b"\xff\xd8\xff\xe0fake-jpeg".to_vec();

    Mock::given(method("GET"))
        .and(path("/demo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg.clone()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("T1VU")))
        .mount(&server)
        .await;

    let source = format!("{}/demo.jpg", server.uri());
    client_for(&server)
        .image()
        .generate_variant(request(&source))
        .await
        .expect("generation");

    let requests = server.received_requests().await.unwrap();
    let generate = requests
        .iter()
        .find(|r| r.url.path() == GENERATE_PATH)
        .expect("generate call");
    let body: Value = serde_json::from_slice(&generate.body).unwrap();
    assert_eq!(
        body["contents"][0]["parts"][1]["inlineData"]["data"],
        STANDARD.encode(&jpeg)
    );
}

#[tokio::test]
async fn unreachable_source_fails_before_generation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("T1VU")))
        .expect(0)
        .mount(&server)
        .await;

    let source = format!("{}/missing.jpg", server.uri());
    let err = client_for(&server)
        .image()
        .generate_variant(request(&source))
        .await
        .unwrap_err();

    assert!(matches!(err, StudioError::SourceFetch { .. }));
}

#[tokio::test]
async fn empty_result_policy_differs_by_call_site() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot do that"}]}}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client
        .image()
        .generate_variant(request("ABC123"))
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::EmptyResult));

    let fallback = client
        .image()
        .generate_marketing_image(request("data:image/jpeg;base64,ABC123"))
        .await
        .expect("marketing image");
    assert!(fallback.is_source_fallback);
    assert_eq!(fallback.data_uri, "data:image/jpeg;base64,ABC123");
}

#[tokio::test]
async fn ab_comparison_tolerates_one_failure() {
    let server = MockServer::start().await;

    // The first call gets a terminal error, the second an image.
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "bad"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("T1VU")))
        .mount(&server)
        .await;

    let comparison = client_for(&server)
        .compare(variants::style_pair(request("ABC123")))
        .await;

    assert_eq!(comparison.successes().count(), 1);
    assert_eq!(comparison.failures().count(), 1);
    let (slot, image) = comparison.successes().next().unwrap();
    assert_eq!(image.label.as_deref(), Some(slot.label()));
}
