mod common;

use common::{credentials, fast_client, received, request, API_KEY, SUBMIT_PATH};
use image2video::GenerationOutcome;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_status_url_derived_from_request_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-42",
            "status": "queued"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/requests/req-42/status"))
        .and(header("hf-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "video": { "url": "https://cdn.example.com/req-42.mp4" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server);

    let handle = client.submit(&request()).await.unwrap();
    assert_eq!(
        handle.status_url.as_ref().map(|url| url.as_str().to_string()),
        Some(format!("{}/requests/req-42/status", server.uri()))
    );
    assert_eq!(
        handle.status_url,
        Some(client.status_url_for("req-42").unwrap())
    );

    let outcome = client
        .wait_for_job(&handle, &credentials(), None, &Default::default())
        .await
        .unwrap();
    assert_eq!(outcome.video_url(), Some("https://cdn.example.com/req-42.mp4"));
}

#[tokio::test]
async fn test_plain_id_field_is_used_when_request_id_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "abc" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/requests/abc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "url": "https://cdn.example.com/abc.mp4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server);
    let outcome = client.generate(request()).await.unwrap();

    assert_eq!(outcome.video_url(), Some("https://cdn.example.com/abc.mp4"));
}

#[tokio::test]
async fn test_explicit_status_url_takes_precedence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-7",
            "status_url": format!("{}/custom/poll/req-7", server.uri())
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/custom/poll/req-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "output": ["https://cdn.example.com/req-7.mp4"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server);
    let outcome = client.generate(request()).await.unwrap();

    assert_eq!(outcome.video_url(), Some("https://cdn.example.com/req-7.mp4"));
    assert_eq!(received(&server, "/requests").await, 0);
}

#[tokio::test]
async fn test_untrackable_job_returns_initial_response() {
    let server = MockServer::start().await;
    let body = json!({ "status": "queued", "message": "accepted" });

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;

    let client = fast_client(&server);
    let outcome = client.generate(request()).await.unwrap();

    assert_eq!(outcome, GenerationOutcome::Indeterminate { response: body });
    assert_eq!(outcome.video_url(), None);
    assert_eq!(received(&server, "/").await, 1);
}

#[tokio::test]
async fn test_malformed_status_url_falls_back_to_request_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-9",
            "status_url": "http://[not-a-host/poll"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/requests/req-9/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "url": "https://cdn.example.com/req-9.mp4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server);
    let outcome = client.generate(request()).await.unwrap();

    assert_eq!(outcome.video_url(), Some("https://cdn.example.com/req-9.mp4"));
}
