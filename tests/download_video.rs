use image2video::{GenerationClient, GenerationError, VideoResult};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_download_video_writes_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/clip-1.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("dummy video data"))
        .mount(&server)
        .await;

    let client = GenerationClient::new_with_url(&server.uri()).unwrap();
    let video = VideoResult {
        video_url: format!("{}/videos/clip-1.mp4", server.uri()),
        response: json!({ "status": "completed" }),
    };

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested");
    let file_path = client.download_video(&video, &dest).await.unwrap();

    assert_eq!(file_path, dest.join("clip-1.mp4"));
    assert_eq!(std::fs::read(&file_path).unwrap(), b"dummy video data");
}

#[tokio::test]
async fn test_download_video_missing_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/gone.mp4"))
        .respond_with(ResponseTemplate::new(404).set_body_string("expired"))
        .mount(&server)
        .await;

    let client = GenerationClient::new_with_url(&server.uri()).unwrap();
    let video = VideoResult {
        video_url: format!("{}/videos/gone.mp4", server.uri()),
        response: json!({}),
    };

    let dir = tempfile::tempdir().unwrap();
    let err = client.download_video(&video, dir.path()).await.unwrap_err();

    match err {
        GenerationError::Download { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "expired");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
