#![allow(dead_code)]

use image2video::{ClientConfig, Credentials, GenerationClient, GenerationRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const SUBMIT_PATH: &str = "/v1/image2video/dop";
pub const IMAGE_URL: &str = "https://images.example.com/cat.png";
pub const API_KEY: &str = "test_api_key";
pub const SECRET: &str = "test_secret";

pub fn credentials() -> Credentials {
    Credentials::new(API_KEY, SECRET)
}

pub fn request() -> GenerationRequest {
    GenerationRequest::new(IMAGE_URL, credentials())
}

/// Routes client logs to the test output; set `RUST_LOG=image2video=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A client that polls every 20ms and gives up after 2s.
pub fn fast_client(server: &MockServer) -> GenerationClient {
    client_with_timing(server, Duration::from_millis(20), Duration::from_secs(2))
}

pub fn client_with_timing(
    server: &MockServer,
    interval: Duration,
    ceiling: Duration,
) -> GenerationClient {
    init_tracing();
    let config = ClientConfig::default()
        .with_poll_interval(interval)
        .with_poll_ceiling(ceiling);
    GenerationClient::with_config(&server.uri(), config).unwrap()
}

/// Replays a fixed list of responses, repeating the last one once exhausted.
pub struct Sequence {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl Sequence {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty());
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses[call.min(self.responses.len() - 1)].clone()
    }
}

/// Number of requests the server received whose path starts with `prefix`.
pub async fn received(server: &MockServer, prefix: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().starts_with(prefix))
        .count()
}

/// Answers every request with the same template and records when each one arrived.
pub struct Timed {
    response: ResponseTemplate,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Timed {
    pub fn new(response: ResponseTemplate) -> (Self, Arc<Mutex<Vec<Instant>>>) {
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        let responder = Self {
            response,
            arrivals: arrivals.clone(),
        };
        (responder, arrivals)
    }
}

impl Respond for Timed {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        self.response.clone()
    }
}
