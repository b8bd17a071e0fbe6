use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use url::Url;

const PROMPT: &str = "Animate this image with smooth, natural motion while preserving its subject and style";
const MODEL: &str = "dop-turbo";
const SEED: u64 = 1;
const MOTION_ID: &str = "d2389a9a-91c2-4276-bc9c-c9e35e8fb85a";
const MOTION_STRENGTH: f64 = 0.8;

/// The API key and secret sent with every request of one generation.
///
/// Credentials are supplied per call and never stored by the client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }

    /// Both halves are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.secret.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Receives every status string reported by the service while a job is polled.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// One image-to-video request, as constructed by the caller.
#[derive(Clone)]
pub struct GenerationRequest {
    /// An `http` or `https` URL pointing at the source image.
    pub image_url: String,
    pub credentials: Credentials,
    pub on_progress: Option<ProgressCallback>,
}

impl GenerationRequest {
    pub fn new(image_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            image_url: image_url.into(),
            credentials,
            on_progress: None,
        }
    }

    /// Registers a callback invoked once per successful status check, in polling order.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("image_url", &self.image_url)
            .field("credentials", &self.credentials)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A motion preset applied to the animation.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MotionDescriptor {
    pub id: &'static str,
    pub strength: f64,
}

/// An entry of the `input_images` list.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InputImage<'a> {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub image_url: &'a str,
}

/// The body of the job submission request.
///
/// Everything except the image URL is fixed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JobPayload<'a> {
    pub prompt: &'static str,
    pub model: &'static str,
    pub seed: u64,
    pub motions: Vec<MotionDescriptor>,
    pub image_url: &'a str,
    pub input_images: Vec<InputImage<'a>>,
    pub enhance_prompt: bool,
    pub check_nsfw: bool,
}

impl<'a> JobPayload<'a> {
    pub fn for_image(image_url: &'a str) -> Self {
        Self {
            prompt: PROMPT,
            model: MODEL,
            seed: SEED,
            motions: vec![MotionDescriptor {
                id: MOTION_ID,
                strength: MOTION_STRENGTH,
            }],
            image_url,
            input_images: vec![InputImage {
                type_: "image_url",
                image_url,
            }],
            enhance_prompt: true,
            check_nsfw: true,
        }
    }
}

/// The server-reported state of a job.
///
/// The vocabulary is open-ended; unknown values are kept verbatim in [`JobStatus::Other`]
/// and treated as still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Success,
    Failed,
    Nsfw,
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => JobStatus::Queued,
            "in_progress" => JobStatus::InProgress,
            "completed" => JobStatus::Completed,
            "success" => JobStatus::Success,
            "failed" => JobStatus::Failed,
            "nsfw" => JobStatus::Nsfw,
            other => JobStatus::Other(other.to_string()),
        }
    }

    /// Reads the `status` field of a response, defaulting to `in_progress`.
    pub fn from_response(response: &Value) -> Self {
        response
            .get("status")
            .and_then(Value::as_str)
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::InProgress)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Nsfw => "nsfw",
            JobStatus::Other(raw) => raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Nsfw)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a response carries its video URL.
///
/// Shapes are tried in declaration order; the first non-empty string wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// `{"video": {"url": ...}}`
    VideoObject(String),
    /// `{"output": "..."}`
    Output(String),
    /// `{"output": ["...", ...]}`, first element
    OutputList(String),
    /// `{"url": "..."}`
    Url(String),
}

impl VideoSource {
    pub fn resolve(response: &Value) -> Option<Self> {
        let output = response.get("output");

        non_empty_str(response.get("video").and_then(|video| video.get("url")))
            .map(VideoSource::VideoObject)
            .or_else(|| non_empty_str(output).map(VideoSource::Output))
            .or_else(|| {
                non_empty_str(output.and_then(Value::as_array).and_then(|list| list.first()))
                    .map(VideoSource::OutputList)
            })
            .or_else(|| non_empty_str(response.get("url")).map(VideoSource::Url))
    }

    pub fn url(&self) -> &str {
        match self {
            VideoSource::VideoObject(url)
            | VideoSource::Output(url)
            | VideoSource::OutputList(url)
            | VideoSource::Url(url) => url,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            VideoSource::VideoObject(url)
            | VideoSource::Output(url)
            | VideoSource::OutputList(url)
            | VideoSource::Url(url) => url,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Extracts the job id from `request_id`, falling back to `id`.
pub(crate) fn request_id(response: &Value) -> Option<String> {
    ["request_id", "id"].iter().find_map(|key| match response.get(*key) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

pub(crate) fn status_url(response: &Value) -> Option<String> {
    non_empty_str(response.get("status_url"))
}

/// Renders the `error` field of a response, if any.
pub(crate) fn error_detail(response: &Value) -> Option<String> {
    match response.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// The state of a submitted job, as known right after submission.
///
/// Lives only for the duration of one generation; nothing is cached across calls.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub request_id: Option<String>,
    /// Endpoint to poll, either provided by the service or derived from `request_id`.
    pub status_url: Option<Url>,
    /// The video location, when the submission response already carries one.
    pub video: Option<VideoSource>,
    pub response: Value,
    /// When the submission was sent. The polling ceiling counts from here.
    pub submitted_at: Instant,
}

impl JobHandle {
    pub fn is_ready(&self) -> bool {
        self.video.is_some()
    }

    pub fn is_trackable(&self) -> bool {
        self.status_url.is_some()
    }
}

/// A finished generation.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoResult {
    pub video_url: String,
    /// The last full response body received from the service.
    pub response: Value,
}

/// The non-error outcomes of [`GenerationClient::generate`](crate::GenerationClient::generate).
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// The video is available.
    Ready(VideoResult),
    /// The job can no longer be followed: either the submission response carried neither
    /// an id nor a status URL, or the service reported success without a video location.
    Indeterminate { response: Value },
}

impl GenerationOutcome {
    pub fn video_url(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Ready(result) => Some(&result.video_url),
            GenerationOutcome::Indeterminate { .. } => None,
        }
    }

    pub fn response(&self) -> &Value {
        match self {
            GenerationOutcome::Ready(result) => &result.response,
            GenerationOutcome::Indeterminate { response } => response,
        }
    }

    pub fn into_video(self) -> Option<VideoResult> {
        match self {
            GenerationOutcome::Ready(result) => Some(result),
            GenerationOutcome::Indeterminate { .. } => None,
        }
    }
}
