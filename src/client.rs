use crate::config::{ClientConfig, DEFAULT_API_URL};
use crate::error::{GenerationError, PollFailure};
use crate::types::{
    self, Credentials, GenerationOutcome, GenerationRequest, JobHandle, JobPayload, JobStatus,
    ProgressCallback, VideoResult, VideoSource,
};
use reqwest::RequestBuilder;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

const API_KEY_HEADER: &str = "hf-api-key";
const SECRET_HEADER: &str = "hf-secret";

/// The main client for turning images into videos.
///
/// It holds a shared `reqwest::Client`, the base URL of the service and the
/// polling configuration. Credentials are passed with every request instead of
/// being stored, so one client can serve many users. It is cheap to clone and
/// safe to share across tasks; concurrent generations never share state.
#[derive(Clone)]
pub struct GenerationClient {
    client: reqwest::Client,
    base_url: Url,
    config: ClientConfig,
}

impl GenerationClient {
    /// Creates a client for the hosted service with the default configuration.
    ///
    /// # Errors
    ///
    /// - `GenerationError::RequestFailed` if the internal HTTP client fails to build.
    pub fn new() -> Result<Self, GenerationError> {
        Self::with_config(DEFAULT_API_URL, ClientConfig::default())
    }

    /// Creates a client with a custom base URL.
    ///
    /// This is useful for testing or for connecting to a different API endpoint.
    ///
    /// # Errors
    ///
    /// - `GenerationError::RequestFailed` if the internal HTTP client fails to build.
    /// - `GenerationError::UrlParseFailed` if the provided `base_url` is invalid.
    pub fn new_with_url(base_url: &str) -> Result<Self, GenerationError> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Creates a client with a custom base URL and endpoint/timing configuration.
    pub fn with_config(base_url: &str, config: ClientConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("image2video/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The status endpoint of the job with the given id.
    pub fn status_url_for(&self, request_id: &str) -> Result<Url, GenerationError> {
        Ok(self.base_url.join(&self.config.status_path(request_id))?)
    }

    /// Generates a video from `request.image_url` and waits for it.
    ///
    /// Returns immediately when the service answers the submission with a finished
    /// video. Otherwise the job is polled every `poll_interval` until it resolves,
    /// fails, or `poll_ceiling` has elapsed since submission.
    ///
    /// # Errors
    ///
    /// - `GenerationError::Submission` if the job could not be submitted.
    /// - `GenerationError::JobFailed` if the service reports `failed` or `nsfw`.
    /// - `GenerationError::NonRetryablePoll` on a 4xx (other than 429) while polling.
    /// - `GenerationError::PollingTimeout` if the ceiling is reached.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use image2video::{Credentials, GenerationClient, GenerationRequest};
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// let client = GenerationClient::new()?;
    /// let request = GenerationRequest::new(
    ///     "https://example.com/cat.png",
    ///     Credentials::new("key", "secret"),
    /// )
    /// .on_progress(|status| println!("status: {status}"));
    ///
    /// let outcome = client.generate(request).await?;
    /// println!("video: {:?}", outcome.video_url());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.generate_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Same as [`generate`](Self::generate), but stops with
    /// `GenerationError::Cancelled` as soon as `cancel` fires during a polling wait.
    ///
    /// A request already in flight is allowed to finish; the job keeps running server-side.
    #[tracing::instrument(
        name = "generate_video",
        skip(self, request, cancel),
        fields(image_url = %request.image_url),
        err
    )]
    pub async fn generate_with_cancellation(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        let handle = self.submit(&request).await?;

        if let Some(video) = &handle.video {
            info!(source = ?video, "Video ready without polling");
            return Ok(GenerationOutcome::Ready(VideoResult {
                video_url: video.url().to_string(),
                response: handle.response,
            }));
        }

        if !handle.is_trackable() {
            warn!("Submission response has neither a request id nor a status URL");
            return Ok(GenerationOutcome::Indeterminate {
                response: handle.response,
            });
        }

        self.wait_for_job(
            &handle,
            &request.credentials,
            request.on_progress.as_ref(),
            cancel,
        )
        .await
    }

    /// Submits a new image-to-video job.
    ///
    /// The returned [`JobHandle`] says whether the video is already available and, if
    /// not, where its status can be polled.
    #[tracing::instrument(
        name = "submit_job",
        skip(self, request),
        fields(image_url = %request.image_url),
        err
    )]
    pub async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, GenerationError> {
        validate(request)?;

        let url = self.base_url.join(&self.config.submit_path)?;
        let payload = JobPayload::for_image(&request.image_url);
        let submitted_at = Instant::now();

        let response = authorize(self.client.post(url), &request.credentials)
            .json(&payload)
            .timeout(self.config.submit_timeout)
            .send()
            .await
            .map_err(|e| GenerationError::Submission {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Submission {
                status: Some(status.as_u16()),
                message: error_body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Submission {
                status: Some(status.as_u16()),
                message: format!("unreadable response body: {e}"),
            })?;

        let handle = self.job_handle(body, submitted_at)?;
        debug!(
            request_id = ?handle.request_id,
            status_url = ?handle.status_url.as_ref().map(Url::as_str),
            ready = handle.is_ready(),
            "Job submitted"
        );
        Ok(handle)
    }

    fn job_handle(&self, response: Value, submitted_at: Instant) -> Result<JobHandle, GenerationError> {
        let video = VideoSource::resolve(&response);
        let request_id = types::request_id(&response);

        let explicit = types::status_url(&response).and_then(|raw| match self.base_url.join(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(status_url = %raw, error = %e, "Ignoring malformed status URL");
                None
            }
        });

        let status_url = match (explicit, &request_id) {
            (Some(url), _) => Some(url),
            (None, Some(id)) => Some(self.status_url_for(id).map_err(|e| {
                GenerationError::Submission {
                    status: None,
                    message: format!("cannot build status URL for `{id}`: {e}"),
                }
            })?),
            (None, None) => None,
        };

        Ok(JobHandle {
            request_id,
            status_url,
            video,
            response,
            submitted_at,
        })
    }

    /// Performs one status check.
    ///
    /// Failures are returned as [`PollFailure`] so the caller can decide whether they
    /// are worth retrying.
    pub async fn get_status(
        &self,
        status_url: &Url,
        credentials: &Credentials,
    ) -> Result<Value, PollFailure> {
        let response = authorize(self.client.get(status_url.clone()), credentials)
            .send()
            .await
            .map_err(|e| PollFailure {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(PollFailure {
                status: Some(status.as_u16()),
                message: error_body,
            });
        }

        response.json().await.map_err(|e| PollFailure {
            status: None,
            message: format!("unreadable status response: {e}"),
        })
    }

    /// Polls a submitted job until it resolves.
    ///
    /// Each cycle first waits `poll_interval`, then checks the status once.
    /// `on_progress` receives the reported status after every successful check.
    /// Network errors, 5xx and 429 responses are logged and retried without
    /// extending the time budget.
    #[tracing::instrument(
        name = "wait_for_job",
        skip(self, handle, credentials, on_progress, cancel),
        fields(request_id = ?handle.request_id),
        err
    )]
    pub async fn wait_for_job(
        &self,
        handle: &JobHandle,
        credentials: &Credentials,
        on_progress: Option<&ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        let Some(status_url) = handle.status_url.as_ref() else {
            return Ok(GenerationOutcome::Indeterminate {
                response: handle.response.clone(),
            });
        };

        let ceiling = self.config.poll_ceiling;
        let mut attempt: u32 = 0;

        while handle.submitted_at.elapsed() < ceiling {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = sleep(self.config.poll_interval) => {}
            }
            attempt += 1;

            let response = match self.get_status(status_url, credentials).await {
                Ok(response) => response,
                Err(failure) => match failure.non_retryable_status() {
                    Some(status) => {
                        return Err(GenerationError::NonRetryablePoll {
                            status,
                            message: failure.message,
                        })
                    }
                    None => {
                        warn!(attempt, error = %failure, "Status check failed, retrying");
                        continue;
                    }
                },
            };

            let status = JobStatus::from_response(&response);
            debug!(
                attempt,
                status = %status,
                elapsed_ms = handle.submitted_at.elapsed().as_millis() as u64,
                "Job status"
            );
            if let Some(callback) = on_progress {
                callback(status.as_str());
            }

            if let Some(video) = VideoSource::resolve(&response) {
                info!(attempt, "Video ready");
                return Ok(GenerationOutcome::Ready(VideoResult {
                    video_url: video.into_url(),
                    response,
                }));
            }

            if status.is_success() {
                warn!(status = %status, "Job finished without a video location");
                return Ok(GenerationOutcome::Indeterminate { response });
            }

            if status.is_failure() {
                return Err(GenerationError::JobFailed {
                    status: status.to_string(),
                    detail: types::error_detail(&response),
                });
            }
        }

        Err(GenerationError::PollingTimeout { ceiling })
    }

    /// Downloads a finished video into `dest_dir`.
    ///
    /// The file name is taken from the last segment of the video URL.
    ///
    /// # Errors
    ///
    /// This function can return an error if the download fails, if the destination
    /// directory or file cannot be created, or if the file cannot be written.
    pub async fn download_video<P: AsRef<Path>>(
        &self,
        video: &VideoResult,
        dest_dir: P,
    ) -> Result<PathBuf, GenerationError> {
        let parsed_url = Url::parse(&video.video_url)?;
        let file_name = parsed_url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .unwrap_or("video.mp4");

        let file_path = dest_dir.as_ref().join(file_name);
        let response = self.client.get(parsed_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Download {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        fs::create_dir_all(dest_dir.as_ref()).await?;

        let mut file = fs::File::create(&file_path).await?;
        let content = response.bytes().await?;
        file.write_all(&content).await?;
        file.flush().await?;

        info!(path = %file_path.display(), bytes = content.len(), "Video downloaded");
        Ok(file_path)
    }
}

fn authorize(builder: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
    builder
        .header(API_KEY_HEADER, credentials.api_key.as_str())
        .header(SECRET_HEADER, credentials.secret.as_str())
}

fn validate(request: &GenerationRequest) -> Result<(), GenerationError> {
    if !request.credentials.is_complete() {
        return Err(GenerationError::MissingCredentials);
    }

    let invalid = |reason: &str| GenerationError::InvalidImageUrl {
        url: request.image_url.clone(),
        reason: reason.to_string(),
    };

    if request.image_url.trim().is_empty() {
        return Err(invalid("empty"));
    }
    let parsed = Url::parse(&request.image_url).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(&format!("unsupported scheme `{other}`"))),
    }
}
