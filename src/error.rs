use std::time::Duration;

/// Represents the possible errors that can occur while generating a video.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API key and secret must both be provided")]
    MissingCredentials,
    #[error("Invalid image URL `{url}`: {reason}")]
    InvalidImageUrl { url: String, reason: String },
    /// The initial job submission failed: network error, timeout or a non-2xx response.
    #[error("Job submission failed{}: {message}", status_suffix(.status))]
    Submission {
        status: Option<u16>,
        message: String,
    },
    /// The service reported a terminal failure status (`failed` or `nsfw`).
    #[error("Video generation failed with status `{status}`{}", detail_suffix(.detail))]
    JobFailed {
        status: String,
        detail: Option<String>,
    },
    #[error("Video generation timed out after {ceiling:?}")]
    PollingTimeout { ceiling: Duration },
    /// A client error (4xx other than 429) while polling; polling stops immediately.
    #[error("Status check rejected with HTTP {status}: {message}")]
    NonRetryablePoll { status: u16, message: String },
    #[error("Video generation was cancelled")]
    Cancelled,
    #[error("Video download failed with HTTP {status}: {message}")]
    Download { status: u16, message: String },
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("URL parsing failed: {0}")]
    UrlParseFailed(#[from] url::ParseError),
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// A single failed status check.
///
/// Most of these are swallowed by the polling loop; only the ones that are not
/// [transient](PollFailure::is_transient) become a [`GenerationError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollFailure {
    /// HTTP status of the response, absent for network and decoding failures.
    pub status: Option<u16>,
    pub message: String,
}

impl PollFailure {
    /// Network failures, rate limiting (429) and server errors (5xx) are worth retrying.
    pub fn is_transient(&self) -> bool {
        self.non_retryable_status().is_none()
    }

    /// The HTTP status of a client error (4xx other than 429) that should end polling.
    pub fn non_retryable_status(&self) -> Option<u16> {
        self.status
            .filter(|status| (400..500).contains(status) && *status != 429)
    }
}

impl std::fmt::Display for PollFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => f.write_str(&self.message),
        }
    }
}
