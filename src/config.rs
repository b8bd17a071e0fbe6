use std::time::Duration;

pub(crate) const DEFAULT_API_URL: &str = "https://platform.higgsfield.ai/";

/// Endpoint layout and timing of a [`GenerationClient`](crate::GenerationClient).
///
/// The defaults match the hosted service. Tests and slow hosts can shrink or
/// stretch the polling cadence with the `with_*` setters.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Path of the job submission endpoint, relative to the base URL.
    pub submit_path: String,
    /// Path of the status endpoint; `{request_id}` is replaced with the job id.
    pub status_path_template: String,
    /// Upper bound on the initial submission handshake.
    pub submit_timeout: Duration,
    /// Fixed delay before every status check.
    pub poll_interval: Duration,
    /// Total wall-clock budget, measured from submission.
    pub poll_ceiling: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            submit_path: "v1/image2video/dop".to_string(),
            status_path_template: "requests/{request_id}/status".to_string(),
            submit_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            poll_ceiling: Duration::from_secs(2000),
        }
    }
}

impl ClientConfig {
    pub fn with_submit_path(mut self, path: impl Into<String>) -> Self {
        self.submit_path = path.into();
        self
    }

    pub fn with_status_path_template(mut self, template: impl Into<String>) -> Self {
        self.status_path_template = template.into();
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_ceiling(mut self, ceiling: Duration) -> Self {
        self.poll_ceiling = ceiling;
        self
    }

    pub(crate) fn status_path(&self, request_id: &str) -> String {
        self.status_path_template.replace("{request_id}", request_id)
    }
}
