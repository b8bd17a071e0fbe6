//! An asynchronous Rust client that turns an image into a short AI-generated video.
//!
//! Give it the URL of an image and a pair of API credentials; it submits a
//! generation job to the video service and hands back the URL of the finished
//! video. Jobs that complete during submission are returned immediately, all
//! others are polled at a fixed interval until they resolve, fail or time out.
//!
//! ## Features
//! - One call from image URL to video URL: [`GenerationClient::generate`].
//! - Progress reporting through a caller-supplied callback.
//! - Transient polling errors (network, 5xx, 429) are retried; client errors are not.
//! - Cooperative cancellation with [`CancellationToken`].
//! - Typed error handling via [`GenerationError`].
//! - A helper for downloading the generated video.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::GenerationClient;
pub use config::ClientConfig;
pub use error::{GenerationError, PollFailure};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    Credentials, GenerationOutcome, GenerationRequest, JobHandle, JobPayload, JobStatus,
    ProgressCallback, VideoResult, VideoSource,
};
