//! Generates a video from an image URL and downloads it.
//!
//! To run this example, you must have the `HF_API_KEY` and `HF_SECRET`
//! environment variables set (a `.env` file works too).
//!
//! Usage:
//! `cargo run --example generate <IMAGE_URL> [OUTPUT_DIR]`

use image2video::{Credentials, GenerationClient, GenerationOutcome, GenerationRequest};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file if it exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("image2video=info")),
        )
        .init();

    let image_url = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Please provide an image URL as a command-line argument."))?;
    let output_dir = env::args().nth(2).unwrap_or_else(|| "videos".to_string());
    let credentials = Credentials::new(env::var("HF_API_KEY")?, env::var("HF_SECRET")?);

    let client = GenerationClient::new()?;
    let request = GenerationRequest::new(image_url, credentials)
        .on_progress(|status| println!("Job status: {}", status));

    println!("Submitting image...");
    match client.generate(request).await? {
        GenerationOutcome::Ready(video) => {
            println!("\nVideo ready: {}", video.video_url);

            let path = client.download_video(&video, &output_dir).await?;
            println!("Downloaded to {}", path.display());
        }
        GenerationOutcome::Indeterminate { response } => {
            println!("\nThe job could not be tracked. Last response:\n{:#}", response);
        }
    }

    Ok(())
}
