use futures::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::PipelineError;
use crate::pipeline::Fetch;

/// Upper bound on the buffer reserved up front from `Content-Length`.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Get standard user agent string
pub fn get_user_agent() -> &'static str {
    concat!("wimg/", env!("CARGO_PKG_VERSION"))
}

/// Fetches source images over HTTP(S) with a single GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let fetch_error = |reason: String| PipelineError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let pb = download_progress(response.content_length());
        let capacity = response.content_length().unwrap_or(0).min(MAX_PREALLOC);
        let mut body = Vec::with_capacity(capacity as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                pb.abandon();
                fetch_error(format!("failed to read response body: {}", e))
            })?;
            body.extend_from_slice(&chunk);
            pb.inc(chunk.len() as u64);
        }
        pb.finish_and_clear();

        tracing::debug!(bytes = body.len(), "download complete");
        Ok(body)
    }
}

/// Byte progress bar on stderr; a spinner when the length is unknown.
fn download_progress(len: Option<u64>) -> ProgressBar {
    match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
            pb.set_style(style);
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb
        }
    }
}
