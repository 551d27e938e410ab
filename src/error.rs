use std::path::PathBuf;

/// Every way a conversion run can fail.
///
/// None of these are retried; they propagate to `main`, which prints them and
/// exits with a non-zero status.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Unsupported format, no usable output directory, or a name with path separators.
    #[error("{0}")]
    Config(String),

    /// Never raised for `&str` input, which is always valid UTF-8.
    #[allow(dead_code)]
    #[error("cannot derive a file name from {raw:?}: {reason}")]
    Normalization { raw: String, reason: &'static str },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Unrecognized or corrupt image bytes.
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

impl PipelineError {
    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
