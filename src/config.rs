use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::PipelineError;
use crate::utils::files::ensure_output_dir;

/// Subdirectory of the user home that receives images by default.
const IMAGE_SUBDIR: &str = "img";

/// Startup environment, resolved once in `main` and handed to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub home: Option<PathBuf>,
}

impl Config {
    /// Read the user home from `HOME`, falling back to `USERPROFILE`.
    pub fn from_env() -> Self {
        Self::from_vars(env::var_os("HOME"), env::var_os("USERPROFILE"))
    }

    fn from_vars(home: Option<OsString>, user_profile: Option<OsString>) -> Self {
        let home = home
            .filter(|v| !v.is_empty())
            .or_else(|| user_profile.filter(|v| !v.is_empty()))
            .map(PathBuf::from);
        Self { home }
    }

    /// `<home>/img`, if a home directory is known.
    pub fn default_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join(IMAGE_SUBDIR))
    }
}

/// Options for a single conversion run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Output directory; `None` means the configured default.
    pub dir: Option<PathBuf>,
    /// Base name override; `None` derives it from the source URL.
    pub name: Option<String>,
    /// Output format name, validated before any network I/O.
    pub format: String,
    /// JPEG quality, ignored by the lossless formats.
    pub quality: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dir: None,
            name: None,
            format: "jpg".to_string(),
            quality: 100,
        }
    }
}

impl Options {
    /// Pick the output directory and check that it exists.
    pub fn output_dir(&self, config: &Config) -> Result<PathBuf, PipelineError> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => config.default_dir().ok_or_else(|| {
                PipelineError::Config("user home directory not found".to_string())
            })?,
        };
        ensure_output_dir(&dir)?;
        Ok(dir)
    }
}
