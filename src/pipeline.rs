//! The fetch → decode → name → encode pipeline.
//!
//! Every stage runs to completion before the next starts and any error aborts
//! the run. Format, output directory and name are all checked before the
//! network is touched.

use std::future::Future;
use std::path::PathBuf;

use crate::config::{Config, Options};
use crate::error::PipelineError;
use crate::name::resolve_name;
use crate::utils::files::{ensure_file_name, resolve_output_path, write_image};
use crate::utils::images::{decode, OutputFormat};

/// Source of image bytes for a URL.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, PipelineError>>;
}

pub struct ConversionPipeline<'a, F> {
    fetcher: F,
    config: &'a Config,
}

impl<'a, F: Fetch> ConversionPipeline<'a, F> {
    pub fn new(fetcher: F, config: &'a Config) -> Self {
        Self { fetcher, config }
    }

    /// Convert the image at `source` and return the path it was written to.
    pub async fn run(&self, source: &str, options: &Options) -> Result<PathBuf, PipelineError> {
        let format: OutputFormat = options.format.parse()?;
        let dir = options.output_dir(self.config)?;
        let name = resolve_name(source, options.name.as_deref())?;
        ensure_file_name(&name)?;

        tracing::info!("fetching {}", source);
        let bytes = self.fetcher.fetch(source).await?;

        let image = decode(&bytes)?;
        let (width, height) = image.dimensions();
        tracing::debug!(
            source_format = ?image.source_format,
            width,
            height,
            "decoded image"
        );

        let path = resolve_output_path(&dir, &name, (width, height), format);
        if !format.uses_quality() {
            tracing::debug!(quality = options.quality, %format, "quality ignored");
        }
        write_image(&path, &image, format, options.quality)?;

        tracing::info!("saved {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::images::tests::sample_bytes;
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;

    /// Serves canned bytes and counts how often it was asked.
    struct SpyFetcher {
        body: Vec<u8>,
        calls: Cell<usize>,
    }

    impl SpyFetcher {
        fn serving(body: Vec<u8>) -> Self {
            Self {
                body,
                calls: Cell::new(0),
            }
        }
    }

    impl Fetch for SpyFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, PipelineError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.body.clone())
        }
    }

    impl Fetch for &SpyFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
            (**self).fetch(url).await
        }
    }

    struct FailingFetcher;

    impl Fetch for FailingFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
            Err(PipelineError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
        }
    }

    fn options_in(dir: &Path, format: &str) -> Options {
        Options {
            dir: Some(dir.to_path_buf()),
            format: format.to_string(),
            ..Options::default()
        }
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    const SOURCE: &str = "https://example.com/path/Vacation.PNG";

    #[tokio::test]
    async fn png_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let spy = SpyFetcher::serving(sample_bytes(12, 9, OutputFormat::Png));
        let pipeline = ConversionPipeline::new(&spy, &config);

        let options = Options {
            quality: 5,
            ..options_in(tmp.path(), "png")
        };
        let path = pipeline.run(SOURCE, &options).await.unwrap();

        assert_eq!(path, tmp.path().join("12x9_vacation.png"));
        assert_eq!(spy.calls.get(), 1);

        let written = fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&written).unwrap(),
            image::ImageFormat::Png
        );
        let decoded = image::load_from_memory(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 9));
        // Lossless: quality 5 left the pixels untouched.
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0).0, [200, 40, 90]);
    }

    #[tokio::test]
    async fn default_format_is_jpeg() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let spy = SpyFetcher::serving(sample_bytes(64, 48, OutputFormat::Gif));
        let pipeline = ConversionPipeline::new(&spy, &config);

        let options = Options {
            dir: Some(tmp.path().to_path_buf()),
            name: Some("Beach".to_string()),
            ..Options::default()
        };
        let path = pipeline.run(SOURCE, &options).await.unwrap();

        assert!(path.ends_with("64x48_beach.jpg"));
        let written = fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&written).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn unsupported_format_never_fetches() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let spy = SpyFetcher::serving(sample_bytes(4, 4, OutputFormat::Png));
        let pipeline = ConversionPipeline::new(&spy, &config);

        let err = pipeline
            .run(SOURCE, &options_in(tmp.path(), "bmp"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(spy.calls.get(), 0);
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn missing_home_never_fetches() {
        let config = Config::default();
        let spy = SpyFetcher::serving(sample_bytes(4, 4, OutputFormat::Png));
        let pipeline = ConversionPipeline::new(&spy, &config);

        let err = pipeline.run(SOURCE, &Options::default()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(spy.calls.get(), 0);
    }

    #[tokio::test]
    async fn missing_basename_writes_empty_slug() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let spy = SpyFetcher::serving(sample_bytes(4, 3, OutputFormat::Png));
        let pipeline = ConversionPipeline::new(&spy, &config);

        let path = pipeline
            .run("https://example.com/", &options_in(tmp.path(), "png"))
            .await
            .unwrap();

        assert_eq!(path, tmp.path().join("4x3_.png"));
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn name_with_separator_never_fetches() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let spy = SpyFetcher::serving(sample_bytes(4, 4, OutputFormat::Png));
        let pipeline = ConversionPipeline::new(&spy, &config);

        let options = Options {
            name: Some("../escape".to_string()),
            ..options_in(tmp.path(), "png")
        };
        let err = pipeline.run(SOURCE, &options).await.unwrap_err();

        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(spy.calls.get(), 0);
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn non_image_bytes_leave_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let spy = SpyFetcher::serving(b"<!doctype html><p>moved</p>".to_vec());
        let pipeline = ConversionPipeline::new(&spy, &config);

        let err = pipeline
            .run(SOURCE, &options_in(tmp.path(), "png"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Decode(_)));
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let pipeline = ConversionPipeline::new(FailingFetcher, &config);

        let err = pipeline
            .run(SOURCE, &options_in(tmp.path(), "jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Fetch { .. }));
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn existing_output_is_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("3x3_vacation.gif");
        fs::write(&target, b"stale").unwrap();

        let config = Config::default();
        let spy = SpyFetcher::serving(sample_bytes(3, 3, OutputFormat::Jpg));
        let pipeline = ConversionPipeline::new(&spy, &config);

        let path = pipeline
            .run(SOURCE, &options_in(tmp.path(), "gif"))
            .await
            .unwrap();

        assert_eq!(path, target);
        let written = fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&written).unwrap(),
            image::ImageFormat::Gif
        );
    }
}
