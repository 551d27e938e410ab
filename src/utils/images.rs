use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Frame, GenericImageView, ImageFormat, ImageResult};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::PipelineError;

/// Codecs the decoder will accept, sniffed from magic bytes.
const DECODABLE: [ImageFormat; 3] = [ImageFormat::Gif, ImageFormat::Jpeg, ImageFormat::Png];

/// Output formats. Parsing and encoder dispatch both live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Gif,
    Jpg,
    Png,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Gif, Self::Jpg, Self::Png];

    /// File extension, also the canonical name accepted by `--format`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }

    /// Only JPEG honours a quality setting.
    pub fn uses_quality(self) -> bool {
        matches!(self, Self::Jpg)
    }

    /// Encode `image` into `writer`. `quality` is ignored unless the format uses it.
    pub fn encode<W: Write>(
        self,
        image: &DynamicImage,
        writer: W,
        quality: u8,
    ) -> ImageResult<()> {
        match self {
            Self::Jpg => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
                rgb.write_with_encoder(encoder)
            }
            Self::Png => image.write_with_encoder(PngEncoder::new(writer)),
            Self::Gif => {
                let mut encoder = GifEncoder::new(writer);
                encoder.encode_frame(Frame::new(image.to_rgba8()))
            }
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            other => {
                let supported: Vec<&str> = Self::ALL.iter().map(|f| f.extension()).collect();
                Err(PipelineError::Config(format!(
                    "unsupported format {:?} (supported: {})",
                    other,
                    supported.join(", ")
                )))
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A decoded raster image and the codec it came from.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub source_format: ImageFormat,
}

impl DecodedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Decode fetched bytes, auto-detecting GIF, JPEG or PNG.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, PipelineError> {
    let format = image::guess_format(bytes)
        .map_err(|e| PipelineError::Decode(format!("unrecognized image data: {}", e)))?;

    if !DECODABLE.contains(&format) {
        return Err(PipelineError::Decode(format!(
            "unsupported source format {:?}",
            format
        )));
    }

    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    Ok(DecodedImage {
        image,
        source_format: format,
    })
}
