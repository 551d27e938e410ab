use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::utils::images::{DecodedImage, OutputFormat};

/// Output directories must already exist; they are never created.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PipelineError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::Config(format!(
            "output directory {} does not exist",
            dir.display()
        )))
    }
}

/// Rejects names that would place the output outside its directory.
pub fn ensure_file_name(name: &str) -> Result<(), PipelineError> {
    if name.contains(['/', '\\', '\0']) {
        return Err(PipelineError::Config(format!(
            "name {:?} must not contain path separators",
            name
        )));
    }
    Ok(())
}

/// `{width}x{height}_{name}.{ext}` under `dir`.
pub fn resolve_output_path(
    dir: &Path,
    name: &str,
    (width, height): (u32, u32),
    format: OutputFormat,
) -> PathBuf {
    dir.join(format!(
        "{}x{}_{}.{}",
        width,
        height,
        name,
        format.extension()
    ))
}

/// Create (or truncate) `path` and encode `image` into it.
///
/// The file handle is dropped before returning on every path. A failed encode
/// may leave a truncated file behind.
pub fn write_image(
    path: &Path,
    image: &DecodedImage,
    format: OutputFormat,
    quality: u8,
) -> Result<(), PipelineError> {
    let file = fs::File::create(path).map_err(|e| PipelineError::write(path, e))?;
    let mut writer = BufWriter::new(file);

    format
        .encode(&image.image, &mut writer, quality)
        .map_err(|e| PipelineError::write(path, e))?;
    writer.flush().map_err(|e| PipelineError::write(path, e))?;

    Ok(())
}
