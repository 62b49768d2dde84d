//! Batch resize and re-encode of a flat image directory
//!
//! Only the immediate files of the source directory are considered. Each
//! image is scaled by a fraction with Lanczos3 resampling, flattened to RGB
//! when the target format has no alpha channel, and written as
//! `<stem>.<format>` into the destination. Outputs are not deduplicated: a
//! later input with the same stem overwrites an earlier one.

use crate::error::{Error, Result};
use crate::imaging::formats::{self, OutputFormat};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::report::{OperationLog, OperationResult};
use crate::walk::Extension;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};

/// Largest output canvas accepted, in pixels (about 16k x 16k)
pub const MAX_OUTPUT_PIXELS: u64 = 256 * 1024 * 1024;

/// Allocation ceiling handed to the decoders
const MAX_DECODE_ALLOC: u64 = 1024 * 1024 * 1024;

/// Scale, output format and quality of a transcode run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    /// Size factor, e.g. 0.5 for half size
    pub scale: f64,
    pub format: OutputFormat,
    /// Encoder quality 1-100, used by lossy formats
    pub quality: u8,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            format: OutputFormat::Jpeg,
            quality: 85,
        }
    }
}

impl TranscodeOptions {
    pub fn new(scale: f64, format: OutputFormat, quality: u8) -> Self {
        Self {
            scale,
            format,
            quality,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidScale(self.scale));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(Error::InvalidQuality(self.quality));
        }
        Ok(())
    }
}

/// `(floor(width * scale), floor(height * scale))`
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scale_axis = |value: u32| (f64::from(value) * scale).floor() as u32;
    (scale_axis(width), scale_axis(height))
}

/// Convert to the color model the target format can store
///
/// Formats without alpha get plain RGB (alpha dropped); the rest keep
/// RGBA when the source has transparency and RGB otherwise.
pub fn prepare_for(image: DynamicImage, format: OutputFormat) -> DynamicImage {
    if !format.supports_alpha() {
        DynamicImage::ImageRgb8(image.into_rgb8())
    } else if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.into_rgb8())
    }
}

/// Resize and re-encode every image directly inside `source_dir`
///
/// Returns the number of images written as `succeeded`. Files that fail to
/// decode or encode are logged and counted in `failed`.
pub fn transcode(
    source_dir: &Path,
    dest_dir: &Path,
    options: &TranscodeOptions,
    progress: &dyn ProgressSink,
) -> Result<OperationResult> {
    let _span = span!(
        Level::INFO,
        "transcode",
        ?source_dir,
        ?dest_dir,
        scale = options.scale,
        format = %options.format
    )
    .entered();

    for dir in [source_dir, dest_dir] {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }
    }
    options.validate()?;

    let mut result = OperationResult::new();
    let candidates = list_candidates(source_dir, &mut result.log)?;
    if candidates.is_empty() {
        info!("No supported images found");
        result.log.push("No supported images found.");
        return Ok(result);
    }

    let total = candidates.len();
    info!(total, "Found images to transcode");

    for (index, path) in candidates.iter().enumerate() {
        let file_name = display_name(path);
        progress.notify(&ProgressEvent::new(index + 1, total, file_name.as_str()));

        match transcode_file(path, dest_dir, options) {
            Ok(output) => {
                debug!(source = ?path, ?output, "Transcoded image");
                result.succeeded += 1;
                result
                    .log
                    .push(format!("Processed '{}' -> '{}'", file_name, output.display()));
            }
            Err(e) => {
                error!(source = ?path, error = %e, "Could not process image");
                result.failed += 1;
                result
                    .log
                    .push(format!("Could not process {}: {}", file_name, e));
            }
        }
    }

    info!("{}", result.summary());
    Ok(result)
}

/// Immediate files of `dir` whose extension is in the format table
fn list_candidates(dir: &Path, log: &mut OperationLog) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for item in fs::read_dir(dir)? {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!(?dir, error = %e, "Skipping unreadable entry");
                log.push(format!("Skipped unreadable entry: {}", e));
                continue;
            }
        };

        let path = entry.path();
        if path.is_file() && formats::is_input_candidate(&Extension::from_file_name(&entry.file_name())) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn transcode_file(path: &Path, dest_dir: &Path, options: &TranscodeOptions) -> Result<PathBuf> {
    let image = decode(path)?;

    let (width, height) = scaled_dimensions(image.width(), image.height(), options.scale);
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_OUTPUT_PIXELS {
        return Err(Error::ImageEncode {
            path: path.to_path_buf(),
            message: format!(
                "scaled size {}x{} exceeds the {} pixel limit (source {}x{})",
                width,
                height,
                MAX_OUTPUT_PIXELS,
                image.width(),
                image.height()
            ),
        });
    }
    if width == 0 || height == 0 {
        return Err(Error::ImageEncode {
            path: path.to_path_buf(),
            message: format!(
                "scaled size {}x{} is empty (source {}x{})",
                width,
                height,
                image.width(),
                image.height()
            ),
        });
    }

    let resized = image.resize_exact(width, height, FilterType::Lanczos3);
    let prepared = prepare_for(resized, options.format);

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = dest_dir.join(format!("{}.{}", stem, options.format.extension()));

    if let Err(e) = encode(&prepared, &output, options) {
        let _ = fs::remove_file(&output);
        return Err(e);
    }
    Ok(output)
}

fn decode(path: &Path) -> Result<DynamicImage> {
    let decode_error = |message: String| Error::ImageDecode {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = ImageReader::open(path)?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?;

    let mut limits = Limits::default();
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    reader.limits(limits);

    reader.decode().map_err(|e| {
        let extension = Extension::from_file_name(path.as_os_str());
        match formats::lookup(extension.as_str()) {
            Some(info) if !info.decodable => {
                decode_error(format!("{} (no built-in decoder for .{})", e, info.extension))
            }
            _ => decode_error(e.to_string()),
        }
    })
}

fn encode(image: &DynamicImage, output: &Path, options: &TranscodeOptions) -> Result<()> {
    let encode_error = |message: String| Error::ImageEncode {
        path: output.to_path_buf(),
        message,
    };

    let mut writer = BufWriter::new(File::create(output)?);

    let encoded = match options.format {
        OutputFormat::Jpeg => {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, options.quality))
        }
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new_with_quality(
            &mut writer,
            CompressionType::Best,
            PngFilter::Adaptive,
        )),
        other => image.write_to(&mut writer, other.image_format()),
    };
    encoded.map_err(|e| encode_error(e.to_string()))?;

    writer.flush()?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use image::{ColorType, GenericImageView, Rgba, RgbaImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 20) as u8, (y * 20) as u8, 128, if x % 2 == 0 { 255 } else { 64 }])
        });
        img.save_with_format(path, image::ImageFormat::Png).unwrap();
    }

    fn dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in");
        let dest = dir.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        (dir, source, dest)
    }

    #[test]
    fn test_scaled_dimensions_floor() {
        assert_eq!(scaled_dimensions(10, 6, 0.5), (5, 3));
        assert_eq!(scaled_dimensions(7, 5, 0.5), (3, 2));
        assert_eq!(scaled_dimensions(3, 3, 0.1), (0, 0));
        assert_eq!(scaled_dimensions(100, 50, 1.5), (150, 75));
    }

    #[test]
    fn test_options_validation() {
        assert!(TranscodeOptions::default().validate().is_ok());
        assert!(matches!(
            TranscodeOptions::new(0.0, OutputFormat::Png, 85).validate(),
            Err(Error::InvalidScale(_))
        ));
        assert!(matches!(
            TranscodeOptions::new(f64::NAN, OutputFormat::Png, 85).validate(),
            Err(Error::InvalidScale(_))
        ));
        assert!(matches!(
            TranscodeOptions::new(0.5, OutputFormat::Jpeg, 0).validate(),
            Err(Error::InvalidQuality(0))
        ));
    }

    #[test]
    fn test_jpeg_output_is_scaled_and_flattened() {
        let (_dir, source, dest) = dirs();
        write_png(&source.join("alpha.png"), 10, 6);

        let options = TranscodeOptions::new(0.5, OutputFormat::Jpeg, 90);
        let result = transcode(&source, &dest, &options, &NoProgress).unwrap();

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 0);
        let output = image::open(dest.join("alpha.jpeg")).unwrap();
        assert_eq!(output.dimensions(), (5, 3));
        assert!(!output.color().has_alpha());
    }

    #[test]
    fn test_png_output_keeps_alpha() {
        let (_dir, source, dest) = dirs();
        write_png(&source.join("alpha.png"), 7, 5);

        let options = TranscodeOptions::new(0.5, OutputFormat::Png, 85);
        transcode(&source, &dest, &options, &NoProgress).unwrap();

        let output = image::open(dest.join("alpha.png")).unwrap();
        assert_eq!(output.dimensions(), (3, 2));
        assert_eq!(output.color(), ColorType::Rgba8);
    }

    #[test]
    fn test_prepare_for_flattens_only_alpha_less_targets() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        assert_eq!(prepare_for(img.clone(), OutputFormat::Jpeg).color(), ColorType::Rgb8);
        assert_eq!(prepare_for(img.clone(), OutputFormat::Gif).color(), ColorType::Rgba8);

        let opaque = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        assert_eq!(prepare_for(opaque, OutputFormat::Png).color(), ColorType::Rgb8);
    }

    #[test]
    fn test_undecodable_candidate_is_item_failure() {
        let (_dir, source, dest) = dirs();
        write_png(&source.join("good.png"), 4, 4);
        fs::write(source.join("camera.cr2"), b"not really raw data").unwrap();
        fs::write(source.join("notes.txt"), b"ignored").unwrap();

        let options = TranscodeOptions::new(1.0, OutputFormat::Bmp, 85);
        let result = transcode(&source, &dest, &options, &NoProgress).unwrap();

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);
        assert!(result.log.contains("camera.cr2"));
        assert!(result.log.contains("no built-in decoder"));
        assert!(dest.join("good.bmp").exists());
        assert!(!dest.join("camera.bmp").exists());
    }

    #[test]
    fn test_empty_scaled_size_is_item_failure() {
        let (_dir, source, dest) = dirs();
        write_png(&source.join("tiny.png"), 2, 2);

        let options = TranscodeOptions::new(0.1, OutputFormat::Png, 85);
        let result = transcode(&source, &dest, &options, &NoProgress).unwrap();

        assert_eq!(result.succeeded, 0);
        assert_eq!(result.failed, 1);
    }

    #[test]
    fn test_oversized_output_is_item_failure() {
        let (_dir, source, dest) = dirs();
        write_png(&source.join("a.png"), 100, 100);
        write_png(&source.join("b.png"), 1, 1);

        let options = TranscodeOptions::new(1e8, OutputFormat::Png, 85);
        let result = transcode(&source, &dest, &options, &NoProgress).unwrap();

        assert_eq!(result.succeeded, 0);
        assert_eq!(result.failed, 2);
        assert!(result.log.contains("pixel limit"));
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn test_webp_is_lossless_and_ignores_quality() {
        let (_dir, source, dest) = dirs();
        write_png(&source.join("alpha.png"), 6, 4);

        let low = TranscodeOptions::new(1.0, OutputFormat::Webp, 10);
        transcode(&source, &dest, &low, &NoProgress).unwrap();
        let low_bytes = fs::read(dest.join("alpha.webp")).unwrap();

        let high = TranscodeOptions::new(1.0, OutputFormat::Webp, 100);
        transcode(&source, &dest, &high, &NoProgress).unwrap();
        let high_bytes = fs::read(dest.join("alpha.webp")).unwrap();

        assert_eq!(low_bytes, high_bytes);
        let decoded = image::open(dest.join("alpha.webp")).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (6, 4));
    }

    #[test]
    fn test_subdirectories_are_not_scanned() {
        let (_dir, source, dest) = dirs();
        fs::create_dir(source.join("nested")).unwrap();
        write_png(&source.join("nested/inner.png"), 4, 4);

        let result = transcode(&source, &dest, &TranscodeOptions::default(), &NoProgress).unwrap();

        assert_eq!(result.succeeded, 0);
        assert!(result.log.contains("No supported images found"));
    }

    #[test]
    fn test_same_stem_overwrites_silently() {
        let (_dir, source, dest) = dirs();
        write_png(&source.join("pic.png"), 4, 4);
        RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]))
            .save_with_format(source.join("pic.tga"), image::ImageFormat::Tga)
            .unwrap();

        let options = TranscodeOptions::new(1.0, OutputFormat::Png, 85);
        let result = transcode(&source, &dest, &options, &NoProgress).unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 1);
        // Candidates run in name order, so pic.tga is written last
        assert_eq!(image::open(dest.join("pic.png")).unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn test_preconditions_fail_before_any_output() {
        let (dir, source, dest) = dirs();
        write_png(&source.join("a.png"), 4, 4);

        let missing = dir.path().join("missing");
        let err = transcode(&source, &missing, &TranscodeOptions::default(), &NoProgress).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound { .. }));

        let bad = TranscodeOptions::new(-1.0, OutputFormat::Png, 85);
        let err = transcode(&source, &dest, &bad, &NoProgress).unwrap_err();
        assert!(matches!(err, Error::InvalidScale(_)));
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }
}
