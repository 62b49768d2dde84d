//! Animated GIF decomposition into still PNG frames
//!
//! Each source gets its own folder named after its stem, holding
//! `<stem>_frame_0000.png`, `<stem>_frame_0001.png`, ... Frames are decoded
//! one at a time until the decoder's frame sequence runs out; every frame
//! is stored as RGBA so transparency survives.

use crate::error::{Error, Result};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::report::OperationResult;
use crate::walk::{Extension, walk};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};

/// How the input path of [`extract_frames`] is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// The input is one animated GIF
    SingleFile,
    /// The input is searched recursively for GIFs
    Directory,
}

/// One GIF and the folder its frames go to
#[derive(Debug)]
struct FrameSource {
    path: PathBuf,
    output_dir: PathBuf,
}

/// `<stem>_frame_<NNNN>.png`
pub fn frame_file_name(stem: &str, index: usize) -> String {
    format!("{}_frame_{:04}.png", stem, index)
}

/// Split every GIF under `input` into PNG frames below `output_base`
///
/// Directory mode mirrors each GIF's relative folder under `output_base`.
/// `succeeded` is the total number of frames written; a GIF that fails to
/// decode counts once in `failed`, keeping any frames already written.
pub fn extract_frames(
    input: &Path,
    output_base: &Path,
    mode: ExtractMode,
    progress: &dyn ProgressSink,
) -> Result<OperationResult> {
    let _span = span!(Level::INFO, "extract_frames", ?input, ?output_base, ?mode).entered();

    let mut result = OperationResult::new();
    let sources = match mode {
        ExtractMode::SingleFile => single_source(input, output_base)?,
        ExtractMode::Directory => directory_sources(input, output_base, &mut result)?,
    };

    if sources.is_empty() {
        info!("No GIF files found");
        result.log.push("No GIF files found.");
        return Ok(result);
    }

    fs::create_dir_all(output_base)?;

    let total = sources.len();
    info!(total, "Found GIF files");

    for (index, source) in sources.iter().enumerate() {
        let file_name = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut written = 0;
        let outcome = extract_one(source, &file_name, index + 1, total, progress, &mut written);
        result.succeeded += written;

        match outcome {
            Ok(()) => {
                debug!(path = ?source.path, frames = written, "Extracted frames");
                result.log.push(format!(
                    "Extracted {} frames from '{}' into '{}'",
                    written,
                    file_name,
                    source.output_dir.display()
                ));
            }
            Err(e) => {
                error!(path = ?source.path, error = %e, frames = written, "Error processing GIF");
                result.failed += 1;
                result.log.push(format!(
                    "Error processing GIF '{}' after {} frames: {}",
                    source.path.display(),
                    written,
                    e
                ));
            }
        }
    }

    info!(frames = result.succeeded, failed = result.failed, "Frame extraction complete");
    Ok(result)
}

fn is_gif(path: &Path) -> bool {
    path.file_name()
        .map(|name| Extension::from_file_name(name).as_str() == "gif")
        .unwrap_or(false)
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn single_source(input: &Path, output_base: &Path) -> Result<Vec<FrameSource>> {
    if !input.is_file() || !is_gif(input) {
        return Err(Error::InvalidFrameSource {
            path: input.to_path_buf(),
        });
    }

    Ok(vec![FrameSource {
        path: input.to_path_buf(),
        output_dir: output_base.join(stem_of(input)),
    }])
}

fn directory_sources(
    input: &Path,
    output_base: &Path,
    result: &mut OperationResult,
) -> Result<Vec<FrameSource>> {
    if !input.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: input.to_path_buf(),
        });
    }

    let mut sources = Vec::new();
    for item in walk(input) {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                result.log.push(format!("Skipped unreadable entry: {}", e));
                continue;
            }
        };
        if entry.extension.as_str() != "gif" {
            continue;
        }

        let relative_dir = entry.relative_path.parent().unwrap_or(Path::new(""));
        sources.push(FrameSource {
            output_dir: output_base
                .join(relative_dir)
                .join(stem_of(&entry.absolute_path)),
            path: entry.absolute_path,
        });
    }

    Ok(sources)
}

fn extract_one(
    source: &FrameSource,
    file_name: &str,
    current: usize,
    total: usize,
    progress: &dyn ProgressSink,
    written: &mut usize,
) -> Result<()> {
    let decode_error = |message: String| Error::ImageDecode {
        path: source.path.clone(),
        message,
    };

    fs::create_dir_all(&source.output_dir)?;

    let reader = BufReader::new(File::open(&source.path)?);
    let decoder = GifDecoder::new(reader).map_err(|e| decode_error(e.to_string()))?;
    let stem = stem_of(&source.path);

    // The frame iterator ending is the normal end of the animation
    for (index, frame) in decoder.into_frames().enumerate() {
        let frame = frame.map_err(|e| decode_error(e.to_string()))?;
        let frame_path = source.output_dir.join(frame_file_name(&stem, index));

        frame
            .into_buffer()
            .save_with_format(&frame_path, ImageFormat::Png)
            .map_err(|e| Error::ImageEncode {
                path: frame_path.clone(),
                message: e.to_string(),
            })?;
        *written += 1;

        progress.notify(&ProgressEvent::new(current, total, file_name).with_frame(index, None));
    }

    Ok(())
}
