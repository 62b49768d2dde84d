//! Image batch operations
//!
//! Decoding, resampling and encoding are delegated to the `image` crate:
//! - [`transcode`]: scale a flat directory of images and re-encode them
//! - [`frames`]: split animated GIFs into PNG frames
//! - [`formats`]: the static table of known input/output formats

pub mod formats;
pub mod frames;
pub mod transcode;

pub use formats::{FORMAT_TABLE, FormatInfo, OutputFormat};
pub use frames::{ExtractMode, extract_frames, frame_file_name};
pub use transcode::{MAX_OUTPUT_PIXELS, TranscodeOptions, scaled_dimensions, transcode};
