//! Batch Organizer - bulk file organization and image batch processing
//!
//! This library provides synchronous batch operations over directory trees:
//! - Extension scanning and per-extension sorting into `<ext>_files` folders
//! - xxHash-based duplicate detection against a reference tree
//! - Bottom-up pruning of empty folders
//! - Image rescaling/re-encoding and GIF frame extraction
//!
//! Every operation returns a structured result with an ordered log and
//! reports progress through a [`ProgressSink`].

pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod extensions;
pub mod hash;
pub mod imaging;
pub mod naming;
pub mod progress;
pub mod prune;
pub mod report;
pub mod sort;
pub mod walk;

pub use cli::{Cli, Command};
pub use config::{Config, ConfigError, TranscodeDefaults};
pub use dedupe::{DuplicateIndex, find_duplicates};
pub use error::{Error, Result};
pub use extensions::{count_extensions, scan_extensions};
pub use hash::{ContentDigest, compute_file_digest};
pub use imaging::{
    ExtractMode, FORMAT_TABLE, FormatInfo, OutputFormat, TranscodeOptions, extract_frames,
    transcode,
};
pub use naming::resolve_unique_name;
pub use progress::{FrameProgress, NoProgress, ProgressEvent, ProgressSink};
pub use prune::prune_empty_dirs;
pub use report::{DuplicateReport, OperationLog, OperationResult};
pub use sort::sort_by_extension;
pub use walk::{Extension, FileEntry, NO_EXTENSION, Walk, walk};
