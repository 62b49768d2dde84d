//! CLI argument parsing with clap

use crate::config::Config;
use crate::imaging::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Batch Organizer - bulk file organization and image batch processing
///
/// Sorts files into per-extension folders, removes content duplicates,
/// prunes empty folders, rescales/re-encodes image folders and splits
/// animated GIFs into frames.
#[derive(Parser, Debug)]
#[command(name = "batch-organizer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Print the operation result as JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the distinct file extensions under a directory
    Extensions {
        /// Directory to scan recursively
        dir: PathBuf,
    },

    /// Move every file with one extension into `<ext>_files`
    Sort {
        /// Directory to organize
        dir: PathBuf,

        /// Extension to collect (`jpg`, `.JPG` or `no_extension`)
        extension: String,
    },

    /// Delete files in CHECK whose content already exists in REFERENCE
    Dedupe {
        /// Directory holding the originals (never modified)
        reference: PathBuf,

        /// Directory to clean
        check: PathBuf,

        /// Dry run mode - report duplicates without deleting them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Remove empty folders bottom-up
    Prune {
        /// Directory to clean (never removed itself)
        dir: PathBuf,

        /// Dry run mode - report empty folders without deleting them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Rescale and re-encode the images of a folder
    Transcode {
        /// Folder with the input images (not searched recursively)
        source: PathBuf,

        /// Output folder
        dest: PathBuf,

        /// Output size in percent of the input
        #[arg(short, long)]
        scale: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// JPEG quality (1-100); ignored by the other formats
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
    },

    /// Split animated GIFs into PNG frames
    Frames {
        /// A GIF file, or a directory searched recursively for GIFs
        input: PathBuf,

        /// Base folder for the extracted frames
        output: PathBuf,
    },

    /// Write a commented sample configuration file
    InitConfig {
        /// Where to write the file
        path: PathBuf,

        /// Write the effective settings (config file plus flags) instead
        #[arg(long)]
        current: bool,
    },
}

impl Command {
    /// Short name used for log file naming
    pub fn name(&self) -> &'static str {
        match self {
            Command::Extensions { .. } => "extensions",
            Command::Sort { .. } => "sort",
            Command::Dedupe { .. } => "dedupe",
            Command::Prune { .. } => "prune",
            Command::Transcode { .. } => "transcode",
            Command::Frames { .. } => "frames",
            Command::InitConfig { .. } => "init-config",
        }
    }
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if self.verbose {
            config.verbose = true;
        }

        match &self.command {
            Command::Dedupe { dry_run, .. } | Command::Prune { dry_run, .. } => {
                if *dry_run {
                    config.dry_run = true;
                }
            }
            Command::Transcode {
                scale,
                format,
                quality,
                ..
            } => {
                if let Some(scale) = scale {
                    config.transcode.scale_percent = *scale;
                }
                if let Some(format) = format {
                    config.transcode.format = *format;
                }
                if let Some(quality) = quality {
                    config.transcode.quality = *quality;
                }
            }
            _ => {}
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
