//! Static table of known raster/document formats
//!
//! Every extension in [`FORMAT_TABLE`] is accepted as transcoder input.
//! `decodable` records whether the bundled decoders can actually read it;
//! camera RAW, PDF, PSD and friends are listed so they are attempted and
//! reported rather than silently ignored. `supports_alpha` drives the
//! flatten-before-encode decision for output formats.

use crate::error::{Error, Result};
use crate::walk::Extension;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capabilities of one file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub extension: &'static str,
    pub decodable: bool,
    pub supports_alpha: bool,
}

const fn entry(extension: &'static str, decodable: bool, supports_alpha: bool) -> FormatInfo {
    FormatInfo {
        extension,
        decodable,
        supports_alpha,
    }
}

/// Camera RAW shorthand: listed as input, no bundled decoder
const fn raw(extension: &'static str) -> FormatInfo {
    entry(extension, false, false)
}

pub static FORMAT_TABLE: &[FormatInfo] = &[
    // Common
    entry("jpg", true, false),
    entry("jpeg", true, false),
    entry("png", true, true),
    entry("bmp", true, true),
    entry("gif", true, true),
    entry("tiff", true, true),
    entry("tif", true, true),
    entry("webp", true, true),
    // Professional/large
    entry("psd", false, true),
    entry("hdr", true, false),
    entry("tga", true, true),
    entry("xcf", false, true),
    entry("miff", false, true),
    entry("dcm", false, false),
    entry("xpm", false, true),
    entry("pcx", false, false),
    // Specialized
    entry("fits", false, false),
    entry("ppm", true, false),
    entry("pgm", true, false),
    entry("pfm", false, false),
    entry("mng", false, true),
    entry("dds", false, true),
    entry("otb", false, false),
    entry("pdf", false, false),
    // Modern containers without a bundled decoder
    entry("avif", false, true),
    entry("heic", false, true),
    entry("heif", false, true),
    // Camera RAW
    raw("cr2"),
    raw("rw2"),
    raw("nef"),
    raw("arw"),
    raw("sr2"),
    raw("orf"),
    raw("pef"),
    raw("raf"),
    raw("srw"),
    raw("mrw"),
    raw("dcr"),
    raw("dng"),
    raw("erf"),
    raw("3fr"),
    raw("ari"),
    raw("srf"),
    raw("bay"),
    raw("crw"),
    raw("cap"),
    raw("iiq"),
    raw("eip"),
    raw("dcs"),
    raw("drf"),
    raw("k25"),
    raw("kdc"),
    raw("fff"),
    raw("mef"),
    raw("mos"),
    raw("nrw"),
    raw("ptx"),
    raw("pxn"),
    raw("r3d"),
    raw("rwl"),
    raw("rwz"),
    raw("x3f"),
    raw("mdc"),
];

/// Look up a normalized (lowercase, dotless) extension
pub fn lookup(extension: &str) -> Option<&'static FormatInfo> {
    FORMAT_TABLE.iter().find(|info| info.extension == extension)
}

/// Whether a file with this extension is offered to the transcoder
pub fn is_input_candidate(extension: &Extension) -> bool {
    match extension {
        Extension::Named(ext) => lookup(ext).is_some(),
        Extension::None => false,
    }
}

/// Formats the transcoder can write
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "jpg")]
    #[value(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
    Bmp,
    Gif,
    #[serde(alias = "tif")]
    #[value(alias = "tif")]
    Tiff,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Webp,
        OutputFormat::Bmp,
        OutputFormat::Gif,
        OutputFormat::Tiff,
    ];

    /// Extension written on output files
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Gif => "gif",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }

    /// Whether output keeps an alpha channel (from the format table)
    pub fn supports_alpha(&self) -> bool {
        lookup(self.extension())
            .map(|info| info.supports_alpha)
            .unwrap_or(false)
    }

    /// Whether the quality setting affects the encoder
    pub fn uses_quality(&self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            "bmp" => Ok(OutputFormat::Bmp),
            "gif" => Ok(OutputFormat::Gif),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            _ => Err(Error::UnsupportedOutputFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_no_duplicate_extensions() {
        for (i, info) in FORMAT_TABLE.iter().enumerate() {
            assert!(
                FORMAT_TABLE[i + 1..].iter().all(|other| other.extension != info.extension),
                "duplicate entry for {}",
                info.extension
            );
            assert_eq!(info.extension, info.extension.to_lowercase());
        }
    }

    #[test]
    fn test_input_candidates() {
        assert!(is_input_candidate(&Extension::Named("jpg".into())));
        assert!(is_input_candidate(&Extension::Named("cr2".into())));
        assert!(is_input_candidate(&Extension::Named("pdf".into())));
        assert!(!is_input_candidate(&Extension::Named("txt".into())));
        assert!(!is_input_candidate(&Extension::None));
    }

    #[test]
    fn test_raw_and_documents_are_not_decodable() {
        assert!(!lookup("cr2").unwrap().decodable);
        assert!(!lookup("pdf").unwrap().decodable);
        assert!(lookup("png").unwrap().decodable);
    }

    #[test]
    fn test_alpha_decision_is_table_driven() {
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert!(OutputFormat::Png.supports_alpha());
        assert!(OutputFormat::Gif.supports_alpha());
        for format in OutputFormat::ALL {
            let info = lookup(format.extension()).unwrap();
            assert!(info.decodable);
            assert_eq!(format.supports_alpha(), info.supports_alpha);
        }
    }

    #[test]
    fn test_only_jpeg_uses_quality() {
        let users: Vec<_> = OutputFormat::ALL
            .iter()
            .filter(|format| format.uses_quality())
            .collect();
        assert_eq!(users, vec![&OutputFormat::Jpeg]);
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert_eq!("WebP".parse::<OutputFormat>().unwrap(), OutputFormat::Webp);
        assert!(matches!(
            "heic".parse::<OutputFormat>(),
            Err(Error::UnsupportedOutputFormat(_))
        ));
    }
}
