//! xxHash-based content digests for duplicate detection
//!
//! Files are streamed through a 128-bit xxh3 hasher, so memory use stays
//! flat regardless of file size. Two files are treated as duplicates iff
//! their digests are equal.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::trace;
use xxhash_rust::xxh3::Xxh3;

/// Read buffer size for streaming file content into the hasher (256KB)
const READ_CHUNK: usize = 256 * 1024;

/// 128-bit digest of a file's full byte content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContentDigest(u128);

impl ContentDigest {
    /// Digest of an in-memory byte slice
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(bytes);
        Self(hasher.digest128())
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Compute the content digest of a file
pub fn compute_file_digest(path: &Path) -> Result<ContentDigest> {
    let file = File::open(path).map_err(|e| Error::HashComputation {
        path: path.to_path_buf(),
        message: format!("Failed to open file: {}", e),
    })?;

    let mut reader = BufReader::with_capacity(READ_CHUNK, file);
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    let mut total = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| Error::HashComputation {
            path: path.to_path_buf(),
            message: format!("Failed to read file: {}", e),
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    let digest = ContentDigest(hasher.digest128());
    trace!(?path, bytes = total, %digest, "Computed content digest");
    Ok(digest)
}
