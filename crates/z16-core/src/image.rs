//! Flat binary image loading.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::memory::MEMORY_BYTES;
use crate::CoreState;

/// Errors raised while loading a memory image from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be opened.
    #[error("cannot open image {}: {source}", path.display())]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The image file was opened but reading it failed.
    #[error("cannot read image {}: {source}", path.display())]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Reads at most 64 KiB from `path` into memory starting at address 0.
///
/// Returns the number of bytes loaded. An empty file loads 0 bytes; bytes
/// past 64 KiB are never read.
///
/// # Errors
///
/// Returns [`LoadError::Open`] or [`LoadError::Read`] when the file cannot
/// be opened or read. Memory is left untouched in that case.
pub fn load_image_file(path: &Path, state: &mut CoreState) -> Result<usize, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let limit = u64::try_from(MEMORY_BYTES).unwrap_or(u64::MAX);
    let mut image = Vec::with_capacity(MEMORY_BYTES);
    file.take(limit)
        .read_to_end(&mut image)
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let loaded = state.load_image_bytes(&image);
    log::debug!("loaded {loaded} bytes from {}", path.display());
    Ok(loaded)
}
