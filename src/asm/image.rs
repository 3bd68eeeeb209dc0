//! Flat binary images.
//!
//! An image is just bytes: byte 0 is loaded at RAM address 0. There is no
//! header, so anything up to 64K can be loaded.

use std::path::Path;
use thiserror::Error;

/// Largest image that fits in the address space.
pub const MAX_IMAGE_SIZE: usize = 0x1_0000;

/// Load a flat image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    check_size(&bytes)?;

    tracing::debug!(path = %path.as_ref().display(), bytes = bytes.len(), "loaded image");
    Ok(bytes)
}

/// Save a flat image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &[u8]) -> Result<(), ImageError> {
    check_size(image)?;
    std::fs::write(path.as_ref(), image)
        .map_err(|e| ImageError::IoError(e.to_string()))
}

fn check_size(image: &[u8]) -> Result<(), ImageError> {
    if image.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(image.len()));
    }
    Ok(())
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("image is {0} bytes; the address space holds 65536")]
    TooLarge(usize),
}
