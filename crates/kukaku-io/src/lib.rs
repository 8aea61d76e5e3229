//! kukaku-io: grid loading for the segmentation pipeline.
//!
//! Turns external pixel data into a validated
//! [`Grid`](kukaku_pipeline::Grid): any raster format the `image`
//! crate decodes (PNG, JPEG, BMP, WebP) via [`decode_grid`], or the
//! plain PGM formats via [`pgm::parse`]. The conversions are pure —
//! bytes in, grid out — so reading files stays with the caller.

pub mod pgm;

use kukaku_pipeline::{Grid, SegmentError};

/// Errors raised while turning external bytes into a [`Grid`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input byte buffer was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The `image` crate could not decode the input.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The PGM magic number was not P2 or P5.
    #[error("unsupported PGM magic {0:?} (only P2 and P5 are supported)")]
    UnsupportedMagic(String),

    /// The PGM header or sample data was malformed.
    #[error("malformed PGM: {0}")]
    MalformedPgm(String),

    /// The PGM maxval does not fit single-byte samples.
    #[error("PGM maxval {0} is out of range (1..=255)")]
    MaxvalOutOfRange(u32),

    /// The decoded samples did not form a valid grid.
    #[error(transparent)]
    Grid(#[from] SegmentError),
}

/// Decode raster image bytes into an intensity grid.
///
/// Supports whatever the `image` crate can decode; multi-channel
/// images are converted to luma with the standard weighted formula
/// before the samples become grid intensities.
///
/// # Errors
///
/// Returns [`LoadError::EmptyInput`] if `bytes` is empty,
/// [`LoadError::ImageDecode`] if the format is unrecognized or the
/// data is corrupt, and [`LoadError::Grid`] if the decoded image has
/// no pixels.
pub fn decode_grid(bytes: &[u8]) -> Result<Grid, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::EmptyInput);
    }

    let luma = image::load_from_memory(bytes)?.to_luma8();
    let (width, height) = (luma.width() as usize, luma.height() as usize);
    Ok(Grid::from_raw(width, height, luma.into_raw())?)
}
