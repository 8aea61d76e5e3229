//! Shared types for the kukaku segmentation pipeline.

use serde::{Deserialize, Serialize};

/// A rectangular grid of intensity samples in `[0, 255]`.
///
/// Stored row-major. Construction validates shape — every row must have
/// the same length and the grid must contain at least one pixel — so a
/// `Grid` in hand is always rectangular and non-empty. The grid is
/// immutable for the duration of a segmentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Grid {
    /// Build a grid from a slice of rows.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidGrid`] if the rows have unequal
    /// lengths, or if the grid would contain no pixels.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, SegmentError> {
        let Some(first) = rows.first() else {
            return Err(SegmentError::InvalidGrid("grid has no rows".to_owned()));
        };
        let width = first.len();
        if width == 0 {
            return Err(SegmentError::InvalidGrid("grid rows are empty".to_owned()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SegmentError::InvalidGrid(format!(
                    "row {i} has {} samples, expected {width}",
                    row.len(),
                )));
            }
        }
        let mut data = Vec::with_capacity(width * rows.len());
        for row in rows {
            data.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height: rows.len(),
            data,
        })
    }

    /// Build a grid from row-major raw samples.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidGrid`] if either dimension is
    /// zero or `data.len() != width * height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, SegmentError> {
        if width == 0 || height == 0 {
            return Err(SegmentError::InvalidGrid(format!(
                "grid dimensions {width}x{height} contain no pixels",
            )));
        }
        if data.len() != width * height {
            return Err(SegmentError::InvalidGrid(format!(
                "{} samples do not fill a {width}x{height} grid",
                data.len(),
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidGrid`] if either dimension is zero.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> u8,
    ) -> Result<Self, SegmentError> {
        if width == 0 || height == 0 {
            return Err(SegmentError::InvalidGrid(format!(
                "grid dimensions {width}x{height} contain no pixels",
            )));
        }
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Shape-preserving internal constructor; callers guarantee
    /// `data.len() == width * height` with both dimensions nonzero.
    pub(crate) const fn from_raw_parts(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total pixel count (`width * height`). Never zero.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always `false`; a constructed grid holds at least one pixel.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Row-major pixel index of `(row, col)`.
    #[must_use]
    pub const fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Intensity at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[self.index(row, col)]
    }

    /// Row-major raw samples.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Per-pixel component labels produced by a segmentation run.
///
/// Each cell holds the root id of its component — an arbitrary pixel
/// index in `[0, width * height)`, not a compacted sequence. Read-only
/// output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    width: usize,
    height: usize,
    labels: Vec<usize>,
}

impl LabelGrid {
    pub(crate) const fn new(width: usize, height: usize, labels: Vec<usize>) -> Self {
        Self {
            width,
            height,
            labels,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Component id at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> usize {
        self.labels[row * self.width + col]
    }

    /// Row-major component ids.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}

/// Result of a segmentation run: the label grid plus the number of
/// distinct regions it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// Per-pixel component labels.
    pub labels: LabelGrid,
    /// Number of distinct regions in `labels`.
    pub region_count: usize,
}

/// Boundary treatment for the smoothing convolution.
///
/// The Gaussian kernel extends past the grid near borders; this policy
/// decides what happens to the out-of-bounds taps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderPolicy {
    /// Skip out-of-bounds taps without rescaling. Border cells sum only
    /// the in-bounds kernel mass, which systematically darkens them.
    #[default]
    Truncate,
    /// Divide by the in-bounds kernel mass so border cells keep the
    /// brightness of their neighborhood.
    Renormalize,
}

/// Configuration for a segmentation run.
///
/// All parameters have defaults matching the reference parameterization.
/// [`SegmentConfig::validate`] is called by [`segment`](crate::segment)
/// before any computation; invalid values return
/// [`SegmentError::InvalidParameter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Scale parameter: evidence required to keep two regions separate.
    /// Larger values favor larger, coarser regions. Must be positive.
    pub k: u32,

    /// Side length of the square Gaussian kernel. Must be odd; 1 means
    /// no smoothing.
    pub kernel_size: usize,

    /// Gaussian standard deviation. Must be positive and finite.
    pub sigma: f64,

    /// Boundary treatment for the smoothing convolution.
    pub border: BorderPolicy,
}

impl SegmentConfig {
    /// Default scale parameter.
    pub const DEFAULT_K: u32 = 300;
    /// Default smoothing kernel side length.
    pub const DEFAULT_KERNEL_SIZE: usize = 3;
    /// Default Gaussian standard deviation.
    pub const DEFAULT_SIGMA: f64 = 0.8;

    /// Pick a scale parameter from the grid dimensions.
    ///
    /// Small images need less evidence to keep regions apart, so `k`
    /// steps up with the half-perimeter: 150 up to 260, 300 up to 600,
    /// 500 beyond.
    #[must_use]
    pub const fn auto_k(width: usize, height: usize) -> u32 {
        let half_perimeter = width + height;
        if half_perimeter <= 260 {
            150
        } else if half_perimeter <= 600 {
            300
        } else {
            500
        }
    }

    /// Check every parameter before computation begins.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidParameter`] if `k` is zero, if
    /// `kernel_size` is zero or even, or if `sigma` is not a positive
    /// finite number.
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.k == 0 {
            return Err(SegmentError::InvalidParameter(
                "scale parameter k must be positive".to_owned(),
            ));
        }
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(SegmentError::InvalidParameter(format!(
                "kernel size must be odd, got {}",
                self.kernel_size,
            )));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(SegmentError::InvalidParameter(format!(
                "sigma must be positive, got {}",
                self.sigma,
            )));
        }
        Ok(())
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            k: Self::DEFAULT_K,
            kernel_size: Self::DEFAULT_KERNEL_SIZE,
            sigma: Self::DEFAULT_SIGMA,
            border: BorderPolicy::default(),
        }
    }
}

/// Errors surfaced by the segmentation core.
///
/// Both variants are deterministic, fatal to the run, and raised before
/// any partial result exists.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    /// The input grid is ragged or has no pixels.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// A segmentation parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
