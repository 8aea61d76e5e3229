//! Gaussian smoothing to suppress noise before edge-weight computation.
//!
//! A square Gaussian kernel is convolved over the grid so that single
//! noisy samples stop producing spurious high-weight edges. Boundary
//! cells are governed by [`BorderPolicy`]: the kernel taps that fall
//! outside the grid are either skipped outright (darkening the rim) or
//! compensated for by renormalizing against the in-bounds kernel mass.

use crate::types::{BorderPolicy, Grid};

/// Build a normalized square Gaussian kernel.
///
/// `size` is the side length (expected odd), `sigma` the standard
/// deviation. Weights follow `exp(-(dx² + dy²) / (2σ²))` and are scaled
/// to sum to 1, so any constant front factor cancels. Returned
/// row-major, `size * size` entries.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let half = (size / 2) as isize;
    let mut kernel = Vec::with_capacity(size * size);
    let mut sum = 0.0;
    for dy in -half..=half {
        for dx in -half..=half {
            let (x, y) = (dx as f64, dy as f64);
            let weight = (-(x * x + y * y) / (2.0 * sigma * sigma)).exp();
            kernel.push(weight);
            sum += weight;
        }
    }
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Apply Gaussian smoothing to a grid.
///
/// Returns a grid of identical dimensions with each cell replaced by
/// the kernel-weighted neighborhood sum, rounded to the nearest
/// integer. Out-of-bounds kernel taps are handled per `border`: with
/// [`BorderPolicy::Truncate`] they are skipped without rescaling, with
/// [`BorderPolicy::Renormalize`] the sum is divided by the in-bounds
/// kernel mass.
///
/// A `kernel_size` of 1 or a non-positive `sigma` returns the grid
/// unchanged; parameter validation proper happens in
/// [`SegmentConfig::validate`](crate::SegmentConfig::validate).
#[must_use = "returns the smoothed grid"]
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]
pub fn smooth(grid: &Grid, kernel_size: usize, sigma: f64, border: BorderPolicy) -> Grid {
    if kernel_size <= 1 || sigma <= 0.0 {
        return grid.clone();
    }
    debug_assert!(kernel_size % 2 == 1, "kernel size must be odd");

    let kernel = gaussian_kernel(kernel_size, sigma);
    let half = (kernel_size / 2) as isize;
    let (width, height) = (grid.width(), grid.height());

    let mut data = Vec::with_capacity(grid.len());
    for row in 0..height {
        for col in 0..width {
            let mut acc = 0.0;
            let mut in_bounds_mass = 0.0;
            for ky in -half..=half {
                for kx in -half..=half {
                    let nrow = row as isize + ky;
                    let ncol = col as isize + kx;
                    if nrow < 0 || nrow >= height as isize || ncol < 0 || ncol >= width as isize {
                        continue;
                    }
                    let tap = kernel[((ky + half) * kernel_size as isize + (kx + half)) as usize];
                    acc += f64::from(grid.get(nrow as usize, ncol as usize)) * tap;
                    in_bounds_mass += tap;
                }
            }
            let value = match border {
                BorderPolicy::Truncate => acc,
                BorderPolicy::Renormalize => acc / in_bounds_mass,
            };
            data.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }

    Grid::from_raw_parts(width, height, data)
}
