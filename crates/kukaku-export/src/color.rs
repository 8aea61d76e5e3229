//! Label-grid colorization.
//!
//! Region ids are arbitrary pixel indices, so visualization assigns
//! colors by walking the RGB cube in fixed-size steps: the step is
//! sized from the region count so the assigned colors spread across
//! the full spectrum, and labels receive colors in first-seen
//! (row-major) order. The walk is deterministic, so the same
//! segmentation always renders identically.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use image::{Rgba, RgbaImage};
use kukaku_pipeline::{LabelGrid, Segmentation};

/// Full extent of the RGB cube walked by the colorizer.
const SPECTRUM: u32 = 255 * 255 * 255;

/// Errors raised while serializing segmentation output.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The color walk ran off the end of the RGB cube.
    #[error("palette exhausted: cannot assign {regions} distinct region colors")]
    PaletteExhausted {
        /// Number of regions that were requested.
        regions: usize,
    },
}

/// Deterministic walk through the RGB cube.
///
/// Starts at black and advances the red channel by `step` per color;
/// overflow carries into green, then blue. Yields `None` once blue
/// overflows — the cube is exhausted.
struct ColorWalk {
    step: u32,
    r: u32,
    g: u32,
    b: u32,
    exhausted: bool,
}

impl ColorWalk {
    /// Size the step so `regions` colors cover the spectrum.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn for_regions(regions: usize) -> Self {
        let step = if regions == 0 {
            u32::from(u8::MAX)
        } else {
            ((f64::from(SPECTRUM) / regions as f64).cbrt() as u32).max(1)
        };
        Self {
            step,
            r: 0,
            g: 0,
            b: 0,
            exhausted: false,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_color(&mut self) -> Option<Rgba<u8>> {
        if self.exhausted {
            return None;
        }
        let color = Rgba([self.r as u8, self.g as u8, self.b as u8, u8::MAX]);

        self.r += self.step;
        if self.r > 255 {
            self.r -= 256;
            self.g += self.step;
            if self.g > 255 {
                self.g -= 256;
                self.b += self.step;
                if self.b > 255 {
                    self.exhausted = true;
                }
            }
        }
        Some(color)
    }
}

/// Render a segmentation as a colorized RGBA image.
///
/// Each distinct region gets its own color, assigned in row-major
/// first-seen order by the spectrum walk.
///
/// # Errors
///
/// Returns [`ExportError::PaletteExhausted`] if the walk cannot supply
/// one color per region.
#[allow(clippy::cast_possible_truncation)]
pub fn colorize(segmentation: &Segmentation) -> Result<RgbaImage, ExportError> {
    let labels = &segmentation.labels;
    let mut palette: HashMap<usize, Rgba<u8>> = HashMap::with_capacity(segmentation.region_count);
    let mut walk = ColorWalk::for_regions(segmentation.region_count);

    let (width, height) = (labels.width(), labels.height());
    let mut img = RgbaImage::new(width as u32, height as u32);
    for row in 0..height {
        for col in 0..width {
            let label = labels.get(row, col);
            let color = match palette.entry(label) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let color = walk.next_color().ok_or(ExportError::PaletteExhausted {
                        regions: segmentation.region_count,
                    })?;
                    *entry.insert(color)
                }
            };
            img.put_pixel(col as u32, row as u32, color);
        }
    }
    Ok(img)
}

/// Render a label grid as a two-tone image: the region of the top-left
/// pixel is treated as background and painted black, everything else
/// white.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn dual_tone(labels: &LabelGrid) -> RgbaImage {
    let background = labels.get(0, 0);
    let (width, height) = (labels.width(), labels.height());
    let mut img = RgbaImage::new(width as u32, height as u32);
    for row in 0..height {
        for col in 0..width {
            let tone = if labels.get(row, col) == background {
                0
            } else {
                u8::MAX
            };
            img.put_pixel(col as u32, row as u32, Rgba([tone, tone, tone, u8::MAX]));
        }
    }
    img
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kukaku_pipeline::{Grid, SegmentConfig, segment};

    use super::*;

    /// Two-region segmentation of the `[0, 0, 100, 100]` row.
    fn two_region_segmentation() -> Segmentation {
        let grid = Grid::from_rows(&[vec![0, 0, 100, 100]]).unwrap();
        let config = SegmentConfig {
            k: 50,
            kernel_size: 1,
            ..SegmentConfig::default()
        };
        segment(&grid, &config).unwrap()
    }

    #[test]
    fn colorize_assigns_one_color_per_region() {
        let segmentation = two_region_segmentation();
        let img = colorize(&segmentation).unwrap();
        assert_eq!((img.width(), img.height()), (4, 1));

        let left = img.get_pixel(0, 0);
        assert_eq!(left, img.get_pixel(1, 0));
        let right = img.get_pixel(2, 0);
        assert_eq!(right, img.get_pixel(3, 0));
        assert_ne!(left, right);
    }

    #[test]
    fn colorize_starts_at_black_and_is_opaque() {
        let segmentation = two_region_segmentation();
        let img = colorize(&segmentation).unwrap();
        // First-seen region takes the walk's first color.
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        for pixel in img.pixels() {
            assert_eq!(pixel.0[3], 255);
        }
    }

    #[test]
    fn colorize_is_deterministic() {
        let segmentation = two_region_segmentation();
        let a = colorize(&segmentation).unwrap();
        let b = colorize(&segmentation).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn many_regions_get_distinct_colors() {
        // Maximal fragmentation: alternating extremes with k = 1 keep
        // every pixel its own region.
        let grid = Grid::from_fn(16, 1, |_, col| if col % 2 == 0 { 0 } else { 255 }).unwrap();
        let config = SegmentConfig {
            k: 1,
            kernel_size: 1,
            ..SegmentConfig::default()
        };
        let segmentation = segment(&grid, &config).unwrap();
        assert_eq!(segmentation.region_count, 16);

        let img = colorize(&segmentation).unwrap();
        let distinct: std::collections::HashSet<[u8; 4]> =
            img.pixels().map(|p| p.0).collect();
        assert_eq!(distinct.len(), 16);
    }

    #[test]
    fn color_walk_is_finite_and_collision_free() {
        let mut walk = ColorWalk::for_regions(1);
        assert!(walk.step >= 254, "one region should take near-maximal steps");

        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        while let Some(color) = walk.next_color() {
            assert!(seen.insert(color.0), "walk repeated {:?}", color.0);
            count += 1;
            assert!(count <= 1000, "a step-255 walk should exhaust quickly");
        }
        assert!(count > 0);
    }

    #[test]
    fn dual_tone_paints_background_black() {
        let segmentation = two_region_segmentation();
        let img = dual_tone(&segmentation.labels);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(3, 0).0, [255, 255, 255, 255]);
    }
}
