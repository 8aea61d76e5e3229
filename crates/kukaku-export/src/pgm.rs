//! Portable anymap text encoders.
//!
//! P2 (ASCII graymap) for intensity grids, P3 (ASCII pixmap) for
//! colorized output. One text row per image row, samples separated by
//! single spaces — the format `kukaku-io` parses back.

use std::fmt::Write as _;

use image::RgbaImage;
use kukaku_pipeline::Grid;

/// Encode an intensity grid as P2 (ASCII graymap) text.
#[must_use]
pub fn encode_p2(grid: &Grid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "P2");
    let _ = writeln!(out, "{} {}", grid.width(), grid.height());
    let _ = writeln!(out, "255");
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            if col > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{}", grid.get(row, col));
        }
        out.push('\n');
    }
    out
}

/// Encode a colorized image as P3 (ASCII pixmap) text; the alpha
/// channel is dropped.
#[must_use]
pub fn encode_p3(image: &RgbaImage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "P3");
    let _ = writeln!(out, "{} {}", image.width(), image.height());
    let _ = writeln!(out, "255");
    for y in 0..image.height() {
        for x in 0..image.width() {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            if x > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{r} {g} {b}");
        }
        out.push('\n');
    }
    out
}
