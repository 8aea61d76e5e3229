//! PGM (portable graymap) parsing.
//!
//! Supports the two grayscale PGM flavors: P2 (ASCII samples) and P5
//! (binary samples), with `#` comments in the header and a maxval of
//! at most 255. Samples land in a validated
//! [`Grid`](kukaku_pipeline::Grid) row-major, exactly as stored in the
//! file.

use kukaku_pipeline::Grid;

use crate::LoadError;

/// Byte cursor over a PGM file with header tokenization.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Skip whitespace and `#` comments (which run to end of line).
    fn skip_separators(&mut self) {
        while let Some(&byte) = self.bytes.get(self.pos) {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else if byte == b'#' {
                while let Some(&b) = self.bytes.get(self.pos) {
                    self.pos += 1;
                    if b == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Next whitespace-delimited header token.
    fn token(&mut self) -> Result<&'a [u8], LoadError> {
        self.skip_separators();
        let start = self.pos;
        while let Some(&byte) = self.bytes.get(self.pos) {
            if byte.is_ascii_whitespace() || byte == b'#' {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(LoadError::MalformedPgm("unexpected end of input".to_owned()));
        }
        Ok(&self.bytes[start..self.pos])
    }

    /// Next token parsed as an unsigned decimal number.
    fn number(&mut self, what: &str) -> Result<u32, LoadError> {
        let token = self.token()?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| {
                LoadError::MalformedPgm(format!(
                    "expected {what}, found {:?}",
                    String::from_utf8_lossy(token),
                ))
            })
    }

    /// Remaining bytes after the current position.
    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Parse a PGM file (P2 or P5) into an intensity grid.
///
/// # Errors
///
/// Returns [`LoadError::UnsupportedMagic`] for magics other than P2/P5,
/// [`LoadError::MaxvalOutOfRange`] when maxval is 0 or exceeds 255,
/// [`LoadError::MalformedPgm`] for truncated or out-of-range sample
/// data, and [`LoadError::Grid`] when the header declares a zero-sized
/// grid.
pub fn parse(bytes: &[u8]) -> Result<Grid, LoadError> {
    let mut cursor = Cursor::new(bytes);

    let magic = cursor.token()?;
    let binary = match magic {
        b"P2" => false,
        b"P5" => true,
        other => {
            return Err(LoadError::UnsupportedMagic(
                String::from_utf8_lossy(other).into_owned(),
            ));
        }
    };

    let width = cursor.number("width")? as usize;
    let height = cursor.number("height")? as usize;
    let maxval = cursor.number("maxval")?;
    if maxval == 0 || maxval > 255 {
        return Err(LoadError::MaxvalOutOfRange(maxval));
    }

    let sample_count = width
        .checked_mul(height)
        .ok_or_else(|| LoadError::MalformedPgm("grid dimensions overflow".to_owned()))?;

    let data = if binary {
        // Exactly one whitespace byte separates the header from the
        // raster data.
        match cursor.bytes.get(cursor.pos) {
            Some(b) if b.is_ascii_whitespace() => cursor.pos += 1,
            _ => {
                return Err(LoadError::MalformedPgm(
                    "missing whitespace before binary samples".to_owned(),
                ));
            }
        }
        let raster = cursor.rest();
        if raster.len() < sample_count {
            return Err(LoadError::MalformedPgm(format!(
                "expected {sample_count} samples, found {}",
                raster.len(),
            )));
        }
        raster[..sample_count].to_vec()
    } else {
        let mut samples = Vec::with_capacity(sample_count);
        for _ in 0..sample_count {
            let value = cursor.number("sample")?;
            if value > maxval {
                return Err(LoadError::MalformedPgm(format!(
                    "sample {value} exceeds maxval {maxval}",
                )));
            }
            #[allow(clippy::cast_possible_truncation)]
            samples.push(value as u8);
        }
        samples
    };

    if binary && maxval < 255 {
        if let Some(&value) = data.iter().find(|&&v| u32::from(v) > maxval) {
            return Err(LoadError::MalformedPgm(format!(
                "sample {value} exceeds maxval {maxval}",
            )));
        }
    }

    Ok(Grid::from_raw(width, height, data)?)
}
