//! CFHT MegaCam focal-plane facts.

use crate::error::{Error, Result};
use crate::wiyn::layout::Span;

/// Chip rows.
pub const CHIP_ROWS: usize = 4;
/// Chip columns.
pub const CHIP_COLUMNS: usize = 9;
/// Number of science chips (and image extensions).
pub const CHIP_COUNT: usize = CHIP_ROWS * CHIP_COLUMNS;

/// Pixel extent of one chip, `((0, width), (0, height))`.
pub fn chip_rect() -> ((u32, u32), (u32, u32)) {
    ((0, 2112), (0, 4644))
}

/// Chip grid as `(rows, columns)`.
pub fn chip_layout() -> (usize, usize) {
    (CHIP_ROWS, CHIP_COLUMNS)
}

/// Position code `10 * column + row` (both 1-based) of extension `ext`.
///
/// Extensions run along a row first.
pub fn chip_position(ext: usize) -> Result<usize> {
    if ext == 0 || ext > CHIP_COUNT {
        return Err(Error::OutOfRange {
            index: ext,
            len: CHIP_COUNT,
        });
    }
    let (_, nx) = chip_layout();
    let y = (ext - 1) / nx + 1;
    let x = (ext - 1) % nx + 1;
    Ok(10 * x + y)
}

/// RA and Dec offsets (degrees) bounding the MegaCam field.
pub fn field_bounding_box() -> (Span, Span) {
    let w = 33.0 / 60.0;
    ((-w, w), (-w, w))
}
