//! Fixed facts about the ODI focal plane: which OTA sits where, which cells
//! are known to be bad, and how extensions map onto OTA positions.
//!
//! Logical positions are two-digit codes `10 * column + row`, e.g. `33` is
//! the central OTA. Serial numbers identify the physical detectors.

use crate::error::{Error, Result};
use crate::wiyn::layout::Span;

/// A cell index `(cx, cy)` within an OTA.
pub type Cell = (u8, u8);

/// Hardware generation, which determines the extension ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// ODI with the 5x6 OTA focal plane (30 OTAs).
    Full,
    /// The original pODI focal plane (9 OTAs).
    Reduced,
}

/// Logical position code to OTA serial number.
const UNIT_ID: [(u8, u32); 30] = [
    (11, 13968),
    (12, 13974),
    (13, 13923),
    (14, 13901),
    (15, 13837),
    (16, 13946),
    (21, 17189),
    (22, 17297),
    (23, 17144),
    (24, 17275),
    (25, 13880),
    (26, 13835),
    (31, 17278),
    (32, 17231),
    (33, 17121),
    (34, 17166),
    (35, 13947),
    (36, 13902),
    (41, 17234),
    (42, 17277),
    (43, 17341),
    (44, 17167),
    (45, 13879),
    (46, 13792),
    (51, 17253),
    (52, 17190),
    (53, 17187),
    (54, 17122),
    (55, 13838),
    (56, 8101),
];

// Serials 138xx/139xx are the original pODI detectors; 17xxx and 8101 were
// added for the 5x6 upgrade. Trailing comments give the current position.
const BROKEN_REGIONS: [(u32, &[Cell]); 30] = [
    (
        13838,
        &[(7, 0), (7, 1), (7, 2), (7, 3), (7, 4), (7, 5), (7, 6), (7, 7)],
    ), // 55
    (13880, &[(7, 0)]),         // 25
    (13835, &[(0, 0)]),         // 26
    (13901, &[(6, 6)]),         // 14
    (13968, &[(7, 0)]),         // 11
    (13974, &[]),               // 12
    (13879, &[]),               // 45
    (13923, &[(1, 7), (3, 1)]), // 13
    (13792, &[]),               // 46
    (13902, &[(1, 5), (7, 0)]), // 36
    (13947, &[]),               // 35
    (13946, &[(7, 0)]),         // 16
    (13837, &[(1, 3), (3, 1)]), // 15
    (
        17189,
        &[
            (4, 0),
            (0, 7),
            (1, 7),
            (2, 7),
            (3, 7),
            (4, 7),
            (5, 7),
            (6, 7),
            (7, 7),
        ],
    ), // 21
    (17187, &[(1, 1), (6, 1)]), // 53
    (
        17234,
        &[
            (0, 0),
            (0, 1),
            (1, 0),
            (1, 1),
            (6, 0),
            (0, 7),
            (1, 7),
            (2, 7),
            (3, 7),
            (4, 7),
            (5, 7),
            (6, 7),
            (7, 7),
        ],
    ), // 41
    (17253, &[(0, 7), (6, 0), (6, 1), (6, 2), (6, 3)]), // 51
    (17297, &[]),                                       // 22
    (17231, &[]),                                       // 32
    (17277, &[(0, 1), (0, 2), (1, 1)]),                 // 42
    (
        17190,
        &[
            (1, 5),
            (7, 0),
            (7, 1),
            (7, 2),
            (7, 3),
            (7, 4),
            (7, 5),
            (7, 6),
            (7, 7),
        ],
    ), // 52
    (
        17144,
        &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 6), (0, 7), (1, 7)],
    ), // 23
    (
        17121,
        &[
            (0, 0),
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (0, 5),
            (0, 6),
            (0, 7),
            (1, 7),
            (7, 3),
        ],
    ), // 33
    (17341, &[]),                       // 43
    (17278, &[(7, 6)]),                 // 31
    (17275, &[(0, 0), (0, 1), (0, 2), (1, 1)]), // 24
    (
        17166,
        &[
            (3, 0),
            (6, 0),
            (6, 1),
            (6, 2),
            (6, 3),
            (6, 4),
            (6, 5),
            (6, 6),
            (6, 7),
        ],
    ), // 34
    (17167, &[(6, 0)]),                 // 44
    (17122, &[(5, 0), (6, 0), (7, 0)]), // 54
    (
        8101,
        &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (0, 7)],
    ), // 56
];

/// Extension order of the 5x6 focal plane.
const UNIT_ORDER: [u8; 30] = [
    33, 34, 43, 44, 32, //
    23, 24, 42, 35, 53, //
    45, 54, 22, 25, 52, //
    55, 31, 13, 41, 14, //
    36, 46, 21, 12, 15, //
    51, 26, 56, 11, 16,
];

/// Extension order of the pODI focal plane.
const UNIT_ORDER_REDUCED: [u8; 9] = [
    33, 34, 44, //
    43, 42, 32, //
    22, 23, 24,
];

/// Serial number of the OTA at logical position `code`, if one is installed.
pub fn unit_id(code: u8) -> Option<u32> {
    UNIT_ID
        .iter()
        .find_map(|&(c, serial)| (c == code).then_some(serial))
}

/// Known-bad cells of the OTA with serial number `serial`.
///
/// Unknown serials have no recorded defects.
pub fn broken_regions(serial: u32) -> &'static [Cell] {
    BROKEN_REGIONS
        .iter()
        .find_map(|&(s, cells)| (s == serial).then_some(cells))
        .unwrap_or(&[])
}

/// Known-bad cells of the OTA at grid position `(ux, uy)`.
///
/// Positions with no installed OTA, or OTAs without a defect record, give
/// an empty list.
pub fn broken_cells(ux: u8, uy: u8) -> &'static [Cell] {
    let code = ux as u16 * 10 + uy as u16;
    u8::try_from(code)
        .ok()
        .and_then(unit_id)
        .map(broken_regions)
        .unwrap_or(&[])
}

/// Extension-to-position table for `generation`.
pub fn unit_order(generation: Generation) -> &'static [u8] {
    match generation {
        Generation::Full => &UNIT_ORDER,
        Generation::Reduced => &UNIT_ORDER_REDUCED,
    }
}

/// Logical position code of the OTA stored in 1-based extension `ext`.
pub fn logical_position(ext: usize, generation: Generation) -> Result<u8> {
    let table = unit_order(generation);
    ext.checked_sub(1)
        .and_then(|i| table.get(i).copied())
        .ok_or(Error::OutOfRange {
            index: ext,
            len: table.len(),
        })
}

/// Split a logical position code into `(column, row)`.
pub fn split_code(code: u8) -> (u8, u8) {
    (code / 10, code % 10)
}

/// RA and Dec offsets (degrees) bounding the ODI field around the pointing.
pub fn field_bounding_box() -> (Span, Span) {
    let e = 19.0 / 60.0;
    let w = 26.0 / 60.0;
    let n = 27.0 / 60.0;
    let s = n;
    ((-w, e), (-s, n))
}
