//! Flag image of the ODI focal plane with a tangent-plane WCS.
//!
//! Each cell is painted with the footprint flag of its OTA (1 for the 5x6
//! focal plane, +2 for the pODI core); known-bad cells carry the negated
//! flag and the gaps between cells are NaN.
//!
//! The canvas spans the full mosaic, `(top + 1)` rows by `(right + 1)`
//! columns, so CRPIX1 is measured from `right + 1` and differs by a few
//! pixels from older skeletons that were cropped to `top + 1` columns.

use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::fits::{build_image_hdu_f32, Card, Value};
use crate::paths::check_clobber;
use crate::wiyn::facts::broken_cells;
use crate::wiyn::layout::MosaicLayout;

/// Reference sky position (RA, Dec in degrees) used for the skeleton WCS.
pub const DEFAULT_CRVAL: (f64, f64) = (14.79625, -1.23363888889);

/// Tangent-plane projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TanWcs {
    pub crpix: (f64, f64),
    pub crval: (f64, f64),
    /// Diagonal CD matrix element in degrees per pixel.
    pub cdelt: f64,
}

impl TanWcs {
    pub fn cards(&self) -> Vec<Card> {
        vec![
            Card::new("WCSAXES", Value::Integer(2)),
            Card::new("CTYPE1", Value::String("RA---TAN".into())),
            Card::new("CTYPE2", Value::String("DEC--TAN".into())),
            Card::new("CUNIT1", Value::String("deg".into())),
            Card::new("CUNIT2", Value::String("deg".into())),
            Card::new("CRPIX1", Value::Float(self.crpix.0)),
            Card::new("CRPIX2", Value::Float(self.crpix.1)),
            Card::new("CRVAL1", Value::Float(self.crval.0)),
            Card::new("CRVAL2", Value::Float(self.crval.1)),
            Card::new("CD1_1", Value::Float(self.cdelt)),
            Card::new("CD1_2", Value::Float(0.0)),
            Card::new("CD2_1", Value::Float(0.0)),
            Card::new("CD2_2", Value::Float(self.cdelt)),
        ]
    }
}

/// Footprint flag of OTA `(ux, uy)`: 0 unused, 1 ODI, 3 ODI and pODI.
pub fn footprint_flag(ux: usize, uy: usize) -> i8 {
    let mut flag = 0;
    if (1..=5).contains(&ux) && (1..=6).contains(&uy) {
        flag += 1;
    }
    if (2..=4).contains(&ux) && (2..=4).contains(&uy) {
        flag += 2;
    }
    flag
}

/// Row-major flag image covering the whole mosaic.
#[derive(Debug, Clone)]
pub struct SkeletonMap {
    pub ncols: usize,
    pub nrows: usize,
    pub data: Vec<f32>,
    pub wcs: TanWcs,
}

impl SkeletonMap {
    /// Paint every cell of `layout` and attach a WCS centred on OTA (3, 3).
    pub fn build(layout: &MosaicLayout, crval: (f64, f64)) -> Self {
        let ((_, right), (_, top)) = layout.unit_rect(layout.nox - 1, layout.noy - 1);
        let ncols = right as usize + 1;
        let nrows = top as usize + 1;
        let mut data = vec![f32::NAN; ncols * nrows];

        for ux in 0..layout.nox {
            for uy in 0..layout.noy {
                let flag = footprint_flag(ux, uy) as f32;
                let broken = broken_cells(ux as u8, uy as u8);
                for cx in 0..layout.ncx {
                    for cy in 0..layout.ncy {
                        // defect tables count cell rows from the top
                        let key = (cx as u8, (layout.ncy - 1 - cy) as u8);
                        let value = if flag != 0.0 && broken.contains(&key) {
                            -flag
                        } else {
                            flag
                        };
                        let ((left, right), (bottom, top)) = layout.cell_rect(ux, uy, cx, cy);
                        for row in bottom as usize..(top as usize).min(nrows) {
                            let start = row * ncols;
                            data[start + left as usize..start + (right as usize).min(ncols)]
                                .fill(value);
                        }
                    }
                }
            }
        }

        let (ccol, crow) =
            layout.global_xy(3, 3, layout.unit_width / 2.0, layout.unit_height / 2.0);
        let wcs = TanWcs {
            crpix: (ncols as f64 - ccol, crow),
            crval,
            cdelt: layout.pixel_scale / 3600.0,
        };

        SkeletonMap {
            ncols,
            nrows,
            data,
            wcs,
        }
    }

    /// Flag at pixel `(col, row)`, or `None` outside the image.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.ncols || row >= self.nrows {
            return None;
        }
        Some(self.data[row * self.ncols + col])
    }

    /// Serialize as a single primary HDU.
    pub fn to_fits_bytes(&self) -> Vec<u8> {
        build_image_hdu_f32(self.ncols, self.nrows, &self.data, &self.wcs.cards())
    }

    /// Write the FITS image to `path`; refuses to replace an existing file
    /// unless `clobber` is set.
    pub fn write(&self, path: &Path, clobber: bool) -> Result<PathBuf> {
        check_clobber(path, clobber)?;
        std::fs::write(path, self.to_fits_bytes())?;
        info!("+> {}", path.display());
        Ok(path.to_path_buf())
    }

    #[cfg(feature = "array")]
    /// The flag image as an `(nrows, ncols)` array.
    pub fn to_array(&self) -> ndarray::Array2<f32> {
        ndarray::Array2::from_shape_fn((self.nrows, self.ncols), |(row, col)| {
            self.data[row * self.ncols + col]
        })
    }
}
