//! Pixel geometry of the ODI focal plane.
//!
//! The focal plane is a grid of OTAs (orthogonal transfer arrays), each of
//! which is itself a grid of readout cells separated by narrow gaps. All
//! coordinates are in binned pixels of the full-mosaic frame with the origin
//! at the lower-left corner of OTA (0, 0).

use crate::error::{Error, Result};

/// Binning used by the quick-look mosaics.
pub const DEFAULT_BINNING: f64 = 11.0;

/// Unbinned cell width in pixels.
const CELL_WIDTH: f64 = 480.0;
/// Unbinned cell height in pixels.
const CELL_HEIGHT: f64 = 494.0;
/// Unbinned gap between adjacent cells along x.
const CELL_GAP_WIDTH: f64 = 28.0;
/// Unbinned gap between adjacent cells along y.
const CELL_GAP_HEIGHT: f64 = 11.0;
/// Unbinned gap between adjacent OTAs, same on both axes.
const UNIT_GAP: f64 = 200.0;
/// Unbinned plate scale in arcsec per pixel.
const PIXEL_SCALE: f64 = 0.11;

/// A closed interval `(low, high)` along one axis.
pub type Span = (f64, f64);

/// A rectangle as `((left, right), (bottom, top))`.
pub type Rect = (Span, Span);

/// Derived dimensions of the mosaic at one binning factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicLayout {
    /// Number of OTAs along x.
    pub nox: usize,
    /// Number of OTAs along y.
    pub noy: usize,
    /// Number of cells per OTA along x.
    pub ncx: usize,
    /// Number of cells per OTA along y.
    pub ncy: usize,
    /// Cell width in binned pixels.
    pub cell_width: f64,
    /// Cell height in binned pixels.
    pub cell_height: f64,
    /// Horizontal gap between adjacent cells.
    pub cell_gap_width: f64,
    /// Vertical gap between adjacent cells.
    pub cell_gap_height: f64,
    /// OTA width including the gaps between its cells.
    pub unit_width: f64,
    /// OTA height including the gaps between its cells.
    pub unit_height: f64,
    /// Gap between adjacent OTAs.
    pub unit_gap: f64,
    /// Plate scale in arcsec per binned pixel.
    pub pixel_scale: f64,
}

impl MosaicLayout {
    /// Build the layout for `binning` (must be finite and positive).
    pub fn new(binning: f64) -> Result<Self> {
        if !binning.is_finite() || binning <= 0.0 {
            return Err(Error::InvalidBinning(binning));
        }
        Ok(Self::scaled(binning))
    }

    fn scaled(binning: f64) -> Self {
        let (nox, noy, ncx, ncy) = (8, 8, 8, 8);

        let cell_width = CELL_WIDTH / binning;
        let cell_height = CELL_HEIGHT / binning;
        let cell_gap_width = CELL_GAP_WIDTH / binning;
        let cell_gap_height = CELL_GAP_HEIGHT / binning;

        MosaicLayout {
            nox,
            noy,
            ncx,
            ncy,
            cell_width,
            cell_height,
            cell_gap_width,
            cell_gap_height,
            unit_width: cell_width * ncx as f64 + cell_gap_width * (ncx - 1) as f64,
            unit_height: cell_height * ncy as f64 + cell_gap_height * (ncy - 1) as f64,
            unit_gap: UNIT_GAP / binning,
            pixel_scale: PIXEL_SCALE * binning,
        }
    }

    /// Global coordinates of OTA-local position `(x, y)` on OTA `(ux, uy)`.
    ///
    /// Indices are not bounds-checked; OTAs outside the grid simply land
    /// further along the same stride.
    pub fn global_xy(&self, ux: usize, uy: usize, x: f64, y: f64) -> (f64, f64) {
        let gx = ux as f64 * (self.unit_width + self.unit_gap) + x;
        let gy = uy as f64 * (self.unit_height + self.unit_gap) + y;
        (gx, gy)
    }

    /// Rectangle covered by OTA `(ux, uy)`.
    pub fn unit_rect(&self, ux: usize, uy: usize) -> Rect {
        let (left, bottom) = self.global_xy(ux, uy, 0.0, 0.0);
        let (right, top) = self.global_xy(ux, uy, self.unit_width, self.unit_height);
        ((left, right), (bottom, top))
    }

    /// Rectangle covered by cell `(cx, cy)` of OTA `(ux, uy)`.
    pub fn cell_rect(&self, ux: usize, uy: usize, cx: usize, cy: usize) -> Rect {
        let (left, bottom) = self.global_xy(
            ux,
            uy,
            cx as f64 * (self.cell_width + self.cell_gap_width),
            cy as f64 * (self.cell_height + self.cell_gap_height),
        );
        let right = left + self.cell_width;
        let top = bottom + self.cell_height;
        ((left, right), (bottom, top))
    }

    /// Per-axis OTA spans, `nox` entries along x and `noy` along y.
    ///
    /// Spans are taken from the diagonal OTAs, so the x list is ordered by
    /// OTA column and the y list by OTA row.
    pub fn unit_bins(&self) -> (Vec<Span>, Vec<Span>) {
        let n = self.nox.max(self.noy);
        let (mut xs, mut ys): (Vec<Span>, Vec<Span>) =
            (0..n).map(|o| self.unit_rect(o, o)).unzip();
        xs.truncate(self.nox);
        ys.truncate(self.noy);
        (xs, ys)
    }

    /// Per-axis cell spans across the whole mosaic, `nox * ncx` entries along
    /// x and `noy * ncy` along y, ordered OTA-major.
    pub fn cell_bins(&self) -> (Vec<Span>, Vec<Span>) {
        let n_units = self.nox.max(self.noy);
        let n_cells = self.ncx.max(self.ncy);
        let mut xs = Vec::with_capacity(n_units * self.ncx);
        let mut ys = Vec::with_capacity(n_units * self.ncy);
        for o in 0..n_units {
            let (cell_xs, cell_ys): (Vec<Span>, Vec<Span>) =
                (0..n_cells).map(|c| self.cell_rect(o, o, c, c)).unzip();
            xs.extend_from_slice(&cell_xs[..self.ncx]);
            ys.extend_from_slice(&cell_ys[..self.ncy]);
        }
        xs.truncate(self.nox * self.ncx);
        ys.truncate(self.noy * self.ncy);
        (xs, ys)
    }
}

impl Default for MosaicLayout {
    fn default() -> Self {
        Self::scaled(DEFAULT_BINNING)
    }
}
