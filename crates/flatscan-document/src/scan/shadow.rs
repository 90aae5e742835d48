// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shadow removal — contrast-limited adaptive histogram equalization (CLAHE) of
// the L* channel followed by a uniform lightness boost.

use flatscan_core::config::CleanupConfig;
use flatscan_core::error::Result;
use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::color::lab::{LabImage, to_lab, to_rgb};

const BINS: usize = 256;

/// One 8-bit remapping table per tile.
type Lut = [u8; BINS];

/// Flatten uneven illumination while leaving hue and saturation untouched.
///
/// The image is converted to L*a*b*, the lightness channel is equalized with
/// [`equalize_lightness`], and the result is converted back to RGB.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn remove_shadows(image: &RgbImage, config: &CleanupConfig) -> Result<RgbImage> {
    config.validate()?;
    let lab = to_lab(image)?;
    let corrected = equalize_lightness(&lab, config);
    let output = to_rgb(&corrected)?;
    info!("Shadow removal complete");
    Ok(output)
}

/// Apply CLAHE to the lightness channel, then add `lightness_boost`.
///
/// Chrominance is copied through unchanged.
pub fn equalize_lightness(lab: &LabImage, config: &CleanupConfig) -> LabImage {
    let (width, height) = lab.dimensions();
    let grid = TileGrid::new(width, height, config.tile_grid);
    debug!(
        cols = grid.cols,
        rows = grid.rows,
        clip_limit = config.clip_limit,
        "Equalizing lightness"
    );

    let luts: Vec<Lut> = (0..grid.rows * grid.cols)
        .into_par_iter()
        .map(|index| {
            let (col, row) = (index % grid.cols, index / grid.cols);
            tile_lut(&tile_histogram(lab, &grid, col, row), config.clip_limit)
        })
        .collect();

    let boost = config.lightness_boost;
    lab.map_rows(|y, src, dst| {
        let (row_a, row_b, fy) = grid.neighbours(y, Axis::Rows);
        for (x, (out, px)) in dst.iter_mut().zip(src).enumerate() {
            let (col_a, col_b, fx) = grid.neighbours(x as u32, Axis::Cols);
            let value = px.lightness_u8() as usize;
            let sample = |col: u32, row: u32| luts[(row * grid.cols + col) as usize][value] as f32;

            let top = sample(col_a, row_a) * (1.0 - fx) + sample(col_b, row_a) * fx;
            let bottom = sample(col_a, row_b) * (1.0 - fx) + sample(col_b, row_b) * fx;
            let equalized = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;

            *out = px.with_lightness_u8(equalized.saturating_add(boost));
        }
    })
}

// -- Tile geometry ------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Axis {
    Cols,
    Rows,
}

/// Partition of the image into `cols x rows` non-empty tiles.
#[derive(Debug, Clone, Copy)]
struct TileGrid {
    width: u32,
    height: u32,
    cols: u32,
    rows: u32,
}

impl TileGrid {
    /// Never create more tiles than pixels along an axis, so every tile holds
    /// at least one pixel.
    fn new(width: u32, height: u32, (cols, rows): (u32, u32)) -> Self {
        Self {
            width,
            height,
            cols: cols.clamp(1, width),
            rows: rows.clamp(1, height),
        }
    }

    /// Half-open pixel range covered by tile `index` along `axis`.
    fn span(&self, index: u32, axis: Axis) -> (u32, u32) {
        let (extent, count) = self.extent(axis);
        let start = (index as u64 * extent as u64 / count as u64) as u32;
        let end = ((index as u64 + 1) * extent as u64 / count as u64) as u32;
        (start, end)
    }

    fn extent(&self, axis: Axis) -> (u32, u32) {
        match axis {
            Axis::Cols => (self.width, self.cols),
            Axis::Rows => (self.height, self.rows),
        }
    }

    /// The two tiles whose centres bracket pixel `pos`, and the blend weight
    /// of the second one.
    fn neighbours(&self, pos: u32, axis: Axis) -> (u32, u32, f32) {
        let (extent, count) = self.extent(axis);
        let tile_size = extent as f32 / count as f32;
        let t = (pos as f32 + 0.5) / tile_size - 0.5;
        let lower = t.floor();
        let frac = t - lower;
        let last = count as i64 - 1;
        let a = (lower as i64).clamp(0, last) as u32;
        let b = (lower as i64 + 1).clamp(0, last) as u32;
        (a, b, frac)
    }
}

// -- Histogram mapping --------------------------------------------------------

fn tile_histogram(lab: &LabImage, grid: &TileGrid, col: u32, row: u32) -> [u32; BINS] {
    let (x0, x1) = grid.span(col, Axis::Cols);
    let (y0, y1) = grid.span(row, Axis::Rows);
    let mut histogram = [0u32; BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[lab.get(x, y).lightness_u8() as usize] += 1;
        }
    }
    histogram
}

/// Build the clipped-equalization table for one tile.
///
/// Bins are clipped at `clip_limit * area / 256` and the excess is spread
/// evenly over all bins. A tile holding a single lightness value maps to the
/// identity, and so does a tile too small for the limit to reach one sample
/// per bin: equalizing a handful of pixels only posterizes them.
fn tile_lut(histogram: &[u32; BINS], clip_limit: f32) -> Lut {
    let area: u32 = histogram.iter().sum();
    let distinct = histogram.iter().filter(|&&count| count > 0).count();
    let limit = (clip_limit * area as f32 / BINS as f32) as u32;
    if distinct <= 1 || limit == 0 {
        return identity_lut();
    }

    let mut bins = *histogram;

    let mut excess = 0u32;
    for bin in bins.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let share = excess / BINS as u32;
    let residual = (excess % BINS as u32) as usize;
    for bin in bins.iter_mut() {
        *bin += share;
    }
    if residual > 0 {
        let stride = (BINS / residual).max(1);
        for bin in bins.iter_mut().step_by(stride).take(residual) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0u32;
    for (entry, &count) in lut.iter_mut().zip(bins.iter()) {
        cumulative += count;
        *entry = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

fn identity_lut() -> Lut {
    let mut lut = [0u8; BINS];
    for (value, entry) in lut.iter_mut().enumerate() {
        *entry = value as u8;
    }
    lut
}
