// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RGB to single-channel intensity.

use flatscan_core::error::Result;
use image::{GrayImage, Luma, RgbImage};
use imageproc::map::map_colors;

use crate::check::ensure_not_empty;

/// Convert to intensity with the BT.601 weights (0.299, 0.587, 0.114).
///
/// `DynamicImage::to_luma8` uses the BT.709 weights, which shift thresholds on
/// saturated inks, so the conversion is done here instead.
pub fn to_luma(image: &RgbImage) -> Result<GrayImage> {
    ensure_not_empty(image.width(), image.height(), "luma conversion")?;
    Ok(map_colors(image, |px| {
        let [r, g, b] = px.0;
        let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([y.round().clamp(0.0, 255.0) as u8])
    }))
}
