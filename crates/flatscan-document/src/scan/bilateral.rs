// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-preserving smoothing of a grayscale image with a bilateral filter.

use flatscan_core::error::{FlatscanError, Result};
use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::check::ensure_not_empty;

/// Smooth `image` while keeping strong intensity edges.
///
/// Each output pixel is the average of the neighbours inside a circle of
/// radius `diameter / 2`, weighted by a spatial Gaussian (`sigma_space`) and by
/// a Gaussian of the intensity difference to the centre (`sigma_color`). The
/// window is truncated at the image border; no padding values are invented.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn bilateral_filter(
    image: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> Result<GrayImage> {
    let (width, height) = image.dimensions();
    ensure_not_empty(width, height, "bilateral filter")?;
    if !(sigma_color > 0.0 && sigma_space > 0.0) {
        return Err(FlatscanError::InvalidParameter(format!(
            "bilateral sigmas must be positive, got colour {sigma_color} and space {sigma_space}"
        )));
    }

    let radius = (diameter / 2).max(1) as i64;
    let offsets = spatial_offsets(radius, sigma_space);
    let color_weights = color_weights(sigma_color);
    debug!(radius, taps = offsets.len(), "Bilateral kernel prepared");

    let (w, h) = (width as i64, height as i64);
    let src = image.as_raw();
    let mut out = vec![0u8; src.len()];

    out.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for (x, dst) in row.iter_mut().enumerate() {
                let x = x as i64;
                let center = src[(y * w + x) as usize];

                let mut sum = 0.0f32;
                let mut weight_sum = 0.0f32;
                for &(dx, dy, spatial) in &offsets {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let value = src[(ny * w + nx) as usize];
                    let weight = spatial * color_weights[center.abs_diff(value) as usize];
                    sum += weight * value as f32;
                    weight_sum += weight;
                }

                // The centre tap always contributes weight 1.
                *dst = (sum / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
        });

    GrayImage::from_raw(width, height, out)
        .ok_or_else(|| FlatscanError::InvalidImage("bilateral output size mismatch".into()))
}

/// Offsets inside the circular window together with their spatial weight.
fn spatial_offsets(radius: i64, sigma_space: f32) -> Vec<(i64, i64, f32)> {
    let coeff = -0.5 / (sigma_space * sigma_space);
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = dx * dx + dy * dy;
            if dist_sq > radius * radius {
                continue;
            }
            offsets.push((dx, dy, (dist_sq as f32 * coeff).exp()));
        }
    }
    offsets
}

/// Range weight for every possible absolute intensity difference.
fn color_weights(sigma_color: f32) -> [f32; 256] {
    let coeff = -0.5 / (sigma_color * sigma_color);
    let mut table = [0.0f32; 256];
    for (diff, weight) in table.iter_mut().enumerate() {
        *weight = ((diff * diff) as f32 * coeff).exp();
    }
    table
}
