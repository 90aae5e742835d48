// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive binarization — a Gaussian-weighted local mean minus a constant is
// used as a per-pixel threshold, and pixels darker than it become foreground.

use flatscan_core::config::PipelineParams;
use flatscan_core::error::{FlatscanError, Result};
use image::{GrayImage, Luma};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::check::ensure_not_empty;

/// Mask value for text pixels.
pub const FOREGROUND: u8 = 255;
/// Mask value for background pixels.
pub const BACKGROUND: u8 = 0;

/// A single-channel image whose pixels are either [`FOREGROUND`] or [`BACKGROUND`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// Wrap a grayscale image, rejecting any value other than 0 or 255.
    pub fn from_gray(image: GrayImage) -> Result<Self> {
        ensure_not_empty(image.width(), image.height(), "binary mask")?;
        if let Some(bad) = image
            .as_raw()
            .iter()
            .find(|&&v| v != FOREGROUND && v != BACKGROUND)
        {
            return Err(FlatscanError::InvalidImage(format!(
                "binary mask may only contain 0 or 255, found {bad}"
            )));
        }
        Ok(Self(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] == FOREGROUND
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.0.as_raw().iter().filter(|&&v| v == FOREGROUND).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}

/// Classify every pixel of `image` as text or background.
///
/// The local mean is a Gaussian-weighted average over the
/// `block_size x block_size` window centred on the pixel, normalised by the
/// weights of the samples that actually lie inside the image and rounded to
/// the nearest intensity level. A pixel is foreground when its value is
/// strictly below `mean - c_value`.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn adaptive_threshold(image: &GrayImage, block_size: u32, c_value: i32) -> Result<BinaryMask> {
    PipelineParams::new(block_size, c_value).validate()?;
    let (width, height) = image.dimensions();
    ensure_not_empty(width, height, "adaptive threshold")?;

    let sigma = block_sigma(block_size);
    let kernel = gaussian_kernel(block_size, sigma);
    debug!(block_size, c_value, sigma, "Gaussian threshold kernel prepared");

    let mean = local_mean(image, &kernel);
    let bias = c_value as f32;
    let raw: Vec<u8> = image
        .as_raw()
        .par_iter()
        .zip(mean.par_iter())
        .map(|(&value, &mean)| {
            if (value as f32) < mean.round() - bias {
                FOREGROUND
            } else {
                BACKGROUND
            }
        })
        .collect();

    let mask = GrayImage::from_raw(width, height, raw).ok_or_else(|| {
        FlatscanError::InvalidImage("threshold output size mismatch".into())
    })?;
    let mask = BinaryMask(mask);
    info!(foreground = mask.foreground_count(), "Adaptive threshold complete");
    Ok(mask)
}

/// Sigma used for a Gaussian window of `block_size` samples when no explicit
/// sigma is given: `0.3 * ((block_size - 1) * 0.5 - 1) + 0.8`.
pub fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Unnormalised 1-D Gaussian of odd length `size`.
fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let radius = (size / 2) as i64;
    let coeff = -0.5 / (sigma * sigma);
    (-radius..=radius)
        .map(|i| ((i * i) as f32 * coeff).exp())
        .collect()
}

/// Separable Gaussian mean with per-pixel renormalisation at the borders.
///
/// Because the valid region of a truncated square window is itself a
/// rectangle, normalising each 1-D pass by its own valid weights is exactly
/// the 2-D mean over the valid samples.
fn local_mean(image: &GrayImage, kernel: &[f32]) -> Vec<f32> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let radius = (kernel.len() / 2) as i64;
    let src = image.as_raw();

    let mut horizontal = vec![0.0f32; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let line = &src[y * width..(y + 1) * width];
            for (x, dst) in row.iter_mut().enumerate() {
                *dst = weighted_mean(kernel, radius, x as i64, width as i64, |i| {
                    line[i] as f32
                });
            }
        });

    let mut vertical = vec![0.0f32; width * height];
    vertical
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, dst) in row.iter_mut().enumerate() {
                *dst = weighted_mean(kernel, radius, y as i64, height as i64, |i| {
                    horizontal[i * width + x]
                });
            }
        });

    vertical
}

/// Kernel-weighted mean of the samples around `center` that fall inside `0..len`.
fn weighted_mean(
    kernel: &[f32],
    radius: i64,
    center: i64,
    len: i64,
    sample: impl Fn(usize) -> f32,
) -> f32 {
    let start = (center - radius).max(0);
    let end = (center + radius).min(len - 1);
    let mut sum = 0.0f32;
    let mut weight_sum = 0.0f32;
    for pos in start..=end {
        let weight = kernel[(pos - center + radius) as usize];
        sum += weight * sample(pos as usize);
        weight_sum += weight;
    }
    sum / weight_sum
}

/// Render a mask pixel as a grayscale value, for callers building masks by hand.
pub fn mask_pixel(foreground: bool) -> Luma<u8> {
    Luma([if foreground { FOREGROUND } else { BACKGROUND }])
}
