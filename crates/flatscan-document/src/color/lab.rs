// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CIE L*a*b* transcoding for 8-bit sRGB images.
//
// Lightness and chrominance are kept as `f32` so that a round trip through
// L*a*b* only loses what the final 8-bit quantization loses.

use flatscan_core::error::Result;
use image::{Rgb, RgbImage};
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::check::ensure_not_empty;

/// D65 reference white.
const WHITE_X: f32 = 0.95047;
const WHITE_Y: f32 = 1.00000;
const WHITE_Z: f32 = 1.08883;

/// sRGB to XYZ matrix (D65).
const SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

/// XYZ to sRGB matrix (D65).
const XYZ_TO_SRGB: [[f32; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

const EPSILON: f32 = 216.0 / 24389.0;
const DELTA: f32 = 6.0 / 29.0;

/// One pixel in L*a*b*.
///
/// - `l`: 0.0 (black) to 100.0 (white)
/// - `a`: green (negative) to red (positive)
/// - `b`: blue (negative) to yellow (positive)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl Lab {
    /// Lightness quantized to the 0..=255 scale used by 8-bit histograms.
    #[inline]
    pub fn lightness_u8(&self) -> u8 {
        (self.l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8
    }

    /// Replace lightness with an 8-bit value, keeping chrominance.
    #[inline]
    pub fn with_lightness_u8(self, value: u8) -> Self {
        Self {
            l: value as f32 * 100.0 / 255.0,
            ..self
        }
    }
}

/// A lightness/chrominance decomposition of an RGB image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LabImage {
    width: u32,
    height: u32,
    pixels: Vec<Lab>,
}

impl LabImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[Lab] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Lab {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Build a new image of the same size by mapping whole rows in parallel.
    ///
    /// `f` receives the row index, the source row and the destination row.
    pub(crate) fn map_rows<F>(&self, f: F) -> LabImage
    where
        F: Fn(u32, &[Lab], &mut [Lab]) + Sync,
    {
        let width = self.width as usize;
        let mut pixels = self.pixels.clone();
        pixels
            .par_chunks_mut(width)
            .zip(self.pixels.par_chunks(width))
            .enumerate()
            .for_each(|(y, (dst, src))| f(y as u32, src, dst));
        LabImage {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Convert an 8-bit sRGB image to L*a*b*.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn to_lab(image: &RgbImage) -> Result<LabImage> {
    let (width, height) = image.dimensions();
    ensure_not_empty(width, height, "lightness/chrominance conversion")?;

    let linear = srgb_decode_table();
    let pixels = image
        .as_raw()
        .par_chunks_exact(3)
        .map(|px| rgb_to_lab(&linear, [px[0], px[1], px[2]]))
        .collect();

    debug!("Converted to L*a*b*");
    Ok(LabImage {
        width,
        height,
        pixels,
    })
}

/// Convert an L*a*b* image back to 8-bit sRGB, clipping out-of-gamut values.
#[instrument(skip_all, fields(width = lab.width, height = lab.height))]
pub fn to_rgb(lab: &LabImage) -> Result<RgbImage> {
    ensure_not_empty(lab.width, lab.height, "colour conversion")?;

    let raw: Vec<u8> = lab
        .pixels
        .par_iter()
        .flat_map_iter(|&px| lab_to_rgb(px).0)
        .collect();

    // Length is width * height * 3 by construction.
    RgbImage::from_raw(lab.width, lab.height, raw).ok_or_else(|| {
        flatscan_core::FlatscanError::InvalidImage("L*a*b* buffer size mismatch".into())
    })
}

/// Lookup table from 8-bit sRGB to linear light.
fn srgb_decode_table() -> [f32; 256] {
    let mut table = [0.0f32; 256];
    for (value, entry) in table.iter_mut().enumerate() {
        let c = value as f32 / 255.0;
        *entry = if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    table
}

fn srgb_encode(linear: f32) -> u8 {
    let c = if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

fn rgb_to_lab(linear: &[f32; 256], rgb: [u8; 3]) -> Lab {
    let r = linear[rgb[0] as usize];
    let g = linear[rgb[1] as usize];
    let b = linear[rgb[2] as usize];

    let m = &SRGB_TO_XYZ;
    let x = m[0][0] * r + m[0][1] * g + m[0][2] * b;
    let y = m[1][0] * r + m[1][1] * g + m[1][2] * b;
    let z = m[2][0] * r + m[2][1] * g + m[2][2] * b;

    let fx = lab_f(x / WHITE_X);
    let fy = lab_f(y / WHITE_Y);
    let fz = lab_f(z / WHITE_Z);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

fn lab_to_rgb(lab: Lab) -> Rgb<u8> {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = fy + lab.a / 500.0;
    let fz = fy - lab.b / 200.0;

    let x = lab_f_inv(fx) * WHITE_X;
    let y = lab_f_inv(fy) * WHITE_Y;
    let z = lab_f_inv(fz) * WHITE_Z;

    let m = &XYZ_TO_SRGB;
    let r = m[0][0] * x + m[0][1] * y + m[0][2] * z;
    let g = m[1][0] * x + m[1][1] * y + m[1][2] * z;
    let b = m[2][0] * x + m[2][1] * y + m[2][2] * z;

    Rgb([srgb_encode(r), srgb_encode(g), srgb_encode(b)])
}
