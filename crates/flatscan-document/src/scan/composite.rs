// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour-preserving compositing — original ink where the mask says text,
// flat white everywhere else.

use flatscan_core::error::Result;
use image::{Luma, Rgb, RgbImage};
use imageproc::map::map_colors2;
use tracing::{debug, instrument};

use crate::check::{ensure_not_empty, ensure_same_dimensions};
use crate::scan::threshold::BinaryMask;

/// Background colour painted wherever the mask is 0.
pub const PAPER_WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Combine the untouched original with the binary mask.
///
/// Per channel: `text = original & mask`, `paper = white & !mask`, and the
/// output is `text + paper` with saturation. The two terms never overlap, so
/// the result is exactly the original pixel under the mask and exactly white
/// elsewhere.
#[instrument(skip_all, fields(width = original.width(), height = original.height()))]
pub fn composite(original: &RgbImage, mask: &BinaryMask) -> Result<RgbImage> {
    ensure_not_empty(original.width(), original.height(), "compositing")?;
    ensure_same_dimensions(original.dimensions(), mask.dimensions(), "compositing")?;

    let output = map_colors2(original, mask.as_gray(), |ink: Rgb<u8>, Luma([m]): Luma<u8>| {
        let text = ink.0.map(|c| c & m);
        let paper = PAPER_WHITE.0.map(|c| c & !m);
        Rgb([
            text[0].saturating_add(paper[0]),
            text[1].saturating_add(paper[1]),
            text[2].saturating_add(paper[2]),
        ])
    });

    debug!(text_pixels = mask.foreground_count(), "Composite complete");
    Ok(output)
}
