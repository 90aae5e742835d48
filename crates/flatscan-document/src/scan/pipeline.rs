// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cleanup pipeline — shadow removal, smoothing, adaptive binarization, and
// colour-preserving compositing, run in that order.

use flatscan_core::config::{CleanupConfig, PipelineParams};
use flatscan_core::error::Result;
use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::check::ensure_not_empty;
use crate::color::to_luma;
use crate::scan::bilateral::bilateral_filter;
use crate::scan::composite::composite;
use crate::scan::shadow::remove_shadows;
use crate::scan::threshold::adaptive_threshold;

/// Turns a photographed page into a flat, print-like rendering.
///
/// Holds only the fixed stage tunables; every call to [`DocumentCleaner::process`]
/// is independent and deterministic.
///
/// ```ignore
/// let cleaner = DocumentCleaner::new();
/// let clean = cleaner.process(&photo, &PipelineParams::new(15, 8))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentCleaner {
    config: CleanupConfig,
}

impl DocumentCleaner {
    // -- Construction ---------------------------------------------------------

    /// Create a cleaner with the default tunables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleaner with custom tunables, validating them first.
    pub fn with_config(config: CleanupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    // -- Pipeline -------------------------------------------------------------

    /// Run the full pipeline:
    ///
    /// 1. Shadow removal (CLAHE on L*, lightness boost)
    /// 2. Luma of the shadow-corrected image
    /// 3. Bilateral smoothing
    /// 4. Gaussian adaptive threshold → text mask
    /// 5. Composite the ORIGINAL image's ink onto white through the mask
    ///
    /// Parameters are checked before any pixel work; on error nothing is
    /// returned.
    #[instrument(skip(self, original), fields(width = original.width(), height = original.height()))]
    pub fn process(&self, original: &RgbImage, params: &PipelineParams) -> Result<RgbImage> {
        params.validate()?;
        ensure_not_empty(original.width(), original.height(), "cleanup pipeline")?;
        info!(
            block_size = params.block_size,
            c_value = params.c_value,
            "Running document cleanup"
        );

        // Step 1: Flatten illumination.
        let corrected = remove_shadows(original, &self.config)?;

        // Step 2: Intensity for thresholding.
        let gray = to_luma(&corrected)?;

        // Step 3: Denoise without blurring strokes.
        let smooth = bilateral_filter(
            &gray,
            self.config.bilateral_diameter,
            self.config.sigma_color,
            self.config.sigma_space,
        )?;
        debug!("Smoothing complete");

        // Step 4: Text mask.
        let mask = adaptive_threshold(&smooth, params.block_size, params.c_value)?;

        // Step 5: Original ink on white paper.
        let output = composite(original, &mask)?;

        info!(
            text_pixels = mask.foreground_count(),
            "Document cleanup complete"
        );
        Ok(output)
    }
}

/// Clean `original` with the default tunables.
pub fn process_image(original: &RgbImage, params: &PipelineParams) -> Result<RgbImage> {
    DocumentCleaner::new().process(original, params)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::composite::PAPER_WHITE;
    use flatscan_core::FlatscanError;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    /// 20x20 page whose background darkens towards the lower-left like a
    /// shadow, with a 5x5 black square of "text" at (8, 8).
    fn shadowed_page_with_square() -> RgbImage {
        let mut img = RgbImage::from_fn(20, 20, |x, y| {
            let v = (150 + x * 3).saturating_sub(y * 2) as u8;
            Rgb([v, v, v])
        });
        draw_filled_rect_mut(&mut img, Rect::at(8, 8).of_size(5, 5), Rgb([0, 0, 0]));
        img
    }

    #[test]
    fn square_is_kept_black_and_paper_turns_white() {
        let original = shadowed_page_with_square();
        let out = process_image(&original, &PipelineParams::new(15, 8)).expect("pipeline");

        for y in 0..20u32 {
            for x in 0..20u32 {
                let inside = (8..13).contains(&x) && (8..13).contains(&y);
                let near_edge = (7..14).contains(&x) && (7..14).contains(&y) && !inside
                    || inside && (x == 8 || x == 12 || y == 8 || y == 12);
                let px = *out.get_pixel(x, y);
                if near_edge {
                    assert!(
                        px == PAPER_WHITE || px == *original.get_pixel(x, y),
                        "({x},{y}) = {px:?}"
                    );
                } else if inside {
                    assert_eq!(px, Rgb([0, 0, 0]), "text pixel ({x},{y})");
                } else {
                    assert_eq!(px, PAPER_WHITE, "paper pixel ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn output_is_deterministic() {
        let original = shadowed_page_with_square();
        let params = PipelineParams::new(11, 4);
        let a = process_image(&original, &params).expect("first run");
        let b = process_image(&original, &params).expect("second run");
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn every_pixel_is_original_or_white() {
        let original = RgbImage::from_fn(24, 16, |x, y| {
            Rgb([(x * 10) as u8, 120, (y * 15) as u8])
        });
        let out = process_image(&original, &PipelineParams::default()).expect("pipeline");
        for (src, dst) in original.pixels().zip(out.pixels()) {
            assert!(dst == src || *dst == PAPER_WHITE);
        }
    }

    #[test]
    fn colored_ink_is_preserved() {
        let mut original = RgbImage::from_pixel(30, 30, Rgb([235, 230, 220]));
        draw_filled_rect_mut(&mut original, Rect::at(10, 12).of_size(10, 3), Rgb([20, 40, 180]));
        let out = process_image(&original, &PipelineParams::default()).expect("pipeline");
        assert_eq!(*out.get_pixel(15, 13), Rgb([20, 40, 180]));
        assert_eq!(*out.get_pixel(2, 2), PAPER_WHITE);
    }

    #[test]
    fn one_pixel_image_completes() {
        let original = RgbImage::from_pixel(1, 1, Rgb([30, 60, 90]));
        let out = process_image(&original, &PipelineParams::default()).expect("pipeline");
        let px = *out.get_pixel(0, 0);
        assert!(px == PAPER_WHITE || px == Rgb([30, 60, 90]));
    }

    #[test]
    fn invalid_parameters_fail_before_processing() {
        let original = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        assert!(matches!(
            process_image(&original, &PipelineParams::new(8, 2)),
            Err(FlatscanError::InvalidParameter(_))
        ));
        assert!(matches!(
            process_image(&original, &PipelineParams::new(15, -3)),
            Err(FlatscanError::InvalidParameter(_))
        ));
    }

    #[test]
    fn empty_image_is_rejected() {
        let original = RgbImage::new(0, 0);
        assert!(matches!(
            process_image(&original, &PipelineParams::default()),
            Err(FlatscanError::InvalidImage(_))
        ));
    }

    #[test]
    fn custom_config_is_validated() {
        let config = CleanupConfig {
            sigma_color: 0.0,
            ..CleanupConfig::default()
        };
        assert!(DocumentCleaner::with_config(config).is_err());
    }

    #[test]
    fn input_is_not_modified() {
        let original = shadowed_page_with_square();
        let copy = original.clone();
        let _ = process_image(&original, &PipelineParams::default()).expect("pipeline");
        assert_eq!(original, copy);
    }
}
