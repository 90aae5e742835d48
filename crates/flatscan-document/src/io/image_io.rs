// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image I/O — decode photos into RGB buffers for the pipeline and encode the
// cleaned result as PNG, JPEG, BMP or TIFF.

use std::io::Cursor;
use std::path::Path;

use flatscan_core::error::{FlatscanError, Result};
use flatscan_core::types::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use tracing::{debug, info, instrument, warn};

use crate::check::ensure_not_empty;

/// Loads pages for cleaning and writes cleaned pages back out.
///
/// Decoding always yields an 8-bit RGB buffer: alpha is dropped and grayscale
/// sources are expanded to three equal channels.
///
/// ```ignore
/// let io = ImageIo::new(90);
/// let page = ImageIo::open("receipt.jpg")?;
/// io.save(&clean, "receipt_clean.png", None)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ImageIo {
    /// JPEG encoder quality (1-100).
    jpeg_quality: u8,
}

impl Default for ImageIo {
    fn default() -> Self {
        Self::new(95)
    }
}

impl ImageIo {
    pub fn new(jpeg_quality: u8) -> Self {
        let clamped = jpeg_quality.clamp(1, 100);
        if clamped != jpeg_quality {
            warn!(requested = jpeg_quality, used = clamped, "JPEG quality out of range");
        }
        Self {
            jpeg_quality: clamped,
        }
    }

    // -- Decoding -------------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<RgbImage> {
        let img = image::open(path.as_ref()).map_err(|err| {
            FlatscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        into_rgb(img)
    }

    /// Decode raw encoded bytes (JPEG, PNG, BMP, TIFF).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<RgbImage> {
        let img = image::load_from_memory(data).map_err(|err| {
            FlatscanError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        into_rgb(img)
    }

    /// Wrap an already-decoded pixel buffer.
    ///
    /// `channels` must be 3 (interleaved RGB) or 1 (intensity, expanded to
    /// gray RGB); the buffer length must be `width * height * channels`.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<RgbImage> {
        ensure_not_empty(width, height, "raw image")?;
        let len = data.len();
        let mismatch = || {
            FlatscanError::InvalidImage(format!(
                "{width}x{height}x{channels} image needs {} bytes, got {len}",
                width as usize * height as usize * channels as usize
            ))
        };
        match channels {
            3 => RgbImage::from_raw(width, height, data).ok_or_else(mismatch),
            1 => GrayImage::from_raw(width, height, data)
                .map(|gray| DynamicImage::ImageLuma8(gray).to_rgb8())
                .ok_or_else(mismatch),
            other => Err(FlatscanError::InvalidImage(format!(
                "expected 1 or 3 channels, got {other}"
            ))),
        }
    }

    // -- Encoding -------------------------------------------------------------

    /// Encode `image` in the given format, returning the raw bytes.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn encode(&self, image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match format {
            OutputFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
                image.write_with_encoder(encoder).map_err(|err| {
                    FlatscanError::ImageError(format!("JPEG encoding failed: {}", err))
                })?;
            }
            other => {
                image
                    .write_to(&mut Cursor::new(&mut buffer), image_format(other))
                    .map_err(|err| {
                        FlatscanError::ImageError(format!("{other} encoding failed: {}", err))
                    })?;
            }
        }
        debug!(bytes = buffer.len(), %format, "Image encoded");
        Ok(buffer)
    }

    /// Write `image` to `path`.
    ///
    /// The format is `format` if given, otherwise inferred from the file
    /// extension; a path without a recognised extension is an error.
    #[instrument(skip(self, image), fields(path = %path.as_ref().display()))]
    pub fn save(
        &self,
        image: &RgbImage,
        path: impl AsRef<Path>,
        format: Option<OutputFormat>,
    ) -> Result<OutputFormat> {
        let path = path.as_ref();
        let format = match format.or_else(|| OutputFormat::from_path(path)) {
            Some(format) => format,
            None => {
                return Err(FlatscanError::UnsupportedFormat(format!(
                    "cannot infer a format from {}",
                    path.display()
                )));
            }
        };
        let bytes = self.encode(image, format)?;
        std::fs::write(path, bytes)?;
        info!(%format, "Image saved");
        Ok(format)
    }
}

fn into_rgb(img: DynamicImage) -> Result<RgbImage> {
    ensure_not_empty(img.width(), img.height(), "decoded image")?;
    Ok(match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    })
}

fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Jpeg => ImageFormat::Jpeg,
        OutputFormat::Bmp => ImageFormat::Bmp,
        OutputFormat::Tiff => ImageFormat::Tiff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn sample() -> RgbImage {
        RgbImage::from_fn(7, 5, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 99]))
    }

    #[test]
    fn png_save_and_open_is_lossless() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.png");
        let img = sample();
        let format = ImageIo::default().save(&img, &path, None).expect("save");
        assert_eq!(format, OutputFormat::Png);
        assert_eq!(ImageIo::open(&path).expect("open"), img);
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.out");
        let format = ImageIo::default()
            .save(&sample(), &path, Some(OutputFormat::Bmp))
            .expect("save");
        assert_eq!(format, OutputFormat::Bmp);
        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(&bytes[..2], b"BM");
    }

    #[test]
    fn unknown_extension_without_format_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.xyz");
        assert!(matches!(
            ImageIo::default().save(&sample(), &path, None),
            Err(FlatscanError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn encodings_carry_their_signatures() {
        let io = ImageIo::new(80);
        let img = sample();
        let jpeg = io.encode(&img, OutputFormat::Jpeg).expect("jpeg");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let png = io.encode(&img, OutputFormat::Png).expect("png");
        assert_eq!(&png[1..4], b"PNG");
        let tiff = io.encode(&img, OutputFormat::Tiff).expect("tiff");
        assert!(&tiff[..2] == b"II" || &tiff[..2] == b"MM");
    }

    #[test]
    fn encoded_png_decodes_back() {
        let img = sample();
        let png = ImageIo::default().encode(&img, OutputFormat::Png).expect("png");
        assert_eq!(ImageIo::from_bytes(&png).expect("decode"), img);
    }

    #[test]
    fn alpha_is_dropped_on_decode() {
        let rgba = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 128]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .expect("encode");
        let rgb = ImageIo::from_bytes(&png).expect("decode");
        assert_eq!(*rgb.get_pixel(1, 1), Rgb([10, 20, 30]));
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        assert!(matches!(
            ImageIo::from_bytes(b"definitely not an image"),
            Err(FlatscanError::ImageError(_))
        ));
    }

    #[test]
    fn missing_file_is_an_image_error() {
        assert!(matches!(
            ImageIo::open("/nonexistent/flatscan/page.png"),
            Err(FlatscanError::ImageError(_))
        ));
    }

    #[test]
    fn raw_gray_is_expanded() {
        let rgb = ImageIo::from_raw(2, 1, 1, vec![7, 200]).expect("raw");
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([7, 7, 7]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([200, 200, 200]));
    }

    #[test]
    fn raw_buffer_checks() {
        assert!(matches!(
            ImageIo::from_raw(2, 2, 4, vec![0; 16]),
            Err(FlatscanError::InvalidImage(_))
        ));
        assert!(matches!(
            ImageIo::from_raw(2, 2, 3, vec![0; 11]),
            Err(FlatscanError::InvalidImage(_))
        ));
        assert!(matches!(
            ImageIo::from_raw(0, 2, 3, Vec::new()),
            Err(FlatscanError::InvalidImage(_))
        ));
    }
}
