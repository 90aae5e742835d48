// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Load → clean → save, with command-line overrides layered on the persisted
// settings.

use std::path::{Path, PathBuf};

use flatscan_core::error::Result;
use flatscan_core::{AppConfig, OutputFormat, PipelineParams};
use flatscan_document::{DocumentCleaner, ImageIo};
use tracing::{info, instrument};

/// One cleanup request as given on the command line.
#[derive(Debug, Clone)]
pub struct CleanRequest {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub block_size: Option<u32>,
    pub c_value: Option<i32>,
    pub format: Option<OutputFormat>,
}

impl CleanRequest {
    /// Command-line values win; anything left unset comes from `config`.
    pub fn params(&self, config: &AppConfig) -> PipelineParams {
        PipelineParams::new(
            self.block_size.unwrap_or(config.params.block_size),
            self.c_value.unwrap_or(config.params.c_value),
        )
    }

    /// Where the cleaned page goes: the explicit path, or
    /// `<stem>_clean.<ext>` next to the input.
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".into());
        let ext = self.format.unwrap_or(OutputFormat::Png).extension();
        self.input.with_file_name(format!("{stem}_clean.{ext}"))
    }

    /// Explicit format, else the output extension, else the configured default.
    pub fn output_format(&self, output: &Path, config: &AppConfig) -> OutputFormat {
        self.format
            .or_else(|| OutputFormat::from_path(output))
            .unwrap_or(config.default_format)
    }
}

/// Run the whole pipeline for one file and return the path written.
#[instrument(skip(config), fields(input = %request.input.display()))]
pub fn clean_file(request: &CleanRequest, config: &AppConfig) -> Result<PathBuf> {
    let params = request.params(config);
    params.validate()?;
    let cleaner = DocumentCleaner::with_config(config.cleanup.clone())?;

    let original = ImageIo::open(&request.input)?;
    let cleaned = cleaner.process(&original, &params)?;

    let output = request.output_path();
    let format = request.output_format(&output, config);
    ImageIo::new(config.jpeg_quality).save(&cleaned, &output, Some(format))?;

    info!(output = %output.display(), %format, "Cleaned page written");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatscan_core::FlatscanError;
    use image::{Rgb, RgbImage};

    fn request(input: &str) -> CleanRequest {
        CleanRequest {
            input: PathBuf::from(input),
            output: None,
            block_size: None,
            c_value: None,
            format: None,
        }
    }

    #[test]
    fn default_output_sits_next_to_input() {
        let req = request("/scans/receipt.jpg");
        assert_eq!(req.output_path(), PathBuf::from("/scans/receipt_clean.png"));
    }

    #[test]
    fn default_output_follows_requested_format() {
        let req = CleanRequest {
            format: Some(OutputFormat::Jpeg),
            ..request("/scans/receipt.jpg")
        };
        assert_eq!(req.output_path(), PathBuf::from("/scans/receipt_clean.jpg"));
    }

    #[test]
    fn flags_override_config() {
        let config = AppConfig {
            params: PipelineParams::new(21, 3),
            ..AppConfig::default()
        };
        let req = CleanRequest {
            c_value: Some(12),
            ..request("a.png")
        };
        assert_eq!(req.params(&config), PipelineParams::new(21, 12));
    }

    #[test]
    fn format_falls_back_to_config_default() {
        let config = AppConfig {
            default_format: OutputFormat::Bmp,
            ..AppConfig::default()
        };
        let req = request("a.png");
        assert_eq!(req.output_format(Path::new("out.dat"), &config), OutputFormat::Bmp);
        assert_eq!(req.output_format(Path::new("out.TIF"), &config), OutputFormat::Tiff);
    }

    #[test]
    fn clean_file_writes_a_white_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("page.png");
        RgbImage::from_pixel(16, 12, Rgb([210, 205, 190]))
            .save(&input)
            .expect("write input");

        let req = CleanRequest {
            input: input.clone(),
            ..request("unused")
        };
        let written = clean_file(&req, &AppConfig::default()).expect("clean");
        assert_eq!(written, dir.path().join("page_clean.png"));

        let out = ImageIo::open(&written).expect("read output");
        assert_eq!(out.dimensions(), (16, 12));
    }

    #[test]
    fn bad_block_size_is_reported_before_reading() {
        let req = CleanRequest {
            block_size: Some(4),
            ..request("/nonexistent/page.png")
        };
        assert!(matches!(
            clean_file(&req, &AppConfig::default()),
            Err(FlatscanError::InvalidParameter(_))
        ));
    }
}
