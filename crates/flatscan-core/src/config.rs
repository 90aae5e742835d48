// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline parameters, cleanup tunables, and persisted application settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlatscanError, Result};
use crate::types::OutputFormat;

/// Smallest neighbourhood the adaptive threshold accepts.
pub const MIN_BLOCK_SIZE: u32 = 3;
/// Largest block size offered by interactive controls.
pub const MAX_BLOCK_SIZE: u32 = 31;
/// Default adaptive-threshold block size.
pub const DEFAULT_BLOCK_SIZE: u32 = 15;
/// Largest C value offered by interactive controls.
pub const MAX_C_VALUE: i32 = 20;
/// Default adaptive-threshold bias.
pub const DEFAULT_C_VALUE: i32 = 8;

/// The two per-invocation knobs of the cleanup pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Side length of the adaptive-threshold neighbourhood. Must be odd and >= 3.
    pub block_size: u32,
    /// Bias subtracted from the local mean before thresholding. Must be >= 0.
    pub c_value: i32,
}

impl PipelineParams {
    pub fn new(block_size: u32, c_value: i32) -> Self {
        Self {
            block_size,
            c_value,
        }
    }

    /// Check the documented preconditions, returning `InvalidParameter` on violation.
    pub fn validate(&self) -> Result<()> {
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(FlatscanError::InvalidParameter(format!(
                "block size must be at least {MIN_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        if self.block_size % 2 == 0 {
            return Err(FlatscanError::InvalidParameter(format!(
                "block size must be odd, got {}",
                self.block_size
            )));
        }
        if self.c_value < 0 {
            return Err(FlatscanError::InvalidParameter(format!(
                "C value must not be negative, got {}",
                self.c_value
            )));
        }
        Ok(())
    }
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, DEFAULT_C_VALUE)
    }
}

/// Fixed tunables of the shadow-removal and smoothing stages.
///
/// The defaults reproduce the behaviour documents were tuned against; they are
/// exposed so that unusual captures (very small thumbnails, heavy noise) can be
/// handled without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Tile grid (columns, rows) for local histogram equalization.
    pub tile_grid: (u32, u32),
    /// Histogram clip limit, as a multiple of the mean bin height.
    pub clip_limit: f32,
    /// Added to every 8-bit lightness value after equalization.
    pub lightness_boost: u8,
    /// Bilateral filter window diameter in pixels.
    pub bilateral_diameter: u32,
    /// Bilateral range sigma (intensity units).
    pub sigma_color: f32,
    /// Bilateral spatial sigma (pixels).
    pub sigma_space: f32,
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<()> {
        let (cols, rows) = self.tile_grid;
        if cols == 0 || rows == 0 {
            return Err(FlatscanError::InvalidParameter(format!(
                "tile grid must be at least 1x1, got {cols}x{rows}"
            )));
        }
        if !positive(self.clip_limit) {
            return Err(FlatscanError::InvalidParameter(format!(
                "clip limit must be positive, got {}",
                self.clip_limit
            )));
        }
        if self.bilateral_diameter == 0 {
            return Err(FlatscanError::InvalidParameter(
                "bilateral diameter must be at least 1".into(),
            ));
        }
        if !positive(self.sigma_color) || !positive(self.sigma_space) {
            return Err(FlatscanError::InvalidParameter(format!(
                "bilateral sigmas must be positive, got color={} space={}",
                self.sigma_color, self.sigma_space
            )));
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            tile_grid: (8, 8),
            clip_limit: 3.0,
            lightness_boost: 10,
            bilateral_diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parameters used when none are given on the command line.
    pub params: PipelineParams,
    /// Stage tunables.
    pub cleanup: CleanupConfig,
    /// Format used when the output path has no recognised extension.
    pub default_format: OutputFormat,
    /// JPEG encoder quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            params: PipelineParams::default(),
            cleanup: CleanupConfig::default(),
            default_format: OutputFormat::Png,
            jpeg_quality: 95,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&data)?;
        config.cleanup.validate()?;
        Ok(config)
    }

    /// Write settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(PipelineParams::default().validate().is_ok());
        assert!(CleanupConfig::default().validate().is_ok());
    }

    #[test]
    fn even_block_size_is_rejected() {
        let err = PipelineParams::new(14, 8).validate().unwrap_err();
        assert!(matches!(err, FlatscanError::InvalidParameter(_)));
    }

    #[test]
    fn tiny_block_size_is_rejected() {
        for block in [0, 1, 2] {
            assert!(PipelineParams::new(block, 0).validate().is_err());
        }
    }

    #[test]
    fn negative_c_is_rejected() {
        let err = PipelineParams::new(15, -1).validate().unwrap_err();
        assert!(matches!(err, FlatscanError::InvalidParameter(_)));
    }

    #[test]
    fn zero_tile_grid_is_rejected() {
        let config = CleanupConfig {
            tile_grid: (0, 8),
            ..CleanupConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load(&dir.path().join("absent.json")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            params: PipelineParams::new(21, 4),
            jpeg_quality: 80,
            ..AppConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(AppConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "jpeg_quality": 70 }"#).expect("write");
        let config = AppConfig::load(&path).expect("load");
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.params, PipelineParams::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(
            AppConfig::load(&path),
            Err(FlatscanError::Serialization(_))
        ));
    }
}
