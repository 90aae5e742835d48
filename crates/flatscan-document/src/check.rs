// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Precondition checks shared by the pipeline stages.

use flatscan_core::error::{FlatscanError, Result};

/// Reject images with a zero dimension before a stage touches any pixel.
pub(crate) fn ensure_not_empty(width: u32, height: u32, stage: &str) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FlatscanError::InvalidImage(format!(
            "{stage} needs a non-empty image, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Reject a pair of images whose dimensions differ.
pub(crate) fn ensure_same_dimensions(
    expected: (u32, u32),
    actual: (u32, u32),
    stage: &str,
) -> Result<()> {
    if expected != actual {
        return Err(FlatscanError::InvalidImage(format!(
            "{stage} needs matching dimensions, got {}x{} and {}x{}",
            expected.0, expected.1, actual.0, actual.1
        )));
    }
    Ok(())
}
