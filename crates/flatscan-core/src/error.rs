// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flatscan.

use thiserror::Error;

/// Top-level error type for all Flatscan operations.
#[derive(Debug, Error)]
pub enum FlatscanError {
    // -- Pipeline preconditions --
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // -- Image I/O --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlatscanError>;
