// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cleanup stages — shadow removal, bilateral smoothing, adaptive threshold,
// compositing, and the pipeline that chains them.

pub mod bilateral;
pub mod composite;
pub mod pipeline;
pub mod shadow;
pub mod threshold;

pub use bilateral::bilateral_filter;
pub use composite::{PAPER_WHITE, composite};
pub use pipeline::{DocumentCleaner, process_image};
pub use shadow::{equalize_lightness, remove_shadows};
pub use threshold::{BinaryMask, adaptive_threshold};
