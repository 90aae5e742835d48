// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatscan-document — Cleanup pipeline for photographed documents.
//
// Converts a camera photo of a page into a flat, print-like image: shadows are
// evened out with CLAHE in Lab space, the result is smoothed and binarized with
// a Gaussian adaptive threshold, and the original ink colours are composited
// onto white paper. Also provides image loading and saving.

mod check;
pub mod color;
pub mod io;
pub mod scan;

// Re-export the primary entry points so callers can use `flatscan_document::DocumentCleaner` etc.
pub use crate::io::ImageIo;
pub use crate::scan::pipeline::{DocumentCleaner, process_image};
pub use crate::scan::threshold::BinaryMask;
