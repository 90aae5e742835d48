// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image decoding and encoding for the cleanup pipeline.

pub mod image_io;

pub use image_io::ImageIo;
