// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour-space conversions: sRGB <-> L*a*b*, and RGB -> luma.

pub mod lab;
pub mod luma;

pub use lab::{Lab, LabImage, to_lab, to_rgb};
pub use luma::to_luma;
