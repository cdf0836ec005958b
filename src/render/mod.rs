//! Collage rendering module
//!
//! This module contains:
//! - Pixel geometry shared between interaction previews and export
//! - The visual tree and the export exclusion predicate
//! - Rasterization using tiny-skia (for exporting to file)

pub mod geometry;
pub mod image;
pub mod scene;
