//! Pure domain types with minimal dependencies
//!
//! This module contains core types used throughout the engine.
//! Types here should have no rendering or storage dependencies
//! to avoid circular dependencies.

pub mod breakpoint;
pub mod geometry;
pub mod handle;
pub mod item;

pub use breakpoint::*;
pub use geometry::*;
pub use handle::*;
pub use item::*;
