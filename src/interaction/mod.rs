//! Pointer interaction
//!
//! This module contains:
//! - The exclusive gesture token and in-flight gesture state
//! - The controller turning pointer events into previews and commits

pub mod controller;
pub mod gesture;

pub use controller::{
    GestureEnd, GestureRejected, InteractionController, ItemCapabilities, Preview,
};
pub use gesture::{ActiveGesture, GestureKind, GestureToken};
