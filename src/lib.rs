//! Responsive collage layout engine
//!
//! Arranges images on a column grid that adapts to the container width,
//! lets each tile be panned and zoomed independently, persists everything
//! across restarts and flattens the result into PNG, JPEG or PDF.

pub mod capture;
pub mod config;
pub mod domain;
pub mod engine;
pub mod export;
pub mod interaction;
pub mod layout;
pub mod persistence;
pub mod render;
pub mod transform;

pub use config::EngineConfig;
pub use engine::{CollageEngine, LayoutObserver};
pub use export::{ExportError, ExportFormat, Exporter};
