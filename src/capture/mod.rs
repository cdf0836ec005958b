//! Capturing the visual tree
//!
//! This module consolidates:
//! - Resource loading (resource.rs)
//! - HTTP fetching and scheme routing (http.rs)
//! - Off-thread, time-bounded rasterization of a scene

pub mod http;
pub mod resource;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use image::RgbaImage;

use crate::config::ExportConfig;
use crate::export::ExportError;
use crate::render::image::{RasterOptions, rasterize};
use crate::render::scene::{ExclusionFilter, SceneNode};

pub use http::{HttpLoader, RoutingLoader};
pub use resource::{FetchMode, FileLoader, MemoryLoader, ResourceError, ResourceLoader, load_all};

/// Parameters of one capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    pub raster: RasterOptions,
    pub filter: ExclusionFilter,
    pub fetch_mode: FetchMode,
    /// Upper bound for loading and rasterizing together
    pub timeout: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for CaptureOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            raster: RasterOptions {
                supersample: config.supersample,
                background: config.background.to_rgba_u8(),
            },
            filter: ExclusionFilter::default(),
            fetch_mode: FetchMode::Anonymous,
            timeout: Duration::from_millis(config.capture_timeout_ms),
        }
    }
}

/// Load the resources of `container` and flatten it into one image.
///
/// Runs on the blocking pool so callers on the async runtime stay
/// responsive. Nothing is left behind if the timeout fires.
pub async fn capture(
    container: SceneNode,
    options: CaptureOptions,
    loader: Arc<dyn ResourceLoader>,
) -> Result<RgbaImage, ExportError> {
    capture_holding(container, options, loader, ()).await
}

/// Same as [`capture`], but `hold` is dropped only once the worker has
/// returned, even when the caller already gave up on it.
pub(crate) async fn capture_holding<H: Send + 'static>(
    container: SceneNode,
    options: CaptureOptions,
    loader: Arc<dyn ResourceLoader>,
    hold: H,
) -> Result<RgbaImage, ExportError> {
    let timeout = options.timeout;
    let cancelled = Arc::new(AtomicBool::new(false));
    let worker_cancelled = Arc::clone(&cancelled);
    let work = tokio::task::spawn_blocking(move || {
        let _hold = hold;
        let handles = container.resources(&options.filter);
        let images = load_all(loader.as_ref(), &handles, options.fetch_mode, &worker_cancelled);
        if worker_cancelled.load(Ordering::Acquire) {
            log::warn!(
                "Capture timed out, discarding {}/{} loaded images",
                images.len(),
                handles.len()
            );
            return Err(ExportError::Timeout(timeout));
        }
        log::debug!("Loaded {}/{} images for capture", images.len(), handles.len());
        rasterize(&container, &options.filter, &images, options.raster)
    });

    match tokio::time::timeout(timeout, work).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ExportError::Worker(join_err.to_string())),
        Err(_) => {
            cancelled.store(true, Ordering::Release);
            Err(ExportError::Timeout(timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PixelRect, Point, ResourceHandle};
    use crate::render::scene::{ImageContent, NodeContent, NodeTag};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn red_tile_with_overlay() -> SceneNode {
        let tile = PixelRect::new(0.0, 0.0, 40.0, 40.0);
        SceneNode::new(NodeTag::Container, PixelRect::new(0.0, 0.0, 80.0, 40.0))
            .with_child(
                SceneNode::new(NodeTag::Div, tile).with_child(
                    SceneNode::new(NodeTag::Img, tile).with_content(NodeContent::Image(
                        ImageContent {
                            resource: ResourceHandle::new("red"),
                            alt: String::new(),
                            scale: 1.0,
                            pan: Point::ORIGIN,
                        },
                    )),
                ),
            )
            .with_child(
                SceneNode::new(NodeTag::Div, PixelRect::new(50.0, 10.0, 20.0, 20.0))
                    .with_class("badge")
                    .with_class("export-hide")
                    .with_content(NodeContent::Fill(BLUE)),
            )
            .with_child(
                SceneNode::new(NodeTag::Button, PixelRect::new(10.0, 10.0, 10.0, 10.0))
                    .with_content(NodeContent::Fill(BLUE)),
            )
    }

    fn loader() -> Arc<dyn ResourceLoader> {
        let mut loader = MemoryLoader::new();
        loader.insert("red", RgbaImage::from_pixel(4, 4, image::Rgba(RED)));
        Arc::new(loader)
    }

    #[tokio::test]
    async fn overlays_are_excluded_from_capture() {
        let out = capture(red_tile_with_overlay(), CaptureOptions::default(), loader())
            .await
            .unwrap();
        assert_eq!(out.dimensions(), (160, 80));
        // The export-hide overlay region stays background
        assert_eq!(out.get_pixel(120, 40).0, WHITE);
        // The button over the tile is skipped, the image shows through
        let under_button = out.get_pixel(30, 30).0;
        assert!(under_button[0] >= 253 && under_button[2] <= 2);
    }

    #[tokio::test]
    async fn overlay_is_drawn_without_the_filter() {
        let options = CaptureOptions {
            filter: ExclusionFilter {
                classes: Vec::new(),
                tags: Vec::new(),
            },
            ..CaptureOptions::default()
        };
        let out = capture(red_tile_with_overlay(), options, loader()).await.unwrap();
        assert_eq!(out.get_pixel(120, 40).0, BLUE);
    }

    #[tokio::test]
    async fn unavailable_resource_degrades_to_placeholder() {
        let out = capture(
            red_tile_with_overlay(),
            CaptureOptions::default(),
            Arc::new(MemoryLoader::new()),
        )
        .await
        .unwrap();
        assert_eq!(out.get_pixel(10, 10).0, crate::render::image::PLACEHOLDER_RGBA);
    }

    #[tokio::test]
    async fn empty_container_is_an_error() {
        let empty = SceneNode::new(NodeTag::Container, PixelRect::default());
        let err = capture(empty, CaptureOptions::default(), loader()).await.unwrap_err();
        assert!(matches!(err, ExportError::EmptyContainer));
    }
}
