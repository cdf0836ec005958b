//! Export of a captured collage to PNG, JPEG or PDF
//!
//! This module contains:
//! - Raster encoders (encode.rs) and the single-page PDF writer (pdf.rs)
//! - `Exporter`, which allows at most one capture in flight

pub mod encode;
pub mod pdf;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::{self, CaptureOptions, ResourceLoader};
use crate::render::scene::SceneNode;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the collage container is empty")]
    EmptyContainer,
    #[error("could not allocate a {width}x{height} raster")]
    RasterAllocation { width: u32, height: u32 },
    #[error("capture timed out after {0:?}")]
    Timeout(Duration),
    #[error("capture worker failed: {0}")]
    Worker(String),
    #[error("an export is already in progress")]
    Busy,
    #[error("failed to encode {format}: {message}")]
    Encode { format: ExportFormat, message: String },
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::EmptyContainer => "Unable to find the collage to export. Please try again.",
            ExportError::RasterAllocation { .. }
            | ExportError::Timeout(_)
            | ExportError::Worker(_) => {
                "Failed to generate preview. This might be due to image loading issues. Please try again."
            }
            ExportError::Busy => "An export is already in progress.",
            ExportError::Encode { .. } | ExportError::Io(_) => "Failed to export. Please try again.",
        }
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Pdf => "pdf",
        }
    }

}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Encoded export, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Encode a captured raster in `format`
pub fn to_file(raster: &RgbaImage, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
    let encode_err = |message: String| ExportError::Encode { format, message };
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            encode::write_png(&mut bytes, raster).map_err(|e| encode_err(e.to_string()))?;
        }
        ExportFormat::Jpeg => {
            let rgb = encode::flatten_rgb(raster, [255, 255, 255]);
            encode::write_jpeg(&mut bytes, &rgb).map_err(|e| encode_err(e.to_string()))?;
        }
        ExportFormat::Pdf => {
            let rgb = encode::flatten_rgb(raster, [255, 255, 255]);
            bytes = pdf::write_pdf(&rgb).map_err(|e| encode_err(e.to_string()))?;
        }
    }
    Ok(ExportArtifact { format, bytes })
}

/// `<base>-YYYY-MM-DD.<ext>`
pub fn file_name(base: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!("{}-{}.{}", base, date.format("%Y-%m-%d"), format.extension())
}

/// Today's export file name in local time
pub fn file_name_today(base: &str, format: ExportFormat) -> String {
    file_name(base, format, chrono::Local::now().date_naive())
}

/// Write `artifact` to `dir/name`, replacing any existing file atomically
pub fn save_artifact(artifact: &ExportArtifact, dir: &Path, name: &str) -> Result<PathBuf, ExportError> {
    use std::io::Write;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let mut file = tempfile::Builder::new()
        .prefix(".collage-export-")
        .suffix(&format!(".{}", artifact.format.extension()))
        .tempfile_in(dir)?;
    file.write_all(&artifact.bytes)?;
    file.persist(&path).map_err(|err| ExportError::Io(err.error))?;
    log::info!("Exported collage to {}", path.display());
    Ok(path)
}

/// Releases the busy flag when dropped
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs captures one at a time
pub struct Exporter {
    loader: Arc<dyn ResourceLoader>,
    options: CaptureOptions,
    busy: Arc<AtomicBool>,
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("options", &self.options)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl Exporter {
    pub fn new(loader: Arc<dyn ResourceLoader>, options: CaptureOptions) -> Self {
        Self {
            loader,
            options,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a capture is running; the export trigger should be disabled
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<BusyGuard, ExportError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::Busy)?;
        Ok(BusyGuard(Arc::clone(&self.busy)))
    }

    /// Capture `container` into a raster (the preview step)
    ///
    /// The exporter stays busy until the capture worker has returned, even
    /// after a timeout was reported.
    pub async fn preview(&self, container: SceneNode) -> Result<RgbaImage, ExportError> {
        let guard = self.acquire()?;
        capture::capture_holding(container, self.options.clone(), Arc::clone(&self.loader), guard)
            .await
            .inspect_err(|err| log::error!("Capture failed: {}", err))
    }

    /// Capture `container` and encode it in `format`
    pub async fn export(
        &self,
        container: SceneNode,
        format: ExportFormat,
    ) -> Result<ExportArtifact, ExportError> {
        let raster = self.preview(container).await?;
        to_file(&raster, format).inspect_err(|err| log::error!("Export failed: {}", err))
    }
}
