//! Resolving image resources into pixels

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbaImage;
use thiserror::Error;

use crate::domain::ResourceHandle;

/// How a resource may be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// No credentials; resources that would need them fail instead of
    /// tainting the capture
    #[default]
    Anonymous,
    Credentialed,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource '{0}' not found")]
    NotFound(String),
    #[error("resource '{0}' cannot be fetched anonymously")]
    CredentialsRequired(String),
    #[error("unsupported resource location '{0}'")]
    Unsupported(String),
    #[error("failed to fetch '{handle}': {message}")]
    Fetch { handle: String, message: String },
    #[error("failed to decode '{handle}': {source}")]
    Decode {
        handle: String,
        #[source]
        source: image::ImageError,
    },
}

/// Turns resource handles into decoded RGBA pixels
pub trait ResourceLoader: Send + Sync {
    fn load(&self, handle: &ResourceHandle, mode: FetchMode) -> Result<RgbaImage, ResourceError>;
}

/// Loads local files, given as plain paths or `file://` URLs
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    /// Base directory for relative paths
    root: Option<PathBuf>,
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, handle: &ResourceHandle) -> Result<PathBuf, ResourceError> {
        let location = handle.as_str();
        let raw = location.strip_prefix("file://").unwrap_or(location);
        if raw.contains("://") {
            return Err(ResourceError::Unsupported(location.to_string()));
        }
        let path = Path::new(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ResourceLoader for FileLoader {
    fn load(&self, handle: &ResourceHandle, _mode: FetchMode) -> Result<RgbaImage, ResourceError> {
        let path = self.resolve(handle)?;
        if !path.is_file() {
            return Err(ResourceError::NotFound(handle.as_str().to_string()));
        }
        let img = image::open(&path).map_err(|source| ResourceError::Decode {
            handle: handle.as_str().to_string(),
            source,
        })?;
        Ok(img.to_rgba8())
    }
}

/// Pre-decoded images kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    images: HashMap<ResourceHandle, RgbaImage>,
    /// Handles that only load with credentials
    private: Vec<ResourceHandle>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: impl Into<String>, image: RgbaImage) {
        self.images.insert(ResourceHandle::new(handle), image);
    }

    /// Register an image that refuses anonymous fetches
    pub fn insert_private(&mut self, handle: impl Into<String>, image: RgbaImage) {
        let handle = ResourceHandle::new(handle);
        self.private.push(handle.clone());
        self.images.insert(handle, image);
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, handle: &ResourceHandle, mode: FetchMode) -> Result<RgbaImage, ResourceError> {
        if mode == FetchMode::Anonymous && self.private.contains(handle) {
            return Err(ResourceError::CredentialsRequired(handle.as_str().to_string()));
        }
        self.images
            .get(handle)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(handle.as_str().to_string()))
    }
}

/// Load every handle, logging and skipping the ones that fail.
///
/// Stops early once `cancelled` is set.
pub fn load_all(
    loader: &dyn ResourceLoader,
    handles: &[ResourceHandle],
    mode: FetchMode,
    cancelled: &AtomicBool,
) -> HashMap<ResourceHandle, RgbaImage> {
    let mut images = HashMap::with_capacity(handles.len());
    for handle in handles {
        if cancelled.load(Ordering::Acquire) {
            log::debug!("Resource loading cancelled before '{}'", handle.as_str());
            break;
        }
        match loader.load(handle, mode) {
            Ok(image) => {
                images.insert(handle.clone(), image);
            }
            Err(err) => log::warn!("Using placeholder: {}", err),
        }
    }
    images
}
