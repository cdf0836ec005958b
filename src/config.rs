//! Configuration persistence for collage engine settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Breakpoint;

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Width threshold and column count for one breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointConfig {
    pub breakpoint: Breakpoint,
    /// Smallest container width (logical px) at which this breakpoint applies
    pub min_width: u32,
    /// Number of grid columns
    pub cols: u32,
}

/// Pixel metrics of the grid container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridMetricsConfig {
    /// Height of one grid row in logical pixels
    pub row_height: f32,
    /// Horizontal and vertical gap between cells
    pub margin: [f32; 2],
    /// Horizontal and vertical padding inside the container
    pub container_padding: [f32; 2],
}

impl Default for GridMetricsConfig {
    fn default() -> Self {
        Self {
            row_height: 150.0,
            margin: [10.0, 10.0],
            container_padding: [10.0, 10.0],
        }
    }
}

/// Export pipeline options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Supersampling factor applied when rasterizing
    pub supersample: f32,
    /// Background fill behind the collage
    pub background: RgbColor,
    /// Upper bound on a whole capture, in milliseconds
    pub capture_timeout_ms: u64,
    /// Base file name, a date suffix is appended on export
    pub file_base_name: String,
    /// Directory exports are written to (None = Pictures folder)
    pub output_dir: Option<PathBuf>,
}

impl ExportConfig {
    /// Where exports land: `output_dir`, else the Pictures folder, else the
    /// working directory
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(|| dirs::picture_dir().or_else(|| dirs::home_dir().map(|h| h.join("Pictures"))))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            supersample: 2.0,
            background: RgbColor::WHITE,
            capture_timeout_ms: 15_000,
            file_base_name: "collage".to_string(),
            output_dir: None,
        }
    }
}

/// Engine configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Breakpoints ordered from widest to narrowest
    #[serde(default = "default_breakpoints")]
    pub breakpoints: Vec<BreakpointConfig>,
    #[serde(default)]
    pub grid: GridMetricsConfig,
    /// Time a gesture may stay outside the viewport before it is abandoned
    #[serde(default = "default_gesture_abandon_ms")]
    pub gesture_abandon_ms: u64,
    /// Scale increment used by wheel/keyboard zoom
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,
    #[serde(default)]
    pub export: ExportConfig,
    /// Directory of the durable state store (None = platform data dir)
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

fn default_breakpoints() -> Vec<BreakpointConfig> {
    vec![
        BreakpointConfig {
            breakpoint: Breakpoint::Lg,
            min_width: 1200,
            cols: 4,
        },
        BreakpointConfig {
            breakpoint: Breakpoint::Md,
            min_width: 996,
            cols: 3,
        },
        BreakpointConfig {
            breakpoint: Breakpoint::Sm,
            min_width: 768,
            cols: 2,
        },
        BreakpointConfig {
            breakpoint: Breakpoint::Xs,
            min_width: 480,
            cols: 1,
        },
        BreakpointConfig {
            breakpoint: Breakpoint::Xxs,
            min_width: 0,
            cols: 1,
        },
    ]
}

fn default_gesture_abandon_ms() -> u64 {
    5_000
}

fn default_zoom_step() -> f32 {
    0.1
}

impl EngineConfig {
    /// Application directory name under the platform config/data dirs
    pub const APP_DIR: &'static str = "collage";
    const FILE_NAME: &'static str = "config.json";

    /// Column count for a breakpoint (1 if the breakpoint is not configured)
    pub fn cols(&self, breakpoint: Breakpoint) -> u32 {
        self.breakpoints
            .iter()
            .find(|entry| entry.breakpoint == breakpoint)
            .map(|entry| entry.cols.max(1))
            .unwrap_or(1)
    }

    /// Pairs of (breakpoint, columns) in configured order
    pub fn columns(&self) -> Vec<(Breakpoint, u32)> {
        self.breakpoints
            .iter()
            .map(|entry| (entry.breakpoint, entry.cols.max(1)))
            .collect()
    }

    /// Pick the widest breakpoint whose threshold fits the container width
    pub fn breakpoint_for_width(&self, width: f32) -> Breakpoint {
        self.breakpoints
            .iter()
            .filter(|entry| entry.min_width as f32 <= width)
            .max_by_key(|entry| entry.min_width)
            .or_else(|| self.breakpoints.iter().min_by_key(|entry| entry.min_width))
            .map(|entry| entry.breakpoint)
            .unwrap_or(Breakpoint::Lg)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join(Self::FILE_NAME))
    }

    /// Default state store directory
    pub fn default_store_dir() -> Option<PathBuf> {
        dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
            .map(|dir| dir.join(Self::APP_DIR))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                log::warn!("Error reading config {:?}, using defaults: {}", path, err);
                return Self::default();
            }
        };
        match serde_json::from_slice::<Self>(&bytes) {
            Ok(config) if config.breakpoints.is_empty() => {
                log::warn!("Config {:?} has no breakpoints, using defaults", path);
                Self {
                    breakpoints: default_breakpoints(),
                    ..config
                }
            }
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config {:?}, using defaults: {}", path, err);
                Self::default()
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            breakpoints: default_breakpoints(),
            grid: GridMetricsConfig::default(),
            gesture_abandon_ms: default_gesture_abandon_ms(),
            zoom_step: default_zoom_step(),
            export: ExportConfig::default(),
            store_dir: None,
        }
    }
}
