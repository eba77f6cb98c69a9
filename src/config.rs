//! # Editor Configuration
//!
//! Every field has a default, so an empty or missing file is a valid config.
//!
//! ```toml
//! [canvas]
//! max_width = 800
//! max_height = 800
//!
//! [text]
//! min_font_px = 24.0
//! min_stroke_px = 3.0
//!
//! [filter]
//! engine = "manual"
//!
//! [fonts]
//! Impact = "/usr/share/fonts/truetype/impact.ttf"
//!
//! [cache]
//! max_images = 8
//!
//! [style]
//! timeout_secs = 20
//! backend = { kind = "remote", endpoint = "http://localhost:8080/stylize" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MemeforgeError, Result};
use crate::filter::FilterEngine;
use crate::style::StyleBackend;

/// Bound the rendered canvas must fit in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 800,
        }
    }
}

/// Text sizing and hit-testing constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Smallest font size in canvas pixels.
    pub min_font_px: f32,
    /// Thinnest outline in canvas pixels.
    pub min_stroke_px: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Fraction of the mapped area width text may wrap to.
    pub wrap_ratio: f32,
    /// Smallest hit box around a template text anchor.
    pub hit_box_floor: f32,
    /// Smallest hit box around a freeform text anchor.
    pub free_hit_box_floor: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            min_font_px: 24.0,
            min_stroke_px: 3.0,
            line_height: 1.2,
            wrap_ratio: 0.9,
            hit_box_floor: 50.0,
            free_hit_box_floor: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub engine: FilterEngine,
}

/// Decoded-image cache bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Most decoded images kept in memory; least recently used go first.
    pub max_images: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_images: 16 }
    }
}

/// Style collaborator selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub backend: StyleBackend,
    pub timeout_secs: u64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            backend: StyleBackend::Local,
            timeout_secs: 30,
        }
    }
}

impl StyleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: CanvasConfig,
    pub text: TextConfig,
    pub filter: FilterConfig,
    /// Font family name to TrueType file.
    pub fonts: BTreeMap<String, PathBuf>,
    pub cache: CacheConfig,
    pub style: StyleConfig,
}

impl EditorConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EditorConfig =
            toml::from_str(content).map_err(|e| MemeforgeError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MemeforgeError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.canvas.max_width == 0 || self.canvas.max_height == 0 {
            return Err(MemeforgeError::Config("canvas bounds must be > 0".to_string()));
        }
        let positive = [
            ("text.min_font_px", self.text.min_font_px),
            ("text.line_height", self.text.line_height),
            ("text.wrap_ratio", self.text.wrap_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MemeforgeError::Config(format!("{} must be > 0, got {}", name, value)));
            }
        }
        let non_negative = [
            ("text.min_stroke_px", self.text.min_stroke_px),
            ("text.hit_box_floor", self.text.hit_box_floor),
            ("text.free_hit_box_floor", self.text.free_hit_box_floor),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MemeforgeError::Config(format!("{} must be >= 0, got {}", name, value)));
            }
        }
        if self.cache.max_images == 0 {
            return Err(MemeforgeError::Config("cache.max_images must be > 0".to_string()));
        }
        if let StyleBackend::Remote { endpoint, .. } = &self.style.backend
            && endpoint.trim().is_empty()
        {
            return Err(MemeforgeError::Config("style.backend.endpoint must be set".to_string()));
        }
        Ok(())
    }
}
