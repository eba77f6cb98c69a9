//! # Templates
//!
//! A template is a base image plus its text-slot geometry. Templates are
//! registered once and never mutated; editing sessions only reference them.
//!
//! ```
//! use memeforge::template::{SourceKind, Template};
//!
//! let json = r#"{
//!     "name": "Drake",
//!     "image_url": "https://i.imgflip.com/30b1gx.jpg",
//!     "text_areas": [
//!         {"x": 600, "y": 0, "width": 600, "height": 600, "default_text": "Top"},
//!         {"x": 600, "y": 600, "width": 600, "height": 600, "default_text": "Bottom"}
//!     ]
//! }"#;
//!
//! let template = Template::from_json(json).unwrap();
//! assert_eq!(template.text_areas[1].id.as_str(), "area-1");
//! assert_eq!(template.source, SourceKind::ReferenceNormalized { reference_width: 1200.0 });
//! ```

pub mod content;

pub use content::{Align, FreeText, TextContent, TextItem, TextStyle, TextTarget};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MemeforgeError, Result};

/// Nominal width that imported templates express their coordinates against.
pub const DEFAULT_REFERENCE_WIDTH: f32 = 1200.0;

/// Host whose templates are authored in reference-normalized coordinates.
const REFERENCE_NORMALIZED_HOST: &str = "imgflip.com";

/// Stable identifier of a text area within its template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub String);

impl AreaId {
    pub fn new(id: impl Into<String>) -> Self {
        AreaId(id.into())
    }

    /// Identifier assigned to an area that was registered without one.
    pub fn positional(index: usize) -> Self {
        AreaId(format!("area-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coordinate space the template's text areas are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// Areas are in the image's own pixel space.
    Native,
    /// Areas are fractions of a fixed nominal width.
    ReferenceNormalized { reference_width: f32 },
}

impl SourceKind {
    /// Guess the coordinate space from where the image comes from.
    pub fn detect(image_url: &str) -> Self {
        if image_url.contains(REFERENCE_NORMALIZED_HOST) {
            SourceKind::ReferenceNormalized {
                reference_width: DEFAULT_REFERENCE_WIDTH,
            }
        } else {
            SourceKind::Native
        }
    }
}

/// One rectangular text slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextArea {
    /// Filled with a positional id when the source omits one.
    #[serde(default = "AreaId::unassigned")]
    pub id: AreaId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub default_text: String,
}

impl AreaId {
    fn unassigned() -> Self {
        AreaId(String::new())
    }
}

impl TextArea {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: AreaId::unassigned(),
            x,
            y,
            width,
            height,
            default_text: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = AreaId::new(id);
        self
    }

    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }
}

/// A reusable base image plus text-slot geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTemplate")]
pub struct Template {
    pub name: String,
    pub image_url: String,
    pub text_areas: Vec<TextArea>,
    pub source: SourceKind,
}

/// Wire shape of a template; `source` is optional and detected when absent.
#[derive(Deserialize)]
struct RawTemplate {
    #[serde(default)]
    name: String,
    image_url: String,
    #[serde(default)]
    text_areas: Vec<TextArea>,
    #[serde(default)]
    source: Option<SourceKind>,
}

impl From<RawTemplate> for Template {
    fn from(raw: RawTemplate) -> Self {
        let source = raw.source.unwrap_or_else(|| SourceKind::detect(&raw.image_url));
        Template::with_source(raw.name, raw.image_url, raw.text_areas, source)
    }
}

impl Template {
    /// Register a template, detecting its coordinate space from the URL.
    pub fn new(name: impl Into<String>, image_url: impl Into<String>, text_areas: Vec<TextArea>) -> Self {
        let image_url = image_url.into();
        let source = SourceKind::detect(&image_url);
        Self::with_source(name, image_url, text_areas, source)
    }

    /// Register a template with an explicit coordinate space.
    pub fn with_source(
        name: impl Into<String>,
        image_url: impl Into<String>,
        mut text_areas: Vec<TextArea>,
        source: SourceKind,
    ) -> Self {
        for (index, area) in text_areas.iter_mut().enumerate() {
            if area.id.0.is_empty() {
                area.id = AreaId::positional(index);
            }
        }
        Self {
            name: name.into(),
            image_url: image_url.into(),
            text_areas,
            source,
        }
    }

    /// Parse and validate a template from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let template: Template = serde_json::from_str(json)
            .map_err(|e| MemeforgeError::Template(format!("Invalid template JSON: {}", e)))?;
        template.validate()?;
        Ok(template)
    }

    /// Reject templates the renderer could not place text for.
    pub fn validate(&self) -> Result<()> {
        if self.image_url.trim().is_empty() {
            return Err(MemeforgeError::Template("image_url must be non-empty".to_string()));
        }
        if let SourceKind::ReferenceNormalized { reference_width } = self.source
            && !(reference_width.is_finite() && reference_width > 0.0)
        {
            return Err(MemeforgeError::Template(
                "reference_width must be finite and > 0".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for area in &self.text_areas {
            if !seen.insert(&area.id) {
                return Err(MemeforgeError::Template(format!(
                    "duplicate text area id '{}'",
                    area.id
                )));
            }
            let values = [area.x, area.y, area.width, area.height];
            if values.iter().any(|v| !v.is_finite()) || area.width < 0.0 || area.height < 0.0 {
                return Err(MemeforgeError::Template(format!(
                    "text area '{}' has invalid geometry",
                    area.id
                )));
            }
        }
        Ok(())
    }

    /// Look up an area by id.
    pub fn area(&self, id: &AreaId) -> Option<&TextArea> {
        self.text_areas.iter().find(|a| &a.id == id)
    }

    /// Look up an area by id, or by position when `key` is a bare number.
    pub fn find_area(&self, key: &str) -> Option<&TextArea> {
        let key = key.trim();
        match key.parse::<usize>() {
            Ok(index) => self.text_areas.get(index),
            Err(_) => self.area(&AreaId::new(key)),
        }
    }
}
