//! Text content model: the user's text bound to template areas, plus
//! freeform text placed anywhere on the canvas.
//!
//! Area text is keyed by [`AreaId`] rather than by position, so an item
//! always follows the slot it was written for.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{AreaId, Template};
use crate::error::{MemeforgeError, Result};
use crate::shader::Color;

/// Horizontal alignment of a text block relative to its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

fn default_font_family() -> String {
    "Impact".to_string()
}

fn default_font_size() -> f32 {
    40.0
}

fn default_fill() -> Color {
    Color::WHITE
}

fn default_stroke() -> Color {
    Color::BLACK
}

fn default_stroke_width() -> f32 {
    2.0
}

/// Visual style of one text item.
///
/// `font_size` and `stroke_width` are in template units and get scaled with
/// the canvas. `offset_x`/`offset_y` are drag deltas in canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_fill")]
    pub color: Color,
    #[serde(default = "default_stroke")]
    pub stroke_color: Color,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            color: default_fill(),
            stroke_color: default_stroke(),
            stroke_width: default_stroke_width(),
            align: Align::Center,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl TextStyle {
    /// Style used for freeform text added to a collage.
    pub fn caption() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 24.0,
            ..Default::default()
        }
    }
}

/// User text bound to one template area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: TextStyle,
}

impl TextItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    /// Whether this item produces any visible glyphs.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Freeform text at an absolute canvas position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeText {
    pub id: Uuid,
    pub text: String,
    pub style: TextStyle,
    pub x: f32,
    pub y: f32,
}

/// Reference to one text item: bound to an area, or freeform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TextTarget {
    Area(AreaId),
    Free(Uuid),
}

impl std::fmt::Display for TextTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextTarget::Area(id) => write!(f, "area {}", id),
            TextTarget::Free(id) => write!(f, "free text {}", id),
        }
    }
}

/// All text of one editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    areas: BTreeMap<AreaId, TextItem>,
    #[serde(default)]
    free: Vec<FreeText>,
}

impl TextContent {
    /// Empty content (freeform editors).
    pub fn new() -> Self {
        Self::default()
    }

    /// One item per area, pre-filled with each area's default text.
    pub fn for_template(template: &Template) -> Self {
        let areas = template
            .text_areas
            .iter()
            .map(|area| (area.id.clone(), TextItem::new(area.default_text.clone())))
            .collect();
        Self {
            areas,
            free: Vec::new(),
        }
    }

    pub fn item(&self, id: &AreaId) -> Option<&TextItem> {
        self.areas.get(id)
    }

    pub fn item_mut(&mut self, id: &AreaId) -> Option<&mut TextItem> {
        self.areas.get_mut(id)
    }

    /// Replace the text of a bound area.
    pub fn set_text(&mut self, id: &AreaId, text: impl Into<String>) -> Result<()> {
        let item = self.bound_item(id)?;
        item.text = text.into();
        Ok(())
    }

    /// Replace the style of a bound area.
    pub fn set_style(&mut self, id: &AreaId, style: TextStyle) -> Result<()> {
        let item = self.bound_item(id)?;
        item.style = style;
        Ok(())
    }

    fn bound_item(&mut self, id: &AreaId) -> Result<&mut TextItem> {
        self.areas
            .get_mut(id)
            .ok_or_else(|| MemeforgeError::Template(format!("no text area '{}' is bound", id)))
    }

    pub fn areas(&self) -> impl Iterator<Item = (&AreaId, &TextItem)> {
        self.areas.iter()
    }

    /// Add freeform text; returns its id.
    pub fn add_free(&mut self, text: impl Into<String>, x: f32, y: f32, style: TextStyle) -> Uuid {
        let id = Uuid::new_v4();
        self.free.push(FreeText {
            id,
            text: text.into(),
            style,
            x,
            y,
        });
        id
    }

    /// Remove freeform text. Returns false if the id is unknown.
    pub fn remove_free(&mut self, id: Uuid) -> bool {
        let before = self.free.len();
        self.free.retain(|t| t.id != id);
        self.free.len() != before
    }

    pub fn free(&self) -> &[FreeText] {
        &self.free
    }

    pub fn free_mut(&mut self, id: Uuid) -> Option<&mut FreeText> {
        self.free.iter_mut().find(|t| t.id == id)
    }

    /// Style of any text item.
    pub fn style_mut(&mut self, target: &TextTarget) -> Option<&mut TextStyle> {
        match target {
            TextTarget::Area(id) => self.areas.get_mut(id).map(|item| &mut item.style),
            TextTarget::Free(id) => self.free_mut(*id).map(|t| &mut t.style),
        }
    }
}
