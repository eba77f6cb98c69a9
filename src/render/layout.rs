//! Text placement math shared by the compositor and the drag controller.

use crate::config::TextConfig;
use crate::geometry::{CanvasGeometry, Rect, map_area_to_canvas};
use crate::template::{FreeText, SourceKind, TextArea, TextStyle};

/// Font size in canvas pixels: template size scaled, never below the floor.
#[inline]
pub fn font_px(style: &TextStyle, scale: f32, text: &TextConfig) -> f32 {
    (style.font_size * scale).max(text.min_font_px)
}

/// Outline width in canvas pixels, never below the floor.
#[inline]
pub fn stroke_px(style: &TextStyle, scale: f32, text: &TextConfig) -> f32 {
    (style.stroke_width * scale).max(text.min_stroke_px)
}

/// Where an area's text block is centered: mapped rect center plus drag offset.
pub fn area_anchor(rect: &Rect, style: &TextStyle) -> (f32, f32) {
    let (cx, cy) = rect.center();
    (cx + style.offset_x, cy + style.offset_y)
}

/// Mapped rect and anchor for an area, or `None` when it maps to nothing.
pub fn place_area(
    area: &TextArea,
    style: &TextStyle,
    geometry: CanvasGeometry,
    source: SourceKind,
) -> Option<(Rect, (f32, f32))> {
    let rect = map_area_to_canvas(Some(area), geometry, source);
    if rect.is_empty() {
        return None;
    }
    let anchor = area_anchor(&rect, style);
    Some((rect, anchor))
}

/// Anchor of a freeform item; its position is already in canvas pixels.
pub fn free_anchor(item: &FreeText) -> (f32, f32) {
    (item.x + item.style.offset_x, item.y + item.style.offset_y)
}
