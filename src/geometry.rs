//! # Geometry and Scale Mapping
//!
//! Converts template-space text areas into canvas pixels.
//!
//! The canvas size and the `scale` factor are always produced together by
//! [`fit_canvas`] and travel as one [`CanvasGeometry`] value, so text placement
//! can never use a scale that belongs to a different canvas size.

use serde::Serialize;

use crate::template::{SourceKind, TextArea};

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Rendered canvas size plus the image-to-canvas scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasGeometry {
    pub width: u32,
    pub height: u32,
    /// Canvas width divided by the original image width.
    pub scale: f32,
}

/// Compute the canvas size for an image, bounded by `max_width` × `max_height`.
///
/// Width is capped first, then height; aspect ratio is preserved and both
/// dimensions are rounded to whole pixels. Images inside the bound are not
/// upscaled.
pub fn fit_canvas(image_width: u32, image_height: u32, max_width: u32, max_height: u32) -> CanvasGeometry {
    if image_width == 0 || image_height == 0 {
        return CanvasGeometry {
            width: 0,
            height: 0,
            scale: 0.0,
        };
    }

    let ratio = image_width as f64 / image_height as f64;
    let mut width = image_width as f64;
    let mut height = image_height as f64;

    if width > max_width as f64 {
        width = max_width as f64;
        height = width / ratio;
    }
    if height > max_height as f64 {
        height = max_height as f64;
        width = height * ratio;
    }

    let width = (width.round() as u32).max(1);
    let height = (height.round() as u32).max(1);

    CanvasGeometry {
        width,
        height,
        scale: width as f32 / image_width as f32,
    }
}

/// Map a text area into canvas pixels.
///
/// Reference-normalized areas scale every coordinate, including `y` and
/// `height`, against the canvas *width*. Imported templates were authored
/// that way and their stored geometry depends on it.
///
/// An absent area maps to a zero rectangle; callers skip rendering it.
pub fn map_area_to_canvas(area: Option<&TextArea>, geometry: CanvasGeometry, source: SourceKind) -> Rect {
    let Some(area) = area else {
        return Rect::default();
    };

    match source {
        SourceKind::ReferenceNormalized { reference_width } => {
            let canvas_width = geometry.width as f32;
            let norm = |v: f32| canvas_width * (v / reference_width);
            Rect::new(norm(area.x), norm(area.y), norm(area.width), norm(area.height))
        }
        SourceKind::Native => {
            let s = geometry.scale;
            Rect::new(area.x * s, area.y * s, area.width * s, area.height * s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_mapping_scenario() {
        // 400x200 image shown at half size
        let geometry = CanvasGeometry {
            width: 200,
            height: 100,
            scale: 0.5,
        };
        let area = TextArea::new(0.0, 0.0, 200.0, 100.0);
        let rect = map_area_to_canvas(Some(&area), geometry, SourceKind::Native);
        assert_eq!(rect, Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_reference_normalized_uses_width_for_y() {
        let geometry = CanvasGeometry {
            width: 600,
            height: 300,
            scale: 0.5,
        };
        let area = TextArea::new(600.0, 120.0, 600.0, 240.0);
        let source = SourceKind::ReferenceNormalized {
            reference_width: 1200.0,
        };
        let rect = map_area_to_canvas(Some(&area), geometry, source);
        assert_eq!(rect, Rect::new(300.0, 60.0, 300.0, 120.0));
    }

    #[test]
    fn test_absent_area_is_zero() {
        let geometry = fit_canvas(100, 100, 800, 800);
        let rect = map_area_to_canvas(None, geometry, SourceKind::Native);
        assert!(rect.is_empty());
        assert_eq!(rect, Rect::default());
    }

    #[test]
    fn test_fit_wide_image() {
        let g = fit_canvas(1600, 900, 800, 800);
        assert_eq!(g.width, 800);
        assert_eq!(g.height, 450);
        assert_eq!(g.scale, 800.0 / 1600.0);
    }

    #[test]
    fn test_fit_rounds_height() {
        let g = fit_canvas(1000, 333, 800, 800);
        assert_eq!(g.width, 800);
        assert_eq!(g.height, (800.0f64 * 333.0 / 1000.0).round() as u32);
        assert_eq!(g.scale, 0.8);
    }

    #[test]
    fn test_fit_tall_image_caps_height() {
        let g = fit_canvas(500, 1000, 800, 800);
        assert_eq!(g.height, 800);
        assert_eq!(g.width, 400);
        assert_eq!(g.scale, 400.0 / 500.0);
    }

    #[test]
    fn test_fit_small_image_not_upscaled() {
        let g = fit_canvas(300, 200, 800, 800);
        assert_eq!((g.width, g.height), (300, 200));
        assert_eq!(g.scale, 1.0);
    }

    #[test]
    fn test_scale_consistency_property() {
        for &(w, h) in &[(801u32, 600u32), (1024, 768), (4000, 3000), (2000, 1999), (5000, 7)] {
            let g = fit_canvas(w, h, 800, 800);
            assert_eq!(g.width, 800, "{}x{}", w, h);
            assert_eq!(g.height, (800.0f64 * h as f64 / w as f64).round().max(1.0) as u32);
            assert_eq!(g.scale, g.width as f32 / w as f32);
        }
    }

    #[test]
    fn test_rect_center() {
        assert_eq!(Rect::new(10.0, 20.0, 100.0, 50.0).center(), (60.0, 45.0));
    }
}
