//! The synchronous half of a render pass: scale, draw base, filter, draw text.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use super::layout::{font_px, free_anchor, place_area, stroke_px};
use super::{ItemError, RenderSettings, RenderStatus, Scene};
use crate::error::{MemeforgeError, Result};
use crate::filter::apply_filters;
use crate::geometry::{CanvasGeometry, fit_canvas};
use crate::text::{FontRegistry, TextPaint, draw_text_block, wrap_text};
use crate::template::{TextStyle, TextTarget};

/// Output of [`compose`].
#[derive(Debug)]
pub struct Composition {
    pub canvas: RgbaImage,
    pub geometry: CanvasGeometry,
    pub item_errors: Vec<ItemError>,
}

/// Composite `base` and the scene's text onto a bounded canvas.
///
/// `logical_width` is the width text geometry refers to when `base` is not
/// the template's own image (a styled snapshot); `None` uses `base`'s width.
/// A `baked` base already carries filters and text, so only scaling runs.
pub fn compose(
    base: &DynamicImage,
    scene: &Scene,
    settings: &RenderSettings,
    fonts: &FontRegistry,
    logical_width: Option<u32>,
    baked: bool,
    generation: u64,
) -> Result<Composition> {
    let trace = |status: RenderStatus| tracing::debug!(generation, status = ?status, "render");

    trace(RenderStatus::Scaling);
    let (image_w, image_h) = (base.width(), base.height());
    let mut geometry = fit_canvas(image_w, image_h, settings.canvas.max_width, settings.canvas.max_height);
    if geometry.width == 0 || geometry.height == 0 {
        return Err(MemeforgeError::ImageLoad(format!(
            "Image has no pixels ({}x{})",
            image_w, image_h
        )));
    }
    if let Some(logical) = logical_width.filter(|w| *w > 0) {
        geometry.scale = geometry.width as f32 / logical as f32;
    }

    trace(RenderStatus::DrawingBase);
    let source = base.to_rgba8();
    let mut canvas = if source.dimensions() == (geometry.width, geometry.height) {
        source
    } else {
        imageops::resize(&source, geometry.width, geometry.height, FilterType::Triangle)
    };

    if !baked && !scene.filters.is_identity() {
        trace(RenderStatus::ApplyingFilters);
        apply_filters(
            &mut canvas,
            &scene.filters,
            geometry.width,
            geometry.height,
            settings.filter_engine,
        );
    }

    let mut item_errors = Vec::new();
    if !baked {
        trace(RenderStatus::DrawingText);
        draw_scene_text(&mut canvas, scene, settings, fonts, geometry, &mut item_errors);
    }

    Ok(Composition {
        canvas,
        geometry,
        item_errors,
    })
}

/// Draw area items in declared order, then freeform items.
///
/// A failing item is recorded and skipped; the rest still render.
pub fn draw_scene_text(
    canvas: &mut RgbaImage,
    scene: &Scene,
    settings: &RenderSettings,
    fonts: &FontRegistry,
    geometry: CanvasGeometry,
    item_errors: &mut Vec<ItemError>,
) {
    for area in &scene.areas {
        let Some(item) = scene.content.item(&area.id) else {
            continue;
        };
        if item.is_blank() {
            continue;
        }
        let Some((rect, anchor)) = place_area(area, &item.style, geometry, scene.source) else {
            continue;
        };

        let max_width = rect.width * settings.text.wrap_ratio;
        let result = draw_item(canvas, fonts, &item.text, &item.style, geometry.scale, Some(max_width), anchor, settings);
        if let Err(e) = result {
            record(item_errors, TextTarget::Area(area.id.clone()), e);
        }
    }

    for free in scene.content.free() {
        if free.text.trim().is_empty() {
            continue;
        }
        let anchor = free_anchor(free);
        let result = draw_item(canvas, fonts, &free.text, &free.style, 1.0, None, anchor, settings);
        if let Err(e) = result {
            record(item_errors, TextTarget::Free(free.id), e);
        }
    }
}

fn record(item_errors: &mut Vec<ItemError>, target: TextTarget, error: MemeforgeError) {
    tracing::warn!(item = %target, error = %error, "text item not rendered");
    item_errors.push(ItemError {
        target,
        message: error.to_string(),
    });
}

#[allow(clippy::too_many_arguments)]
fn draw_item(
    canvas: &mut RgbaImage,
    fonts: &FontRegistry,
    text: &str,
    style: &TextStyle,
    scale: f32,
    max_width: Option<f32>,
    anchor: (f32, f32),
    settings: &RenderSettings,
) -> Result<()> {
    let face = fonts.face(&style.font_family);
    let px = font_px(style, scale, &settings.text);

    let lines = match max_width {
        Some(max_width) => wrap_text(text, max_width, |s| face.measure(s, px))?,
        None => text.lines().map(str::to_string).collect(),
    };

    let paint = TextPaint {
        px,
        stroke_px: stroke_px(style, scale, &settings.text),
        line_height: px * settings.text.line_height,
        fill: style.color,
        stroke: style.stroke_color,
        align: style.align,
    };
    draw_text_block(canvas, face.as_ref(), &lines, anchor, &paint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSettings;
    use crate::template::{AreaId, SourceKind, TextArea, TextContent, Template};
    use image::Rgba;

    fn gray(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([100, 100, 100, 255])))
    }

    fn scene(areas: Vec<TextArea>) -> Scene {
        let template = Template::with_source("t", "mem.png", areas, SourceKind::Native);
        Scene {
            content: TextContent::for_template(&template),
            areas: template.text_areas,
            source: template.source,
            filters: FilterSettings::default(),
        }
    }

    /// One full-canvas area; 48 px text keeps Spleen glyph edges crisp.
    fn text_scene(text: &str) -> Scene {
        let mut s = scene(vec![TextArea::new(0.0, 0.0, 400.0, 200.0).with_default_text(text)]);
        let style = TextStyle {
            font_size: 48.0,
            ..Default::default()
        };
        s.content.set_style(&AreaId::positional(0), style).unwrap();
        s
    }

    #[test]
    fn test_canvas_is_bounded() {
        let out = compose(&gray(1600, 900), &scene(vec![]), &RenderSettings::default(), &FontRegistry::new(), None, false, 1).unwrap();
        assert_eq!(out.canvas.dimensions(), (800, 450));
        assert_eq!(out.geometry.scale, 0.5);
    }

    #[test]
    fn test_blank_and_missing_items_skipped() {
        let areas = vec![TextArea::new(0.0, 0.0, 200.0, 100.0)];
        let out = compose(&gray(200, 100), &scene(areas), &RenderSettings::default(), &FontRegistry::new(), None, false, 1).unwrap();
        assert!(out.canvas.pixels().all(|p| *p == Rgba([100, 100, 100, 255])));
        assert!(out.item_errors.is_empty());
    }

    #[test]
    fn test_text_drawn_in_area() {
        let out = compose(&gray(400, 200), &text_scene("HI"), &RenderSettings::default(), &FontRegistry::new(), None, false, 1).unwrap();
        let white = out.canvas.pixels().filter(|p| **p == Rgba([255, 255, 255, 255])).count();
        let black = out.canvas.pixels().filter(|p| **p == Rgba([0, 0, 0, 255])).count();
        assert!(white > 0 && black > 0);
        // Text is centered: the corners stay untouched
        assert_eq!(*out.canvas.get_pixel(0, 0), Rgba([100, 100, 100, 255]));
        assert_eq!(*out.canvas.get_pixel(399, 199), Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn test_skip_text_when_baked() {
        let out = compose(&gray(400, 200), &text_scene("HI"), &RenderSettings::default(), &FontRegistry::new(), None, true, 1).unwrap();
        assert!(out.canvas.pixels().all(|p| *p == Rgba([100, 100, 100, 255])));
    }

    #[test]
    fn test_logical_width_overrides_scale() {
        let out = compose(&gray(400, 200), &scene(vec![]), &RenderSettings::default(), &FontRegistry::new(), Some(800), true, 1).unwrap();
        assert_eq!(out.geometry.width, 400);
        assert_eq!(out.geometry.scale, 0.5);
    }

    #[test]
    fn test_filters_before_text() {
        let mut s = text_scene("HI");
        s.filters = FilterSettings::new(150.0, 100.0, 100.0);
        let out = compose(&gray(400, 200), &s, &RenderSettings::default(), &FontRegistry::new(), None, false, 1).unwrap();
        // Base brightened, text fill still pure white, not filtered further
        assert_eq!(*out.canvas.get_pixel(0, 0), Rgba([150, 150, 150, 255]));
        assert!(out.canvas.pixels().any(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_failing_item_does_not_block_others() {
        let mut s = scene(vec![
            TextArea::new(0.0, 0.0, 400.0, 100.0).with_default_text("HI"),
            TextArea::new(0.0, 100.0, 400.0, 100.0).with_default_text("LO"),
        ]);
        let ok = TextStyle {
            font_size: 48.0,
            ..Default::default()
        };
        let unmeasurable = TextStyle {
            font_size: f32::INFINITY,
            ..Default::default()
        };
        s.content.set_style(&AreaId::positional(0), ok).unwrap();
        s.content.set_style(&AreaId::positional(1), unmeasurable).unwrap();

        let out = compose(&gray(400, 200), &s, &RenderSettings::default(), &FontRegistry::new(), None, false, 1).unwrap();

        assert_eq!(out.item_errors.len(), 1);
        assert_eq!(out.item_errors[0].target, TextTarget::Area(AreaId::positional(1)));
        assert!(out.item_errors[0].message.starts_with("Measurement unavailable"));

        // First caption is on the canvas, the failed one left its area untouched
        let top_white = (0..100).any(|y| (0..400).any(|x| *out.canvas.get_pixel(x, y) == Rgba([255, 255, 255, 255])));
        assert!(top_white);
        let bottom_plain = (100..200).all(|y| (0..400).all(|x| *out.canvas.get_pixel(x, y) == Rgba([100, 100, 100, 255])));
        assert!(bottom_plain);
    }

    #[test]
    fn test_empty_image_fails() {
        let err = compose(&DynamicImage::new_rgba8(0, 0), &scene(vec![]), &RenderSettings::default(), &FontRegistry::new(), None, false, 1).unwrap_err();
        assert!(matches!(err, MemeforgeError::ImageLoad(_)));
    }
}
