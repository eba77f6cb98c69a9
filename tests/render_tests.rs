//! # End-to-End Render Tests
//!
//! Drive the public API the way an editor would: load a template, edit text,
//! render, drag, filter, stylize and export. Images come from data URLs so
//! no test touches the network.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use memeforge::collage::{Collage, CollageLayout};
use memeforge::filter::{FilterEngine, FilterSettings};
use memeforge::geometry::{CanvasGeometry, Rect, fit_canvas, map_area_to_canvas};
use memeforge::render::{RenderContext, RenderSettings, RenderStatus};
use memeforge::resolve::encode_png_data_url;
use memeforge::style::LocalStyleEngine;
use memeforge::template::{AreaId, SourceKind, TextArea, TextTarget};
use memeforge::text::wrap_text;
use memeforge::{DefaultImageLoader, EditingSession, EditorConfig, FontRegistry, MemeforgeError, Template};

const BASE: Rgba<u8> = Rgba([60, 90, 120, 255]);

fn data_url(w: u32, h: u32) -> String {
    encode_png_data_url(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, BASE))).unwrap()
}

fn loader() -> DefaultImageLoader {
    DefaultImageLoader::new(RenderContext::new(reqwest::Client::new()))
}

fn two_panel(w: u32, h: u32) -> Template {
    let json = serde_json::json!({
        "name": "two panel",
        "image_url": data_url(w, h),
        "text_areas": [
            {"x": 0, "y": 0, "width": w, "height": h / 4, "default_text": "TOP"},
            {"x": 0, "y": h * 3 / 4, "width": w, "height": h / 4, "default_text": "BOTTOM"}
        ]
    });
    Template::from_json(&json.to_string()).unwrap()
}

fn session(template: Template) -> EditingSession {
    EditingSession::new(Arc::new(template), &EditorConfig::default(), Arc::new(FontRegistry::new())).unwrap()
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn test_native_area_at_half_scale() {
    let geometry = fit_canvas(400, 200, 200, 200);
    assert_eq!(
        geometry,
        CanvasGeometry {
            width: 200,
            height: 100,
            scale: 0.5
        }
    );
    let area = TextArea::new(0.0, 0.0, 200.0, 100.0);
    let rect = map_area_to_canvas(Some(&area), geometry, SourceKind::Native);
    assert_eq!(rect, Rect::new(0.0, 0.0, 100.0, 50.0));
}

#[test]
fn test_wrap_fits_on_one_line() {
    let measure = |s: &str| Ok::<_, Infallible>(s.len() as f32 * 10.0);
    let lines = wrap_text("The quick brown fox", 9999.0, measure).unwrap();
    assert_eq!(lines, vec!["The quick brown fox".to_string()]);
}

#[test]
fn test_wrap_never_splits_long_word() {
    let measure = |s: &str| Ok::<_, Infallible>(s.len() as f32 * 10.0);
    let lines = wrap_text("Supercalifragilisticexpialidocious", 50.0, measure).unwrap();
    assert_eq!(lines, vec!["Supercalifragilisticexpialidocious".to_string()]);
}

#[test]
fn test_manual_brightness_exact() {
    let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 255]));
    FilterEngine::Manual
        .apply(&mut canvas, &FilterSettings::new(150.0, 100.0, 100.0), 2, 2)
        .unwrap();
    assert!(canvas.pixels().all(|p| *p == Rgba([150, 150, 150, 255])));
}

// ============================================================================
// Editing sessions
// ============================================================================

#[tokio::test]
async fn test_large_image_renders_bounded_with_text() {
    let mut s = session(two_panel(1600, 1200));
    let result = s.render(&loader()).await.unwrap();
    assert_eq!(result.status, RenderStatus::Ready);

    let geometry = result.geometry.unwrap();
    assert_eq!((geometry.width, geometry.height), (800, 600));
    assert_eq!(geometry.scale, 0.5);

    let canvas = result.canvas.as_ref().unwrap();
    assert_eq!(canvas.dimensions(), (800, 600));
    // Captions land near the top and bottom anchors, the middle stays plain
    let has_ink = |y0: u32, y1: u32| (y0..y1).any(|y| (0..800).any(|x| *canvas.get_pixel(x, y) != BASE));
    assert!(has_ink(50, 100));
    assert!(has_ink(500, 550));
    assert!(!has_ink(250, 350));
}

#[tokio::test]
async fn test_text_edit_requires_new_render_before_export() {
    let mut s = session(two_panel(400, 400));
    let loader = loader();
    s.render(&loader).await.unwrap();
    let first = s.export(ImageFormat::Png).unwrap();

    s.set_text(&AreaId::positional(0), "ONE DOES NOT SIMPLY").unwrap();
    let err = s.export(ImageFormat::Png).unwrap_err();
    assert!(matches!(err, MemeforgeError::NotReady(_)));

    s.render(&loader).await.unwrap();
    let second = s.export(ImageFormat::Png).unwrap();
    assert!(first != second);
}

#[tokio::test]
async fn test_out_of_order_passes_keep_latest() {
    let mut s = session(two_panel(400, 400));
    let loader = loader();

    let old = s.begin_render();
    s.set_text(&AreaId::positional(1), "newer").unwrap();
    let new = s.begin_render();

    let new = new.run(&loader).await;
    assert!(s.commit(new).is_ok());
    let old = old.run(&loader).await;
    assert!(matches!(s.commit(old), Err(MemeforgeError::StaleRenderDiscarded { .. })));
    assert_eq!(s.last_result().generation(), 2);
}

#[tokio::test]
async fn test_drag_then_render_moves_caption() {
    let mut s = session(two_panel(400, 400));
    let loader = loader();
    s.set_text(&AreaId::positional(1), "").unwrap();
    s.render(&loader).await.unwrap();

    // Top caption is centered on (200, 50); drag it down by 250
    assert_eq!(s.pointer_down(200.0, 50.0), Some(TextTarget::Area(AreaId::positional(0))));
    s.pointer_move(200.0, 150.0);
    s.pointer_move(200.0, 300.0);
    s.pointer_leave();

    let result = s.render(&loader).await.unwrap();
    let canvas = result.canvas.as_ref().unwrap();
    let has_ink = |y0: u32, y1: u32| (y0..y1).any(|y| (0..400).any(|x| *canvas.get_pixel(x, y) != BASE));
    assert!(!has_ink(30, 70));
    assert!(has_ink(280, 320));
}

#[tokio::test]
async fn test_filters_apply_to_base_only() {
    let mut s = session(two_panel(200, 200));
    s.set_filters(FilterSettings::new(200.0, 100.0, 100.0));
    let result = s.render(&loader()).await.unwrap();
    let canvas = result.canvas.as_ref().unwrap();
    // Untouched corner is doubled
    assert_eq!(*canvas.get_pixel(0, 100), Rgba([120, 180, 240, 255]));
    // Caption fill is drawn after filtering; the filtered base never gets this red
    assert!(canvas.pixels().any(|p| p[0] > 200));
}

#[tokio::test]
async fn test_style_snapshot_and_jpeg_export() {
    let mut s = session(two_panel(300, 300));
    let loader = loader();
    s.render(&loader).await.unwrap();
    let outcome = s
        .apply_style(&LocalStyleEngine, "noir", 1.0, Duration::from_secs(10))
        .await
        .unwrap();
    assert!(outcome.is_styled());

    let result = s.render(&loader).await.unwrap();
    assert_eq!(result.status, RenderStatus::Ready);
    let jpeg = s.export(ImageFormat::Jpeg).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_base_image_swaps_keep_cache_bounded() {
    let loader = DefaultImageLoader::new(RenderContext::new(reqwest::Client::new()).with_capacity(4));
    let mut s = session(two_panel(64, 64));
    for i in 0..12u8 {
        let image = RgbaImage::from_pixel(64, 64, Rgba([i, 40, 80, 255]));
        s.set_base_image(encode_png_data_url(&DynamicImage::ImageRgba8(image)).unwrap());
        let result = s.render(&loader).await.unwrap();
        assert_eq!(result.status, RenderStatus::Ready);
        assert!(loader.context().cached_len().await <= 4);
    }
    assert_eq!(loader.context().cached_len().await, 4);
}

#[tokio::test]
async fn test_missing_image_fails_cleanly() {
    let template = Template::with_source("gone", "/definitely/not/here.png", vec![], SourceKind::Native);
    let mut s = session(template);
    let result = s.render(&loader()).await.unwrap();
    assert_eq!(result.status, RenderStatus::Failed);
    assert!(result.canvas.is_none());
    assert!(s.export(ImageFormat::Png).is_err());
}

// ============================================================================
// Collages
// ============================================================================

#[tokio::test]
async fn test_collage_renders_loaded_and_missing_cells() {
    let mut collage = Collage::new(CollageLayout::LeftFocus);
    collage.add_image(data_url(50, 80)).unwrap();
    collage.add_image("/missing/cell.png").unwrap();

    let (canvas, errors) = collage
        .render(&loader(), &RenderSettings::default(), &FontRegistry::new())
        .await;
    assert!(errors.is_empty());
    assert_eq!(canvas.dimensions(), (800, 800));
    // Focus cell filled with the image, right cells are placeholders
    assert_eq!(*canvas.get_pixel(200, 200), BASE);
    assert_eq!(*canvas.get_pixel(700, 30), Rgba([0xe0, 0xe0, 0xe0, 255]));
    assert_eq!(*canvas.get_pixel(700, 430), Rgba([0xe0, 0xe0, 0xe0, 255]));
}
