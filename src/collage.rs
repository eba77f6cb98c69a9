//! # Collage Composition
//!
//! Several images in a fixed cell layout on an 800×800 canvas, with
//! freeform text on top. Cells are fractions of the canvas; each image is
//! cover-fitted into its cell, clipped, and filtered on its own.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{MemeforgeError, Result};
use crate::filter::{FilterSettings, apply_filters};
use crate::geometry::{CanvasGeometry, Rect};
use crate::render::compositor::draw_scene_text;
use crate::render::{ItemError, RenderSettings, Scene};
use crate::resolve::ImageLoader;
use crate::shader::Color;
use crate::template::{Align, SourceKind, TextContent};
use crate::text::{FontRegistry, TextPaint, draw_text_block};

/// Collage canvas edge in pixels.
pub const COLLAGE_SIZE: u32 = 800;

const BACKGROUND: Color = Color::rgb(0xf0, 0xf0, 0xf0);
const PLACEHOLDER_FILL: Color = Color::rgb(0xe0, 0xe0, 0xe0);
const PLACEHOLDER_TEXT: Color = Color::rgb(0xb0, 0xb0, 0xb0);
const PLACEHOLDER_BORDER: Color = Color::rgb(0xd0, 0xd0, 0xd0);
const PLACEHOLDER_CAPTION: &str = "Add Image";
const PLACEHOLDER_PX: f32 = 20.0;
const BORDER_WIDTH: u32 = 2;

/// All available layouts, in display order.
pub const LAYOUTS: &[&str] = &["grid2x2", "grid3x3", "horizontal3", "vertical3", "left_focus", "right_focus"];

/// Cell arrangement of a collage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollageLayout {
    #[default]
    #[serde(rename = "grid2x2")]
    Grid2x2,
    #[serde(rename = "grid3x3")]
    Grid3x3,
    #[serde(rename = "horizontal3")]
    Horizontal3,
    #[serde(rename = "vertical3")]
    Vertical3,
    LeftFocus,
    RightFocus,
}

impl CollageLayout {
    /// Get a layout by name (`left_focus` and `leftFocus` both work).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['_', '-'], "").as_str() {
            "grid2x2" => Some(Self::Grid2x2),
            "grid3x3" => Some(Self::Grid3x3),
            "horizontal3" => Some(Self::Horizontal3),
            "vertical3" => Some(Self::Vertical3),
            "leftfocus" => Some(Self::LeftFocus),
            "rightfocus" => Some(Self::RightFocus),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Grid2x2 => "grid2x2",
            Self::Grid3x3 => "grid3x3",
            Self::Horizontal3 => "horizontal3",
            Self::Vertical3 => "vertical3",
            Self::LeftFocus => "left_focus",
            Self::RightFocus => "right_focus",
        }
    }

    /// Cells as fractions of the canvas, in fill order.
    pub fn cells(&self) -> Vec<Rect> {
        const THIRD: f32 = 1.0 / 3.0;
        let grid = |n: usize| -> Vec<Rect> {
            let step = 1.0 / n as f32;
            (0..n * n)
                .map(|i| Rect::new((i % n) as f32 * step, (i / n) as f32 * step, step, step))
                .collect()
        };
        match self {
            Self::Grid2x2 => grid(2),
            Self::Grid3x3 => grid(3),
            Self::Horizontal3 => (0..3).map(|i| Rect::new(i as f32 * THIRD, 0.0, THIRD, 1.0)).collect(),
            Self::Vertical3 => (0..3).map(|i| Rect::new(0.0, i as f32 * THIRD, 1.0, THIRD)).collect(),
            Self::LeftFocus => vec![
                Rect::new(0.0, 0.0, 2.0 * THIRD, 1.0),
                Rect::new(2.0 * THIRD, 0.0, THIRD, 0.5),
                Rect::new(2.0 * THIRD, 0.5, THIRD, 0.5),
            ],
            Self::RightFocus => vec![
                Rect::new(THIRD, 0.0, 2.0 * THIRD, 1.0),
                Rect::new(0.0, 0.0, THIRD, 0.5),
                Rect::new(0.0, 0.5, THIRD, 0.5),
            ],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells().len()
    }
}

/// A collage being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collage {
    pub layout: CollageLayout,
    /// Image references in cell order; extra images beyond the layout are ignored.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub filters: FilterSettings,
    /// Freeform text drawn over the cells.
    #[serde(default)]
    pub content: TextContent,
}

impl Collage {
    pub fn new(layout: CollageLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    /// Switch layout, dropping images the new layout has no cell for.
    pub fn set_layout(&mut self, layout: CollageLayout) {
        self.layout = layout;
        self.images.truncate(layout.cell_count());
    }

    /// Append an image. Fails when every cell is taken.
    pub fn add_image(&mut self, reference: impl Into<String>) -> Result<usize> {
        if self.images.len() >= self.layout.cell_count() {
            return Err(MemeforgeError::Template(format!(
                "layout {} has only {} cells",
                self.layout.name(),
                self.layout.cell_count()
            )));
        }
        self.images.push(reference.into());
        Ok(self.images.len() - 1)
    }

    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// Load every image and compose.
    ///
    /// A cell whose image fails to load is drawn as a placeholder; the error
    /// is logged and the rest of the collage still renders.
    pub async fn render(
        &self,
        loader: &dyn ImageLoader,
        settings: &RenderSettings,
        fonts: &FontRegistry,
    ) -> (RgbaImage, Vec<ItemError>) {
        let mut images = Vec::with_capacity(self.images.len());
        for reference in self.images.iter().take(self.layout.cell_count()) {
            match loader.load(reference).await {
                Ok(image) => images.push(Some(image)),
                Err(e) => {
                    tracing::warn!(error = %e, "collage image not loaded, drawing placeholder");
                    images.push(None);
                }
            }
        }
        compose_collage(self.layout, &images, &self.filters, &self.content, settings, fonts)
    }
}

/// Draw cells, borders and freeform text onto a new collage canvas.
pub fn compose_collage(
    layout: CollageLayout,
    images: &[Option<Arc<DynamicImage>>],
    filters: &FilterSettings,
    content: &TextContent,
    settings: &RenderSettings,
    fonts: &FontRegistry,
) -> (RgbaImage, Vec<ItemError>) {
    let size = COLLAGE_SIZE;
    let mut canvas = RgbaImage::from_pixel(size, size, BACKGROUND.0);

    for (index, cell) in layout.cells().iter().enumerate() {
        let x0 = (cell.x * size as f32).round() as u32;
        let y0 = (cell.y * size as f32).round() as u32;
        let x1 = ((cell.x + cell.width) * size as f32).round().min(size as f32) as u32;
        let y1 = ((cell.y + cell.height) * size as f32).round().min(size as f32) as u32;
        let (w, h) = (x1.saturating_sub(x0), y1.saturating_sub(y0));
        if w == 0 || h == 0 {
            continue;
        }

        match images.get(index).and_then(Option::as_ref) {
            Some(image) => {
                let mut tile = cover(image, w, h);
                apply_filters(&mut tile, filters, w, h, settings.filter_engine);
                imageops::replace(&mut canvas, &tile, x0 as i64, y0 as i64);
                stroke_rect(&mut canvas, (x0, y0, x1, y1), Color::WHITE);
            }
            None => {
                fill_rect(&mut canvas, (x0, y0, x1, y1), PLACEHOLDER_FILL);
                let paint = TextPaint {
                    px: PLACEHOLDER_PX,
                    stroke_px: 0.0,
                    line_height: PLACEHOLDER_PX,
                    fill: PLACEHOLDER_TEXT,
                    stroke: PLACEHOLDER_TEXT,
                    align: Align::Center,
                };
                let anchor = ((x0 + x1) as f32 / 2.0, (y0 + y1) as f32 / 2.0);
                let face = fonts.face("Arial");
                if let Err(e) = draw_text_block(&mut canvas, face.as_ref(), &[PLACEHOLDER_CAPTION.to_string()], anchor, &paint) {
                    tracing::warn!(error = %e, "placeholder caption not drawn");
                }
                stroke_rect(&mut canvas, (x0, y0, x1, y1), PLACEHOLDER_BORDER);
            }
        }
    }

    let scene = Scene {
        areas: Vec::new(),
        source: SourceKind::Native,
        content: content.clone(),
        filters: FilterSettings::default(),
    };
    let geometry = CanvasGeometry {
        width: size,
        height: size,
        scale: 1.0,
    };
    let mut item_errors = Vec::new();
    draw_scene_text(&mut canvas, &scene, settings, fonts, geometry, &mut item_errors);

    (canvas, item_errors)
}

/// Scale `image` to cover `w` × `h`, then crop the center.
fn cover(image: &DynamicImage, w: u32, h: u32) -> RgbaImage {
    let (iw, ih) = (image.width().max(1) as f32, image.height().max(1) as f32);
    let scale = (w as f32 / iw).max(h as f32 / ih);
    let dw = ((iw * scale).ceil() as u32).max(w);
    let dh = ((ih * scale).ceil() as u32).max(h);
    let resized = imageops::resize(&image.to_rgba8(), dw, dh, FilterType::Triangle);
    imageops::crop_imm(&resized, (dw - w) / 2, (dh - h) / 2, w, h).to_image()
}

fn fill_rect(canvas: &mut RgbaImage, (x0, y0, x1, y1): (u32, u32, u32, u32), color: Color) {
    for y in y0..y1.min(canvas.height()) {
        for x in x0..x1.min(canvas.width()) {
            canvas.put_pixel(x, y, color.0);
        }
    }
}

/// Outline a rectangle with a `BORDER_WIDTH` line centered on its edge.
fn stroke_rect(canvas: &mut RgbaImage, (x0, y0, x1, y1): (u32, u32, u32, u32), color: Color) {
    let half = BORDER_WIDTH / 2;
    let (cw, ch) = canvas.dimensions();
    let on_edge = |v: u32, edge: u32| v + half >= edge && v < edge + half;

    let ys = y0.saturating_sub(half)..(y1 + half).min(ch);
    for y in ys {
        let xs = x0.saturating_sub(half)..(x1 + half).min(cw);
        for x in xs {
            if on_edge(x, x0) || on_edge(x, x1) || on_edge(y, y0) || on_edge(y, y1) {
                canvas.put_pixel(x, y, color.0);
            }
        }
    }
}
