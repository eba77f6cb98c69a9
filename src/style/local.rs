//! In-process approximations of the named artistic looks.
//!
//! Each look renders at full strength; [`LocalStyleEngine`] then mixes the
//! result with the original by the requested intensity.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use rayon::prelude::*;

use super::StyleFilterEngine;
use crate::error::{MemeforgeError, Result};
use crate::shader::{
    blend_dodge, brightness, contrast, contrast_factor, hsv_to_rgb, luma, mix_pixel, posterize, rgb_to_hsv,
    to_channel,
};

/// All available looks, in display order.
pub const LOOKS: &[&str] = &[
    "vintage",
    "grayscale",
    "noir",
    "pencil_sketch",
    "pixel_art",
    "comic",
    "neon",
    "watercolor",
    "oil_painting",
    "ink",
];

/// A named look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Look {
    Vintage,
    Grayscale,
    Noir,
    PencilSketch,
    PixelArt,
    Comic,
    Neon,
    Watercolor,
    OilPainting,
    Ink,
}

impl Look {
    /// Get a look by name. Accepts `snake_case`, spaces or dashes.
    pub fn by_name(name: &str) -> Option<Look> {
        let key = name.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "vintage" | "sepia" => Some(Look::Vintage),
            "grayscale" | "greyscale" => Some(Look::Grayscale),
            "noir" => Some(Look::Noir),
            "pencil_sketch" | "sketch" => Some(Look::PencilSketch),
            "pixel_art" | "pixel" => Some(Look::PixelArt),
            "comic" => Some(Look::Comic),
            "neon" => Some(Look::Neon),
            "watercolor" => Some(Look::Watercolor),
            "oil_painting" | "oil" => Some(Look::OilPainting),
            "ink" | "ink_drawing" => Some(Look::Ink),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Look::Vintage => "vintage",
            Look::Grayscale => "grayscale",
            Look::Noir => "noir",
            Look::PencilSketch => "pencil_sketch",
            Look::PixelArt => "pixel_art",
            Look::Comic => "comic",
            Look::Neon => "neon",
            Look::Watercolor => "watercolor",
            Look::OilPainting => "oil_painting",
            Look::Ink => "ink",
        }
    }

    /// Render the look at full strength. Output has the input's dimensions.
    pub fn render(&self, src: &RgbaImage) -> RgbaImage {
        match self {
            Look::Vintage => vintage(src),
            Look::Grayscale => map_pixels(src, |r, g, b| {
                let y = luma(r, g, b);
                [y, y, y]
            }),
            Look::Noir => {
                let k = contrast_factor(0.5);
                map_pixels(src, |r, g, b| {
                    let y = contrast(luma(r, g, b), k);
                    [y, y, y]
                })
            }
            Look::PencilSketch => pencil_sketch(src),
            Look::PixelArt => pixel_art(src),
            Look::Comic => comic(src),
            Look::Neon => neon(src),
            Look::Watercolor => watercolor(src),
            Look::OilPainting => oil_painting(src),
            Look::Ink => {
                let k = contrast_factor(0.5);
                map_pixels(src, |r, g, b| {
                    let y = if contrast(luma(r, g, b), k) < 120.0 { 0.0 } else { 255.0 };
                    [y, y, y]
                })
            }
        }
    }
}

// ============================================================================
// Per-pixel helpers
// ============================================================================

/// Map every RGB triple, keeping alpha.
fn map_pixels(src: &RgbaImage, f: impl Fn(f32, f32, f32) -> [f32; 3] + Sync) -> RgbaImage {
    let mut out = src.clone();
    let buf: &mut [u8] = &mut out;
    buf.par_chunks_exact_mut(4).for_each(|px| {
        let [r, g, b] = f(px[0] as f32, px[1] as f32, px[2] as f32);
        px[0] = to_channel(r);
        px[1] = to_channel(g);
        px[2] = to_channel(b);
    });
    out
}

fn saturate_hsv(r: f32, g: f32, b: f32, factor: f32) -> [f32; 3] {
    let (h, s, v) = rgb_to_hsv(r.clamp(0.0, 255.0), g.clamp(0.0, 255.0), b.clamp(0.0, 255.0));
    let (r, g, b) = hsv_to_rgb(h, (s * factor).clamp(0.0, 1.0), v);
    [r, g, b]
}

/// Grayscale edge strength (0 = flat, 255 = strong edge) via a Laplacian.
fn edges(src: &RgbaImage) -> image::GrayImage {
    let gray = imageops::grayscale(src);
    let kernel = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];
    imageops::filter3x3(&gray, &kernel)
}

// ============================================================================
// Looks
// ============================================================================

fn vintage(src: &RgbaImage) -> RgbaImage {
    let (w, h) = src.dimensions();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let radius = (cx * cx + cy * cy).sqrt().max(1.0);

    let mut out = map_pixels(src, |r, g, b| {
        let [r, g, b] = saturate_hsv(r, g, b, 0.7);
        [
            0.393 * r + 0.769 * g + 0.189 * b,
            0.349 * r + 0.686 * g + 0.168 * b,
            0.272 * r + 0.534 * g + 0.131 * b,
        ]
    });

    // Vignette
    for (x, y, px) in out.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let d = (dx * dx + dy * dy).sqrt() / radius;
        let factor = 1.0 - d * d * 0.7;
        for c in 0..3 {
            px[c] = to_channel(brightness(px[c] as f32, factor));
        }
    }
    imageops::blur(&out, 0.5)
}

fn pencil_sketch(src: &RgbaImage) -> RgbaImage {
    let gray = imageops::grayscale(src);
    let mut inverted = gray.clone();
    imageops::invert(&mut inverted);
    let blurred = imageops::blur(&inverted, 3.0);
    let k = contrast_factor(0.3);

    let mut out = src.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let base = gray.get_pixel(x, y)[0] as f32 / 255.0;
        let blend = blurred.get_pixel(x, y)[0] as f32 / 255.0;
        let v = contrast(blend_dodge(base, blend) * 255.0, k);
        let v = to_channel(v);
        *px = Rgba([v, v, v, px[3]]);
    }
    out
}

fn pixel_art(src: &RgbaImage) -> RgbaImage {
    const PIXEL_SIZE: u32 = 12;
    let (w, h) = src.dimensions();
    let small_w = (w / PIXEL_SIZE).max(1);
    let small_h = (h / PIXEL_SIZE).max(1);
    let small = imageops::resize(src, small_w, small_h, FilterType::Nearest);
    let big = imageops::resize(&small, w, h, FilterType::Nearest);
    map_pixels(&big, |r, g, b| {
        let [r, g, b] = saturate_hsv(r, g, b, 1.2);
        [posterize(r, 8), posterize(g, 8), posterize(b, 8)]
    })
}

fn comic(src: &RgbaImage) -> RgbaImage {
    let k = contrast_factor(0.5);
    let lines = edges(src);
    let mut out = map_pixels(src, |r, g, b| {
        let [r, g, b] = saturate_hsv(r, g, b, 1.5);
        [posterize(contrast(r, k), 4), posterize(contrast(g, k), 4), posterize(contrast(b, k), 4)]
    });
    for (x, y, px) in out.enumerate_pixels_mut() {
        // Inverted edge map below the threshold draws a black line
        if 255 - lines.get_pixel(x, y)[0] < 180 {
            *px = Rgba([0, 0, 0, px[3]]);
        }
    }
    out
}

fn neon(src: &RgbaImage) -> RgbaImage {
    let glow = edges(src);
    let mut out = map_pixels(src, |r, g, b| {
        let [r, g, b] = saturate_hsv(r, g, b, 2.0);
        [brightness(r, 0.5), brightness(g, 0.5), brightness(b, 0.5)]
    });
    for (x, y, px) in out.enumerate_pixels_mut() {
        let e = glow.get_pixel(x, y)[0] as f32;
        if e > 100.0 {
            for c in 0..3 {
                px[c] = to_channel(px[c] as f32 + e);
            }
        }
    }
    imageops::blur(&out, 1.0)
}

fn watercolor(src: &RgbaImage) -> RgbaImage {
    let soft = imageops::blur(src, 2.0);
    map_pixels(&soft, |r, g, b| {
        let [r, g, b] = saturate_hsv(r, g, b, 1.1);
        let lift = |v: f32| posterize(brightness(v, 1.2), 6);
        [lift(r), lift(g), lift(b)]
    })
}

fn oil_painting(src: &RgbaImage) -> RgbaImage {
    let k = contrast_factor(0.2);
    let base = map_pixels(src, |r, g, b| {
        let [r, g, b] = saturate_hsv(r, g, b, 1.3);
        [posterize(contrast(r, k), 4), posterize(contrast(g, k), 4), posterize(contrast(b, k), 4)]
    });
    let soft = imageops::blur(&base, 1.0);
    let sharpen = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];
    imageops::filter3x3(&soft, &sharpen)
}

// ============================================================================
// Engine
// ============================================================================

/// Mix `styled` into `original` by `intensity` in [0, 1].
pub fn blend_with_original(original: &RgbaImage, styled: &RgbaImage, intensity: f32) -> RgbaImage {
    let t = intensity.clamp(0.0, 1.0);
    let mut out = original.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        *px = mix_pixel(*px, *styled.get_pixel(x, y), t);
    }
    out
}

/// Style engine that renders looks on the local CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStyleEngine;

impl LocalStyleEngine {
    /// Synchronous variant, for callers already off the async runtime.
    pub fn apply_blocking(image: &DynamicImage, style_id: &str, intensity: f32) -> Result<DynamicImage> {
        let look = Look::by_name(style_id)
            .ok_or_else(|| MemeforgeError::Style(format!("Unknown style '{}'. Available: {}", style_id, LOOKS.join(", "))))?;
        let original = image.to_rgba8();
        let styled = look.render(&original);
        Ok(DynamicImage::ImageRgba8(blend_with_original(&original, &styled, intensity)))
    }
}

#[async_trait]
impl StyleFilterEngine for LocalStyleEngine {
    fn name(&self) -> &str {
        "local"
    }

    async fn apply(&self, image: &DynamicImage, style_id: &str, intensity: f32) -> Result<DynamicImage> {
        let image = image.clone();
        let style_id = style_id.to_string();
        tokio::task::spawn_blocking(move || Self::apply_blocking(&image, &style_id, intensity))
            .await
            .map_err(|e| MemeforgeError::Style(format!("Style task failed: {}", e)))?
    }
}
