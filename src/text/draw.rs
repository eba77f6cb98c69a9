//! Stroke-then-fill text compositing onto an RGBA canvas.

use image::RgbaImage;
use rayon::prelude::*;

use super::font::{FontFace, GlyphMask};
use super::wrap::line_offset;
use crate::error::Result;
use crate::shader::{Color, source_over};
use crate::template::Align;

/// Everything needed to paint one wrapped text block.
#[derive(Debug, Clone, Copy)]
pub struct TextPaint {
    /// Font size in canvas pixels.
    pub px: f32,
    /// Outline width in canvas pixels (0 disables the stroke).
    pub stroke_px: f32,
    pub line_height: f32,
    pub fill: Color,
    pub stroke: Color,
    pub align: Align,
}

/// Grow a coverage mask by `radius` pixels in every direction.
///
/// A canvas stroke of width `w` extends `w / 2` outside the glyph edge, so
/// outlines use `radius = stroke_px / 2`. The result is padded by
/// `ceil(radius)` on each side.
pub fn dilate(mask: &GlyphMask, radius: f32) -> (GlyphMask, usize) {
    let pad = radius.max(0.0).ceil() as usize;
    let out_w = mask.width + 2 * pad;
    let out_h = mask.height + 2 * pad;
    let mut out = GlyphMask::new(out_w, out_h);
    let r = pad as i64;

    out.data
        .par_chunks_mut(out_w)
        .enumerate()
        .for_each(|(oy, row)| {
            for (ox, cell) in row.iter_mut().enumerate() {
                let mut best = 0.0f32;
                for dy in -r..=r {
                    let sy = oy as i64 - pad as i64 + dy;
                    if sy < 0 || sy >= mask.height as i64 {
                        continue;
                    }
                    for dx in -r..=r {
                        let sx = ox as i64 - pad as i64 + dx;
                        if sx < 0 || sx >= mask.width as i64 {
                            continue;
                        }
                        let dist = ((dx * dx + dy * dy) as f32).sqrt();
                        let weight = (radius + 0.5 - dist).clamp(0.0, 1.0);
                        if weight <= 0.0 {
                            continue;
                        }
                        let v = mask.get(sx as usize, sy as usize) * weight;
                        if v > best {
                            best = v;
                        }
                    }
                }
                *cell = best;
            }
        });

    (out, pad)
}

/// Paint a coverage mask in `color` with its top-left at (`left`, `top`).
pub fn paint_mask(canvas: &mut RgbaImage, mask: &GlyphMask, left: i64, top: i64, color: Color) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for my in 0..mask.height {
        let y = top + my as i64;
        if y < 0 || y >= ch {
            continue;
        }
        for mx in 0..mask.width {
            let x = left + mx as i64;
            if x < 0 || x >= cw {
                continue;
            }
            let coverage = mask.get(mx, my);
            if coverage <= 0.0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(x as u32, y as u32);
            *dst = source_over(*dst, color.0, coverage);
        }
    }
}

/// Draw wrapped lines centered vertically on `anchor`.
///
/// Each line is stroked, then filled, before the next line is touched, so a
/// fill always sits on top of its own outline.
pub fn draw_text_block(
    canvas: &mut RgbaImage,
    face: &dyn FontFace,
    lines: &[String],
    anchor: (f32, f32),
    paint: &TextPaint,
) -> Result<()> {
    let count = lines.len();
    for (index, line) in lines.iter().enumerate() {
        let mask = face.rasterize(line, paint.px)?;
        let line_y = anchor.1 + line_offset(index, count, paint.line_height);
        let width = face.measure(line, paint.px)?;

        let left = match paint.align {
            Align::Left => anchor.0,
            Align::Center => anchor.0 - width / 2.0,
            Align::Right => anchor.0 - width,
        };
        let top = line_y - mask.height as f32 / 2.0;
        let (left, top) = (left.round() as i64, top.round() as i64);

        if paint.stroke_px > 0.0 {
            let (outline, pad) = dilate(&mask, paint.stroke_px / 2.0);
            paint_mask(canvas, &outline, left - pad as i64, top - pad as i64, paint.stroke);
        }
        paint_mask(canvas, &mask, left, top, paint.fill);
    }
    Ok(())
}
