//! Font faces: width measurement and coverage rasterization.
//!
//! The built-in face is the Spleen 12×24 bitmap font scaled to the requested
//! pixel size. It needs no font files, and its measurements are exact
//! (`chars × size / 2`), which keeps layout deterministic across machines.

use spleen_font::{FONT_12X24, PSF2Font};

use crate::error::{MemeforgeError, Result};

/// Anti-aliased coverage buffer for one rendered line.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: usize,
    pub height: usize,
    /// Coverage per pixel: 0.0 = empty, 1.0 = fully inside a glyph.
    pub data: Vec<f32>,
}

impl GlyphMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&c| c <= 0.0)
    }
}

/// Width measurement and rasterization for one font.
///
/// Faces are shared across render passes, so implementations must be
/// `Send + Sync`.
pub trait FontFace: Send + Sync {
    /// Face name, for logs.
    fn name(&self) -> &str;

    /// Rendered width of `text` at `px` pixels.
    fn measure(&self, text: &str, px: f32) -> Result<f32>;

    /// Rasterize a single line. Mask height is the line box at `px`.
    fn rasterize(&self, text: &str, px: f32) -> Result<GlyphMask>;
}

pub(crate) fn check_px(face: &str, px: f32) -> Result<()> {
    if px.is_finite() && px > 0.0 {
        Ok(())
    } else {
        Err(MemeforgeError::MeasurementUnavailable(format!(
            "{}: invalid font size {}",
            face, px
        )))
    }
}

const SPLEEN_W: usize = 12;
const SPLEEN_H: usize = 24;
/// Subsamples per axis when downscaling glyph cells.
const SUPERSAMPLE: usize = 3;

/// Built-in bitmap face (Spleen 12×24).
#[derive(Debug, Clone, Copy, Default)]
pub struct SpleenFace;

impl SpleenFace {
    /// Cell size for a pixel height: the font is twice as tall as wide.
    fn cell(px: f32) -> (usize, usize) {
        let h = px.round().max(1.0) as usize;
        let w = (px / 2.0).round().max(1.0) as usize;
        (w, h)
    }

    /// 12×24 on/off bitmap for a character.
    fn glyph_bitmap(font: &mut PSF2Font, ch: char) -> Vec<u8> {
        let mut glyph = vec![0u8; SPLEEN_W * SPLEEN_H];
        if ch == ' ' {
            return glyph;
        }

        let utf8_bytes = ch.to_string();
        if let Some(spleen_glyph) = font.glyph_for_utf8(utf8_bytes.as_bytes()) {
            for (row_y, row) in spleen_glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    let idx = row_y * SPLEEN_W + col_x;
                    if idx < glyph.len() && col_x < SPLEEN_W {
                        glyph[idx] = if on { 1 } else { 0 };
                    }
                }
            }
        } else {
            draw_box(&mut glyph, SPLEEN_W, SPLEEN_H);
        }
        glyph
    }
}

impl FontFace for SpleenFace {
    fn name(&self) -> &str {
        "spleen"
    }

    fn measure(&self, text: &str, px: f32) -> Result<f32> {
        check_px(self.name(), px)?;
        Ok(text.chars().count() as f32 * px / 2.0)
    }

    fn rasterize(&self, text: &str, px: f32) -> Result<GlyphMask> {
        check_px(self.name(), px)?;
        let (cell_w, cell_h) = Self::cell(px);
        let count = text.chars().count();
        let mut mask = GlyphMask::new((cell_w * count).max(1), cell_h);

        let mut font = PSF2Font::new(FONT_12X24).map_err(|_| {
            MemeforgeError::MeasurementUnavailable("Failed to load Spleen 12x24".to_string())
        })?;

        for (i, ch) in text.chars().enumerate() {
            let bitmap = Self::glyph_bitmap(&mut font, ch);
            let origin_x = i * cell_w;

            // Box-filter the 12x24 cell down (or up) to the target cell.
            for dy in 0..cell_h {
                for dx in 0..cell_w {
                    let mut hits = 0usize;
                    for sy in 0..SUPERSAMPLE {
                        for sx in 0..SUPERSAMPLE {
                            let fx = (dx as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32) / cell_w as f32;
                            let fy = (dy as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32) / cell_h as f32;
                            let bx = ((fx * SPLEEN_W as f32) as usize).min(SPLEEN_W - 1);
                            let by = ((fy * SPLEEN_H as f32) as usize).min(SPLEEN_H - 1);
                            hits += bitmap[by * SPLEEN_W + bx] as usize;
                        }
                    }
                    let coverage = hits as f32 / (SUPERSAMPLE * SUPERSAMPLE) as f32;
                    mask.data[dy * mask.width + origin_x + dx] = coverage;
                }
            }
        }

        Ok(mask)
    }
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}
