//! TrueType faces loaded from disk.
//!
//! Renders text to an anti-aliased coverage buffer using ab_glyph. Used when
//! the config maps a font family (e.g. "Impact") to a `.ttf` file.

use ab_glyph::{Font, FontArc, ScaleFont, point};
use std::path::Path;

use super::font::{FontFace, GlyphMask, check_px};
use crate::error::{MemeforgeError, Result};

/// A TrueType/OpenType face.
#[derive(Clone)]
pub struct TtfFace {
    name: String,
    font: FontArc,
}

impl std::fmt::Debug for TtfFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfFace").field("name", &self.name).finish()
    }
}

impl TtfFace {
    /// Parse a font from raw bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| MemeforgeError::Config(format!("Invalid font '{}': {}", name, e)))?;
        Ok(Self { name, font })
    }

    /// Load a font file.
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(name, bytes)
    }

    /// Glyph ids and caret positions for a line, kerning applied.
    fn layout(&self, text: &str, px: f32) -> (Vec<(ab_glyph::GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(px);
        let mut glyphs = Vec::new();
        let mut caret_x = 0.0f32;
        let mut previous = None;

        for ch in text.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, caret_x));
            caret_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }

        (glyphs, caret_x)
    }
}

impl FontFace for TtfFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, text: &str, px: f32) -> Result<f32> {
        check_px(&self.name, px)?;
        Ok(self.layout(text, px).1)
    }

    fn rasterize(&self, text: &str, px: f32) -> Result<GlyphMask> {
        check_px(&self.name, px)?;
        let (glyphs, advance) = self.layout(text, px);

        // Line box from font metrics
        let scaled = self.font.as_scaled(px);
        let ascent = scaled.ascent();
        let descent = scaled.descent();
        let height = ((ascent - descent).ceil() as usize).max(1);
        let width = (advance.ceil() as usize).max(1);
        let baseline_y = ascent;

        let mut mask = GlyphMask::new(width, height);

        for &(glyph_id, glyph_x) in &glyphs {
            let glyph = glyph_id.with_scale_and_position(px, point(glyph_x, baseline_y));

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let x = gx as i32 + bounds.min.x as i32;
                    let y = gy as i32 + bounds.min.y as i32;

                    if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                        let idx = y as usize * width + x as usize;
                        // Accumulate coverage (clamped)
                        mask.data[idx] = (mask.data[idx] + coverage).min(1.0);
                    }
                });
            }
        }

        Ok(mask)
    }
}
