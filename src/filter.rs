//! # Image Filters
//!
//! Brightness, contrast and saturation in percent (100 = unchanged, valid
//! range 0..=200), applied to a drawn region of the canvas.
//!
//! Two engines produce the adjustment:
//!
//! - [`FilterEngine::Css`]: the CSS `brightness() contrast() saturate()`
//!   chain. This is the primary path. It refuses values it cannot represent.
//! - [`FilterEngine::Manual`]: per-pixel RGB math with an HSV round trip for
//!   saturation. Always succeeds, so it is also the fallback.
//!
//! [`apply_filters`] runs the configured engine and falls through to the
//! manual path on failure; callers never see a filter error.

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{MemeforgeError, Result};
use crate::shader::{brightness, contrast, contrast_factor, contrast_linear, hsv_to_rgb, rgb_to_hsv, to_channel};

/// Identity value for every filter.
pub const FILTER_IDENTITY: f32 = 100.0;
/// Largest percent the CSS engine accepts.
pub const FILTER_MAX: f32 = 200.0;

/// Session-wide filter values, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: FILTER_IDENTITY,
            contrast: FILTER_IDENTITY,
            saturation: FILTER_IDENTITY,
        }
    }
}

impl FilterSettings {
    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
        }
    }

    /// Return every value to 100.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when applying these settings would change nothing.
    pub fn is_identity(&self) -> bool {
        self.brightness == FILTER_IDENTITY
            && self.contrast == FILTER_IDENTITY
            && self.saturation == FILTER_IDENTITY
    }
}

/// Which filter implementation runs first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterEngine {
    #[default]
    Css,
    Manual,
}

impl FilterEngine {
    pub fn name(&self) -> &'static str {
        match self {
            FilterEngine::Css => "css",
            FilterEngine::Manual => "manual",
        }
    }

    /// Run this engine on the top-left `width` × `height` region.
    pub fn apply(&self, canvas: &mut RgbaImage, settings: &FilterSettings, width: u32, height: u32) -> Result<()> {
        match self {
            FilterEngine::Css => apply_css(canvas, settings, width, height),
            FilterEngine::Manual => {
                apply_manual(canvas, settings, width, height);
                Ok(())
            }
        }
    }
}

/// Apply `settings` to the top-left `target_width` × `target_height` region.
///
/// Does nothing when every value is 100. A primary-engine failure is logged
/// and the manual path runs instead.
pub fn apply_filters(
    canvas: &mut RgbaImage,
    settings: &FilterSettings,
    target_width: u32,
    target_height: u32,
    engine: FilterEngine,
) {
    if settings.is_identity() {
        return;
    }

    if let Err(e) = engine.apply(canvas, settings, target_width, target_height) {
        tracing::warn!(engine = engine.name(), error = %e, "filter engine failed, using manual path");
        apply_manual(canvas, settings, target_width, target_height);
    }
}

/// Run `f` on each RGB triple inside the region, in parallel by row.
fn for_each_rgb(canvas: &mut RgbaImage, width: u32, height: u32, f: impl Fn(f32, f32, f32) -> [u8; 3] + Sync) {
    let canvas_width = canvas.width() as usize;
    let width = (width as usize).min(canvas_width);
    let height = (height as usize).min(canvas.height() as usize);
    if width == 0 || height == 0 {
        return;
    }

    let buf: &mut [u8] = canvas;
    buf.par_chunks_mut(canvas_width * 4)
        .take(height)
        .for_each(|row| {
            for px in row[..width * 4].chunks_exact_mut(4) {
                let [r, g, b] = f(px[0] as f32, px[1] as f32, px[2] as f32);
                px[0] = r;
                px[1] = g;
                px[2] = b;
            }
        });
}

// ============================================================================
// CSS engine
// ============================================================================

fn check_css_value(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && (0.0..=FILTER_MAX).contains(&value) {
        Ok(value / 100.0)
    } else {
        Err(MemeforgeError::FilterUnsupported(format!(
            "{}({}%) is outside 0..={}",
            name, value, FILTER_MAX
        )))
    }
}

/// `saturate(s)` color matrix row for one output channel.
#[inline]
fn saturate(r: f32, g: f32, b: f32, s: f32) -> [f32; 3] {
    [
        (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
        (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
    ]
}

fn apply_css(canvas: &mut RgbaImage, settings: &FilterSettings, width: u32, height: u32) -> Result<()> {
    let b = check_css_value("brightness", settings.brightness)?;
    let c = check_css_value("contrast", settings.contrast)?;
    let s = check_css_value("saturate", settings.saturation)?;

    // Each function in a CSS filter chain clamps its output.
    let clamp = |v: f32| v.clamp(0.0, 255.0);
    for_each_rgb(canvas, width, height, |r, g, bl| {
        let (r, g, bl) = (clamp(r * b), clamp(g * b), clamp(bl * b));
        let (r, g, bl) = (
            clamp(contrast_linear(r, c)),
            clamp(contrast_linear(g, c)),
            clamp(contrast_linear(bl, c)),
        );
        let [r, g, bl] = saturate(r, g, bl, s);
        [to_channel(r), to_channel(g), to_channel(bl)]
    });
    Ok(())
}

// ============================================================================
// Manual engine
// ============================================================================

fn apply_manual(canvas: &mut RgbaImage, settings: &FilterSettings, width: u32, height: u32) {
    let brightness_factor = (settings.brightness != FILTER_IDENTITY).then(|| settings.brightness / 100.0);
    let contrast_k = (settings.contrast != FILTER_IDENTITY).then(|| contrast_factor(settings.contrast / 100.0 - 1.0));
    let saturation_factor = (settings.saturation != FILTER_IDENTITY).then(|| settings.saturation / 100.0);

    for_each_rgb(canvas, width, height, |mut r, mut g, mut b| {
        if let Some(factor) = brightness_factor {
            r = brightness(r, factor);
            g = brightness(g, factor);
            b = brightness(b, factor);
        }
        if let Some(k) = contrast_k {
            r = contrast(r, k);
            g = contrast(g, k);
            b = contrast(b, k);
        }
        if let Some(factor) = saturation_factor {
            let (h, s, v) = rgb_to_hsv(r.clamp(0.0, 255.0), g.clamp(0.0, 255.0), b.clamp(0.0, 255.0));
            let s = (s * factor).clamp(0.0, 1.0);
            (r, g, b) = hsv_to_rgb(h, s, v);
        }
        [to_channel(r), to_channel(g), to_channel(b)]
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 3, Rgba([r, g, b, 255]))
    }

    #[test]
    fn test_manual_brightness_150() {
        let mut img = solid(100, 100, 100);
        let settings = FilterSettings::new(150.0, 100.0, 100.0);
        FilterEngine::Manual.apply(&mut img, &settings, 4, 3).unwrap();
        assert!(img.pixels().all(|p| *p == Rgba([150, 150, 150, 255])));
    }

    #[test]
    fn test_identity_is_untouched() {
        let mut img = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 77, 200]));
        let before = img.clone();
        apply_filters(&mut img, &FilterSettings::default(), 8, 8, FilterEngine::Css);
        assert_eq!(img, before);
        apply_filters(&mut img, &FilterSettings::default(), 8, 8, FilterEngine::Manual);
        assert_eq!(img, before);
    }

    #[test]
    fn test_engines_at_identity_values() {
        let mut css = solid(10, 200, 90);
        let mut manual = solid(10, 200, 90);
        let settings = FilterSettings::new(100.0, 100.0, 100.0);
        FilterEngine::Css.apply(&mut css, &settings, 4, 3).unwrap();
        FilterEngine::Manual.apply(&mut manual, &settings, 4, 3).unwrap();
        assert_eq!(*css.get_pixel(0, 0), Rgba([10, 200, 90, 255]));
        assert_eq!(*manual.get_pixel(0, 0), Rgba([10, 200, 90, 255]));
    }

    #[test]
    fn test_bounds_clamp_without_panic() {
        for engine in [FilterEngine::Css, FilterEngine::Manual] {
            for settings in [
                FilterSettings::new(0.0, 0.0, 0.0),
                FilterSettings::new(200.0, 200.0, 200.0),
                FilterSettings::new(0.0, 200.0, 0.0),
            ] {
                let mut img = RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255]));
                apply_filters(&mut img, &settings, 16, 16, engine);
                assert_eq!(img.dimensions(), (16, 16));
            }
        }
    }

    #[test]
    fn test_zero_brightness_is_black() {
        let mut img = solid(200, 120, 40);
        apply_filters(&mut img, &FilterSettings::new(0.0, 100.0, 100.0), 4, 3, FilterEngine::Manual);
        assert_eq!(*img.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        let mut img = solid(200, 50, 50);
        apply_filters(&mut img, &FilterSettings::new(100.0, 100.0, 0.0), 4, 3, FilterEngine::Manual);
        let p = img.get_pixel(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn test_css_rejects_out_of_range() {
        let mut img = solid(1, 2, 3);
        let err = FilterEngine::Css
            .apply(&mut img, &FilterSettings::new(250.0, 100.0, 100.0), 4, 3)
            .unwrap_err();
        assert!(matches!(err, MemeforgeError::FilterUnsupported(_)));
        assert!(FilterEngine::Css
            .apply(&mut img, &FilterSettings::new(f32::NAN, 100.0, 100.0), 4, 3)
            .is_err());
    }

    #[test]
    fn test_css_failure_falls_back_to_manual() {
        let mut img = solid(100, 100, 100);
        apply_filters(&mut img, &FilterSettings::new(300.0, 100.0, 100.0), 4, 3, FilterEngine::Css);
        // Manual brightness 3x, clamped
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_region_only() {
        let mut img = solid(100, 100, 100);
        apply_filters(&mut img, &FilterSettings::new(150.0, 100.0, 100.0), 2, 1, FilterEngine::Css);
        assert_eq!(*img.get_pixel(0, 0), Rgba([150, 150, 150, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([150, 150, 150, 255]));
        assert_eq!(*img.get_pixel(2, 0), Rgba([100, 100, 100, 255]));
        assert_eq!(*img.get_pixel(0, 1), Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn test_alpha_preserved() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([80, 90, 100, 42]));
        apply_filters(&mut img, &FilterSettings::new(120.0, 80.0, 130.0), 2, 2, FilterEngine::Manual);
        assert!(img.pixels().all(|p| p[3] == 42));
    }

    #[test]
    fn test_reset() {
        let mut s = FilterSettings::new(10.0, 20.0, 30.0);
        assert!(!s.is_identity());
        s.reset();
        assert!(s.is_identity());
    }
}
