//! Blending and interpolation functions.
//!
//! [`blend_dodge`] works on normalized [0, 1] values. [`source_over`] works on
//! straight-alpha RGBA pixels, which is what the canvas stores.

use image::Rgba;

/// Linear interpolation between two values.
///
/// Returns `a` when `t=0`, `b` when `t=1`, and linear blend in between.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Color dodge: brightens the base by the inverse of the blend.
#[inline]
pub fn blend_dodge(base: f32, blend: f32) -> f32 {
    if blend >= 1.0 {
        1.0
    } else {
        (base / (1.0 - blend)).min(1.0)
    }
}

/// Composite `src` over `dst` with an extra coverage factor in [0, 1].
///
/// Straight (non-premultiplied) alpha, matching how `RgbaImage` stores pixels.
pub fn source_over(dst: Rgba<u8>, src: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let sa = (src[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Per-channel mix of two pixels; `t=0` keeps `a`, `t=1` gives `b`.
pub fn mix_pixel(a: Rgba<u8>, b: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = lerp(a[i] as f32, b[i] as f32, t).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 10.0, 0.5) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_blend_dodge_saturates() {
        assert_eq!(blend_dodge(0.2, 1.0), 1.0);
        assert!((blend_dodge(0.25, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_source_over_opaque_replaces() {
        let dst = Rgba([10, 20, 30, 255]);
        let src = Rgba([200, 100, 50, 255]);
        assert_eq!(source_over(dst, src, 1.0), src);
    }

    #[test]
    fn test_source_over_zero_coverage_is_noop() {
        let dst = Rgba([10, 20, 30, 255]);
        let src = Rgba([200, 100, 50, 255]);
        assert_eq!(source_over(dst, src, 0.0), dst);
    }

    #[test]
    fn test_source_over_half_coverage() {
        let dst = Rgba([0, 0, 0, 255]);
        let src = Rgba([255, 255, 255, 255]);
        let out = source_over(dst, src, 0.5);
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_mix_pixel_endpoints() {
        let a = Rgba([0, 0, 0, 255]);
        let b = Rgba([255, 255, 255, 255]);
        assert_eq!(mix_pixel(a, b, 0.0), a);
        assert_eq!(mix_pixel(a, b, 1.0), b);
    }
}
