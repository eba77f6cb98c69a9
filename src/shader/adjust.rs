//! Per-channel intensity adjustments.
//!
//! Channel values are `f32` in the 0..=255 domain so intermediate results can
//! leave the representable range; callers clamp once with [`to_channel`].

/// Round and clamp a working value back into a `u8` channel.
#[inline]
pub fn to_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Multiplicative brightness. `factor` 1.0 is identity.
#[inline]
pub fn brightness(value: f32, factor: f32) -> f32 {
    value * factor
}

/// Contrast factor for a centered amount in [-1, 1] (0 is identity).
///
/// Uses the classic 259/255 curve with `C = 255 * amount`:
/// `259 * (C + 255) / (255 * (259 - C))`. Finite across the whole range.
#[inline]
pub fn contrast_factor(amount: f32) -> f32 {
    let c = amount.clamp(-1.0, 1.0) * 255.0;
    (259.0 * (c + 255.0)) / (255.0 * (259.0 - c))
}

/// Apply a contrast factor around the 128 midpoint.
#[inline]
pub fn contrast(value: f32, factor: f32) -> f32 {
    factor * (value - 128.0) + 128.0
}

/// Linear contrast around the midpoint, as CSS `contrast()` defines it.
///
/// `amount` 1.0 is identity, 0.0 is flat gray.
#[inline]
pub fn contrast_linear(value: f32, amount: f32) -> f32 {
    (value - 127.5) * amount + 127.5
}

/// Reduce a channel to `levels` evenly spaced values.
#[inline]
pub fn posterize(value: f32, levels: u32) -> f32 {
    if levels < 2 {
        return value;
    }
    let step = 255.0 / (levels - 1) as f32;
    (value / step).round() * step
}

/// Rec. 601 luma of an RGB triple.
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}
