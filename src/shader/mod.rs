//! # Pixel Math
//!
//! Reusable building blocks for filters, style looks and text compositing.
//!
//! ## Categories
//!
//! - [`adjust`]: Brightness, contrast, clamping, posterize
//! - [`blend`]: Interpolation, blend modes, source-over compositing
//! - [`color`]: RGB↔HSV conversion and parsed color values

pub mod adjust;
pub mod blend;
pub mod color;

// Re-export all primitives at the top level for convenience
pub use adjust::*;
pub use blend::*;
pub use color::*;
