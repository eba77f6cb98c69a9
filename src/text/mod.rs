//! # Text Layout and Rendering
//!
//! - [`wrap`]: greedy word wrapping driven by a measurement callback
//! - [`font`]: the [`FontFace`] trait and the built-in Spleen bitmap face
//! - [`ttf_font`]: TrueType faces loaded from configured paths
//! - [`draw`]: stroke-then-fill compositing of wrapped lines

pub mod draw;
pub mod font;
pub mod ttf_font;
pub mod wrap;

pub use draw::{TextPaint, draw_text_block};
pub use font::{FontFace, GlyphMask, SpleenFace};
pub use ttf_font::TtfFace;
pub use wrap::{line_offset, wrap_text};

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Font families available to the renderer.
///
/// Lookups are case-insensitive. Unknown families resolve to the built-in
/// Spleen face so text always renders.
#[derive(Clone)]
pub struct FontRegistry {
    faces: HashMap<String, Arc<dyn FontFace>>,
    fallback: Arc<dyn FontFace>,
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut families: Vec<_> = self.faces.keys().collect();
        families.sort();
        f.debug_struct("FontRegistry")
            .field("families", &families)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self {
            faces: HashMap::new(),
            fallback: Arc::new(SpleenFace),
        }
    }
}

impl FontRegistry {
    /// Registry with only the built-in face.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured `family -> .ttf` mapping.
    ///
    /// A font that fails to load is logged and skipped; its family falls
    /// back to the built-in face.
    pub fn from_paths(fonts: &BTreeMap<String, PathBuf>) -> Self {
        let mut registry = Self::new();
        for (family, path) in fonts {
            match TtfFace::from_file(family.clone(), path) {
                Ok(face) => {
                    tracing::debug!(family = %family, path = %path.display(), "loaded font");
                    registry.register(family, Arc::new(face));
                }
                Err(e) => {
                    tracing::warn!(family = %family, path = %path.display(), error = %e, "font not loaded, using built-in face");
                }
            }
        }
        registry
    }

    /// Register (or replace) a family.
    pub fn register(&mut self, family: &str, face: Arc<dyn FontFace>) {
        self.faces.insert(family.to_lowercase(), face);
    }

    /// Face for a family, or the built-in face.
    pub fn face(&self, family: &str) -> Arc<dyn FontFace> {
        self.faces
            .get(&family.to_lowercase())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Whether a family has its own face.
    pub fn has_family(&self, family: &str) -> bool {
        self.faces.contains_key(&family.to_lowercase())
    }
}
