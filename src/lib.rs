//! # Memeforge - Meme and Collage Compositing
//!
//! Memeforge turns a template image plus user text into a finished meme. It
//! provides:
//!
//! - **Templates**: text-slot geometry in native or reference-normalized units
//! - **Text layout**: greedy word wrap, stroke-then-fill captions, alignment
//! - **Filters**: brightness, contrast and saturation with a manual fallback
//! - **Sessions**: ordered render passes with stale-result rejection
//! - **Drag**: pointer repositioning of captions by relative deltas
//! - **Styles**: optional artistic looks, local or over HTTP
//! - **Collages**: several images in fixed layouts with freeform text
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use memeforge::{
//!     DefaultImageLoader, EditingSession, EditorConfig, FontRegistry,
//!     render::RenderContext, template::{AreaId, Template},
//! };
//!
//! # async fn demo() -> memeforge::Result<()> {
//! let template = Template::from_json(&std::fs::read_to_string("drake.json")?)?;
//! let config = EditorConfig::default();
//! let fonts = Arc::new(FontRegistry::from_paths(&config.fonts));
//! let mut session = EditingSession::new(Arc::new(template), &config, fonts)?;
//!
//! session.set_text(&AreaId::positional(0), "writing tests")?;
//! session.set_text(&AreaId::positional(1), "writing tests that pass")?;
//!
//! let ctx = RenderContext::with_default_client()?.with_capacity(config.cache.max_images);
//! let loader = DefaultImageLoader::new(ctx);
//! session.render(&loader).await?;
//! std::fs::write("meme.png", session.export(image::ImageFormat::Png)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Templates, text areas and editable text content |
//! | [`geometry`] | Canvas fitting and area mapping |
//! | [`text`] | Fonts, wrapping and caption drawing |
//! | [`filter`] | Image adjustment engines |
//! | [`render`] | Render passes and their results |
//! | [`session`] | Editing state and render sequencing |
//! | [`drag`] | Hit testing and pointer drags |
//! | [`style`] | Artistic style collaborators |
//! | [`collage`] | Multi-image layouts |
//! | [`resolve`] | Image loading from URLs, data URLs and files |
//! | [`config`] | TOML configuration |
//! | [`error`] | Error types |

pub mod collage;
pub mod config;
pub mod drag;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod render;
pub mod resolve;
pub mod session;
pub mod shader;
pub mod style;
pub mod template;
pub mod text;

// Re-exports for convenience
pub use config::EditorConfig;
pub use error::{MemeforgeError, Result};
pub use filter::{FilterEngine, FilterSettings};
pub use resolve::{DefaultImageLoader, ImageLoader};
pub use session::EditingSession;
pub use template::Template;
pub use text::FontRegistry;
