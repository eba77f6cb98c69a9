//! # Rendering Module
//!
//! A render pass turns a base image plus a [`Scene`] into one finished
//! canvas. Passes move through fixed states:
//!
//! ```text
//! Idle → Loading → Scaling → DrawingBase → [ApplyingFilters] → DrawingText → Ready
//!           └──────────────────────────────────────────────────────────────→ Failed
//! ```
//!
//! Loading is the only async step. The remaining steps run on a blocking
//! thread and cannot be observed half-done: the canvas leaves a pass only
//! inside a finished [`RenderResult`].
//!
//! ## Modules
//!
//! - [`compositor`]: the synchronous scale/draw/filter/text pipeline
//! - [`context`]: HTTP client and image cache shared by passes
//! - [`layout`]: font sizing and anchor math shared with drag handling

pub mod compositor;
pub mod context;
pub mod layout;

pub use compositor::{Composition, compose};
pub use context::RenderContext;

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::config::{CanvasConfig, EditorConfig, TextConfig};
use crate::error::{MemeforgeError, Result};
use crate::filter::{FilterEngine, FilterSettings};
use crate::geometry::CanvasGeometry;
use crate::resolve::ImageLoader;
use crate::template::{SourceKind, TextArea, TextContent, TextTarget};
use crate::text::FontRegistry;

/// Where a pass is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Idle,
    Loading,
    Scaling,
    DrawingBase,
    ApplyingFilters,
    DrawingText,
    Ready,
    Failed,
}

/// Canvas and text constants a pass needs from the config.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderSettings {
    pub canvas: CanvasConfig,
    pub text: TextConfig,
    pub filter_engine: FilterEngine,
}

impl From<&EditorConfig> for RenderSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            canvas: config.canvas,
            text: config.text,
            filter_engine: config.filter.engine,
        }
    }
}

/// Everything drawn on top of the base image.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub areas: Vec<TextArea>,
    pub source: SourceKind,
    pub content: TextContent,
    pub filters: FilterSettings,
}

/// Identity of the base image a pass was started for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageId {
    /// Loaded from a reference (URL, data URL or path).
    Reference(String),
    /// A styled snapshot held in memory, numbered per session.
    Styled(u64),
}

/// Base image of a pass.
#[derive(Debug, Clone)]
pub enum BaseImage {
    /// Load through the [`ImageLoader`].
    Reference(String),
    /// A finished canvas run through a style, with filters and text already
    /// composited in. `logical_width` is the width of the template image it
    /// was made from.
    Styled {
        serial: u64,
        image: Arc<DynamicImage>,
        logical_width: u32,
    },
}

impl BaseImage {
    pub fn id(&self) -> ImageId {
        match self {
            BaseImage::Reference(reference) => ImageId::Reference(reference.clone()),
            BaseImage::Styled { serial, .. } => ImageId::Styled(*serial),
        }
    }
}

/// A text item that could not be drawn in a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub target: TextTarget,
    pub message: String,
}

/// What a pass was started for: pass number, content revision, base image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderTicket {
    pub generation: u64,
    pub revision: u64,
    pub image: ImageId,
}

/// Outcome of one render pass, emitted exactly once.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub ticket: RenderTicket,
    pub status: RenderStatus,
    pub canvas: Option<Arc<RgbaImage>>,
    pub geometry: Option<CanvasGeometry>,
    pub error: Option<Arc<MemeforgeError>>,
    pub item_errors: Vec<ItemError>,
}

impl RenderResult {
    /// A session that has not rendered yet.
    pub fn idle() -> Self {
        Self {
            ticket: RenderTicket {
                generation: 0,
                revision: 0,
                image: ImageId::Reference(String::new()),
            },
            status: RenderStatus::Idle,
            canvas: None,
            geometry: None,
            error: None,
            item_errors: Vec::new(),
        }
    }

    fn failed(ticket: RenderTicket, error: MemeforgeError) -> Self {
        Self {
            ticket,
            status: RenderStatus::Failed,
            canvas: None,
            geometry: None,
            error: Some(Arc::new(error)),
            item_errors: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.ticket.generation
    }

    pub fn is_ready(&self) -> bool {
        self.status == RenderStatus::Ready
    }

    fn ready_canvas(&self) -> Result<&RgbaImage> {
        match (&self.status, &self.canvas) {
            (RenderStatus::Ready, Some(canvas)) => Ok(canvas),
            (status, _) => Err(MemeforgeError::NotReady(format!("render status is {:?}", status))),
        }
    }

    /// Encode the canvas. Only a `Ready` result can be exported.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>> {
        let canvas = self.ready_canvas()?;
        let mut bytes = Vec::new();
        let image = match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas.clone()).to_rgb8()),
            _ => DynamicImage::ImageRgba8(canvas.clone()),
        };
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .map_err(|e| MemeforgeError::Encode(format!("Failed to encode {:?}: {}", format, e)))?;
        Ok(bytes)
    }

    /// Write the canvas to a file; format follows the extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = ImageFormat::from_path(path)
            .map_err(|e| MemeforgeError::Encode(format!("Unknown output format for {}: {}", path.display(), e)))?;
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// A detached render pass: an owned snapshot of everything it draws.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub ticket: RenderTicket,
    pub base: BaseImage,
    pub scene: Scene,
    pub settings: RenderSettings,
    pub fonts: Arc<FontRegistry>,
}

impl RenderJob {
    /// Run the pass to completion.
    ///
    /// Never returns an error: failures end in a `Failed` result.
    pub async fn run(self, loader: &dyn ImageLoader) -> RenderResult {
        let generation = self.ticket.generation;
        tracing::debug!(generation, status = ?RenderStatus::Loading, "render");

        let (image, logical_width, baked) = match &self.base {
            BaseImage::Reference(reference) => match loader.load(reference).await {
                Ok(image) => (image, None, false),
                Err(e) => {
                    tracing::warn!(generation, error = %e, "base image failed to load");
                    return RenderResult::failed(self.ticket, e);
                }
            },
            BaseImage::Styled {
                image, logical_width, ..
            } => (Arc::clone(image), Some(*logical_width), true),
        };

        let RenderJob {
            ticket,
            scene,
            settings,
            fonts,
            ..
        } = self;

        let composed = tokio::task::spawn_blocking(move || {
            compose(&image, &scene, &settings, &fonts, logical_width, baked, generation)
        })
        .await
        .map_err(render_task_failed);

        match composed {
            Ok(Ok(out)) => {
                tracing::debug!(
                    generation,
                    status = ?RenderStatus::Ready,
                    width = out.geometry.width,
                    height = out.geometry.height,
                    "render"
                );
                RenderResult {
                    ticket,
                    status: RenderStatus::Ready,
                    canvas: Some(Arc::new(out.canvas)),
                    geometry: Some(out.geometry),
                    error: None,
                    item_errors: out.item_errors,
                }
            }
            Ok(Err(e)) | Err(e) => {
                tracing::warn!(generation, error = %e, "render failed");
                RenderResult::failed(ticket, e)
            }
        }
    }
}

/// A compose task that panicked or was cancelled.
fn render_task_failed(e: tokio::task::JoinError) -> MemeforgeError {
    MemeforgeError::Render(format!("Render task failed: {}", e))
}
