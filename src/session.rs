//! # Editing Session
//!
//! One template being edited: its text content, filters and base image, plus
//! the last committed render. Every mutation goes through the session so the
//! revision counter always reflects what the next pass must draw.
//!
//! Rendering is split in two so a pass can run detached:
//!
//! ```no_run
//! # async fn demo(session: &mut memeforge::EditingSession, loader: &dyn memeforge::ImageLoader) {
//! let job = session.begin_render();
//! let result = job.run(loader).await; // may overlap further edits
//! match session.commit(result) {
//!     Ok(ready) => println!("status {:?}", ready.status),
//!     Err(stale) => println!("{}", stale),
//! }
//! # }
//! ```

use image::{DynamicImage, ImageFormat};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{EditorConfig, TextConfig};
use crate::drag::DragController;
use crate::error::{MemeforgeError, Result};
use crate::filter::FilterSettings;
use crate::render::{BaseImage, RenderJob, RenderResult, RenderSettings, RenderStatus, RenderTicket, Scene};
use crate::resolve::ImageLoader;
use crate::style::{StyleFilterEngine, StyleOutcome, apply_style_with_timeout};
use crate::template::{AreaId, Template, TextContent, TextStyle, TextTarget};
use crate::text::FontRegistry;

/// Editing state for one template.
#[derive(Debug)]
pub struct EditingSession {
    template: Arc<Template>,
    content: TextContent,
    filters: FilterSettings,
    image_reference: String,
    base: BaseImage,
    settings: RenderSettings,
    fonts: Arc<FontRegistry>,
    revision: u64,
    generation: u64,
    styled_serial: u64,
    last: RenderResult,
    drag: DragController,
}

impl EditingSession {
    /// Bind a template: one text item per area, pre-filled with defaults.
    pub fn new(template: Arc<Template>, config: &EditorConfig, fonts: Arc<FontRegistry>) -> Result<Self> {
        template.validate()?;
        let content = TextContent::for_template(&template);
        let image_reference = template.image_url.clone();
        Ok(Self {
            base: BaseImage::Reference(image_reference.clone()),
            image_reference,
            content,
            template,
            filters: FilterSettings::default(),
            settings: RenderSettings::from(config),
            fonts,
            revision: 0,
            generation: 0,
            styled_serial: 0,
            last: RenderResult::idle(),
            drag: DragController::new(),
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn content(&self) -> &TextContent {
        &self.content
    }

    pub fn filters(&self) -> FilterSettings {
        self.filters
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn text_config(&self) -> &TextConfig {
        &self.settings.text
    }

    /// Last committed render.
    pub fn last_result(&self) -> &RenderResult {
        &self.last
    }

    /// Whether the committed canvas is out of date.
    pub fn needs_render(&self) -> bool {
        !self.last.is_ready() || self.last.ticket.revision != self.revision
    }

    pub fn is_styled(&self) -> bool {
        matches!(self.base, BaseImage::Styled { .. })
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Record a mutation. A styled snapshot no longer matches the edited
    /// content, so the base returns to the template image.
    fn touch(&mut self) {
        self.revision += 1;
        if self.is_styled() {
            tracing::debug!(revision = self.revision, "edit clears styled snapshot");
            self.base = BaseImage::Reference(self.image_reference.clone());
        }
    }

    pub fn set_text(&mut self, id: &AreaId, text: impl Into<String>) -> Result<()> {
        self.content.set_text(id, text)?;
        self.touch();
        Ok(())
    }

    pub fn set_style(&mut self, id: &AreaId, style: TextStyle) -> Result<()> {
        if !self.fonts.has_family(&style.font_family) {
            tracing::debug!(family = %style.font_family, "font family not registered, using built-in face");
        }
        self.content.set_style(id, style)?;
        self.touch();
        Ok(())
    }

    /// Change the style of any item in place.
    pub fn update_style(&mut self, target: &TextTarget, f: impl FnOnce(&mut TextStyle)) -> Result<()> {
        let style = self
            .content
            .style_mut(target)
            .ok_or_else(|| MemeforgeError::Template(format!("no {}", target)))?;
        f(style);
        self.touch();
        Ok(())
    }

    pub fn add_free_text(&mut self, text: impl Into<String>, x: f32, y: f32, style: TextStyle) -> Uuid {
        let id = self.content.add_free(text, x, y, style);
        self.touch();
        id
    }

    pub fn remove_free_text(&mut self, id: Uuid) -> bool {
        let removed = self.content.remove_free(id);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn set_filters(&mut self, filters: FilterSettings) {
        if filters != self.filters {
            self.filters = filters;
            self.touch();
        }
    }

    pub fn reset_filters(&mut self) {
        self.set_filters(FilterSettings::default());
    }

    /// Replace the base image, keeping text and filters.
    pub fn set_base_image(&mut self, reference: impl Into<String>) {
        self.image_reference = reference.into();
        self.base = BaseImage::Reference(self.image_reference.clone());
        self.revision += 1;
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Snapshot the session into a detached pass.
    pub fn begin_render(&mut self) -> RenderJob {
        self.generation += 1;
        let ticket = RenderTicket {
            generation: self.generation,
            revision: self.revision,
            image: self.base.id(),
        };
        tracing::debug!(generation = ticket.generation, revision = ticket.revision, "render pass started");
        RenderJob {
            ticket,
            base: self.base.clone(),
            scene: Scene {
                areas: self.template.text_areas.clone(),
                source: self.template.source,
                content: self.content.clone(),
                filters: self.filters,
            },
            settings: self.settings,
            fonts: Arc::clone(&self.fonts),
        }
    }

    /// Accept a finished pass, unless the session moved on while it ran.
    ///
    /// A failed pass keeps the previous canvas so the editor still has
    /// something to show.
    pub fn commit(&mut self, mut result: RenderResult) -> Result<&RenderResult> {
        let ticket = &result.ticket;
        if ticket.generation != self.generation || ticket.revision != self.revision || ticket.image != self.base.id() {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "stale render discarded"
            );
            return Err(MemeforgeError::StaleRenderDiscarded {
                generation: ticket.generation,
                current: self.generation,
            });
        }

        if result.status == RenderStatus::Failed {
            result.canvas = self.last.canvas.clone();
            result.geometry = self.last.geometry;
        }
        self.last = result;
        Ok(&self.last)
    }

    /// Begin, run and commit a pass.
    pub async fn render(&mut self, loader: &dyn ImageLoader) -> Result<&RenderResult> {
        let job = self.begin_render();
        let result = job.run(loader).await;
        self.commit(result)
    }

    /// Encode the committed canvas.
    pub fn export(&self, format: ImageFormat) -> Result<Vec<u8>> {
        if self.needs_render() {
            return Err(MemeforgeError::NotReady(
                "content changed since the last render".to_string(),
            ));
        }
        self.last.encode(format)
    }

    // ========================================================================
    // Pointer input
    // ========================================================================

    /// Start dragging whatever is under the pointer on the committed canvas.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<TextTarget> {
        let geometry = self.last.geometry?;
        self.drag.press_at(
            x,
            y,
            &self.template.text_areas,
            &self.content,
            geometry,
            self.template.source,
            &self.settings.text,
        )
    }

    /// Move the dragged item. Returns true when content changed.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        match self.drag.move_to(x, y, &mut self.content) {
            Some(_) => {
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn pointer_up(&mut self) -> Option<TextTarget> {
        self.drag.release()
    }

    pub fn pointer_leave(&mut self) -> Option<TextTarget> {
        self.drag.leave()
    }

    // ========================================================================
    // Styles
    // ========================================================================

    /// Run the committed canvas through a style engine.
    ///
    /// On success the styled image becomes the base of later passes until the
    /// next edit or [`clear_style`](Self::clear_style). On failure or timeout
    /// the session is unchanged and the returned outcome carries the error.
    pub async fn apply_style(
        &mut self,
        engine: &dyn StyleFilterEngine,
        style_id: &str,
        intensity: f32,
        timeout: Duration,
    ) -> Result<StyleOutcome> {
        let (Some(canvas), Some(geometry)) = (&self.last.canvas, self.last.geometry) else {
            return Err(MemeforgeError::NotReady("render before applying a style".to_string()));
        };
        if self.needs_render() {
            return Err(MemeforgeError::NotReady(
                "content changed since the last render".to_string(),
            ));
        }

        let snapshot = DynamicImage::ImageRgba8(canvas.as_ref().clone());
        let outcome = apply_style_with_timeout(engine, &snapshot, style_id, intensity, timeout).await;

        if let StyleOutcome::Styled(image) = &outcome {
            self.styled_serial += 1;
            let logical_width = (geometry.width as f32 / geometry.scale).round().max(1.0) as u32;
            self.base = BaseImage::Styled {
                serial: self.styled_serial,
                image: Arc::new(image.clone()),
                logical_width,
            };
            self.revision += 1;
        }
        Ok(outcome)
    }

    /// Drop a styled snapshot and render from the template image again.
    pub fn clear_style(&mut self) {
        if self.is_styled() {
            self.base = BaseImage::Reference(self.image_reference.clone());
            self.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{DefaultImageLoader, encode_png_data_url};
    use crate::render::RenderContext;
    use crate::style::LocalStyleEngine;
    use crate::template::{SourceKind, TextArea};
    use image::{Rgba, RgbaImage};

    fn data_url(w: u32, h: u32) -> String {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([90, 120, 150, 255])));
        encode_png_data_url(&img).unwrap()
    }

    fn session() -> EditingSession {
        let template = Template::with_source(
            "t",
            data_url(400, 400),
            vec![
                TextArea::new(0.0, 0.0, 400.0, 100.0).with_default_text("TOP"),
                TextArea::new(0.0, 300.0, 400.0, 100.0).with_default_text("BOTTOM"),
            ],
            SourceKind::Native,
        );
        EditingSession::new(Arc::new(template), &EditorConfig::default(), Arc::new(FontRegistry::new())).unwrap()
    }

    fn loader() -> DefaultImageLoader {
        DefaultImageLoader::new(RenderContext::new(reqwest::Client::new()))
    }

    #[tokio::test]
    async fn test_render_and_export() {
        let mut s = session();
        assert!(s.export(ImageFormat::Png).is_err());
        let result = s.render(&loader()).await.unwrap();
        assert_eq!(result.status, RenderStatus::Ready);
        assert!(!s.needs_render());
        assert!(s.export(ImageFormat::Png).is_ok());
    }

    #[tokio::test]
    async fn test_stale_pass_discarded() {
        let mut s = session();
        let loader = loader();
        let first = s.begin_render();
        let second = s.begin_render();

        let first = first.run(&loader).await;
        let err = s.commit(first).unwrap_err();
        assert!(matches!(
            err,
            MemeforgeError::StaleRenderDiscarded {
                generation: 1,
                current: 2
            }
        ));

        let second = second.run(&loader).await;
        assert!(s.commit(second).is_ok());
    }

    #[tokio::test]
    async fn test_edit_during_pass_makes_it_stale() {
        let mut s = session();
        let job = s.begin_render();
        s.set_text(&AreaId::positional(0), "changed").unwrap();
        let result = job.run(&loader()).await;
        assert!(s.commit(result).is_err());
        assert!(s.needs_render());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_canvas() {
        let mut s = session();
        s.render(&loader()).await.unwrap();
        let before = s.last_result().canvas.clone().unwrap();

        s.set_base_image("/no/such/file.png");
        let result = s.render(&loader()).await.unwrap();
        assert_eq!(result.status, RenderStatus::Failed);
        assert!(result.error.is_some());
        assert!(Arc::ptr_eq(result.canvas.as_ref().unwrap(), &before));
        assert!(s.export(ImageFormat::Png).is_err());
    }

    #[tokio::test]
    async fn test_drag_moves_text_and_bumps_revision() {
        let mut s = session();
        s.render(&loader()).await.unwrap();
        let rev = s.revision();

        assert_eq!(s.pointer_down(200.0, 50.0), Some(TextTarget::Area(AreaId::positional(0))));
        assert!(s.pointer_move(210.0, 60.0));
        s.pointer_up();
        assert!(!s.pointer_move(300.0, 300.0));

        let style = &s.content().item(&AreaId::positional(0)).unwrap().style;
        assert_eq!((style.offset_x, style.offset_y), (10.0, 10.0));
        assert_eq!(s.revision(), rev + 1);
        assert!(s.needs_render());
    }

    #[test]
    fn test_pointer_before_render_does_nothing() {
        let mut s = session();
        assert_eq!(s.pointer_down(200.0, 50.0), None);
    }

    #[tokio::test]
    async fn test_style_then_edit_clears_it() {
        let mut s = session();
        let loader = loader();
        s.render(&loader).await.unwrap();

        let outcome = s
            .apply_style(&LocalStyleEngine, "grayscale", 1.0, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(outcome.is_styled());
        assert!(s.is_styled());

        let result = s.render(&loader).await.unwrap();
        assert_eq!(result.status, RenderStatus::Ready);
        // Styled snapshot keeps the template geometry
        assert_eq!(result.geometry.unwrap().scale, 1.0);
        let px = result.canvas.as_ref().unwrap().get_pixel(0, 200);
        assert_eq!(px[0], px[1]);

        s.set_text(&AreaId::positional(1), "new").unwrap();
        assert!(!s.is_styled());
    }

    #[tokio::test]
    async fn test_unknown_style_leaves_session_unchanged() {
        let mut s = session();
        s.render(&loader()).await.unwrap();
        let rev = s.revision();
        let outcome = s
            .apply_style(&LocalStyleEngine, "cubism", 1.0, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!outcome.is_styled());
        assert!(!s.is_styled());
        assert_eq!(s.revision(), rev);
    }

    #[test]
    fn test_filter_changes() {
        let mut s = session();
        s.set_filters(FilterSettings::new(120.0, 100.0, 100.0));
        assert_eq!(s.revision(), 1);
        s.set_filters(FilterSettings::new(120.0, 100.0, 100.0));
        assert_eq!(s.revision(), 1);
        s.reset_filters();
        assert!(s.filters().is_identity());
        assert_eq!(s.revision(), 2);
    }
}
