//! # Drag Repositioning
//!
//! Pointer input moves text anchors. A press over an anchor starts a drag;
//! every move adds the delta since the previous pointer position to the
//! item's offset, so the item tracks the pointer exactly with no snapping.
//!
//! The controller never draws. It mutates [`TextContent`] and the next
//! render pass picks the change up.

use crate::config::TextConfig;
use crate::geometry::CanvasGeometry;
use crate::render::layout::{free_anchor, place_area};
use crate::template::{SourceKind, TextArea, TextContent, TextTarget};

/// Hit box half-extent check: `point` within a `size`-wide square at `center`.
#[inline]
fn within(point: (f32, f32), center: (f32, f32), size: f32) -> bool {
    let half = size / 2.0;
    (point.0 - center.0).abs() <= half && (point.1 - center.1).abs() <= half
}

/// Find the text item under a canvas point.
///
/// Area items are tested first, in area order, with a square hit box of
/// `max(floor, min(mapped width, mapped height))` around the current anchor.
/// Freeform items follow, newest on top, with `max(free floor, 2 × font size)`.
pub fn hit_test(
    x: f32,
    y: f32,
    areas: &[TextArea],
    content: &TextContent,
    geometry: CanvasGeometry,
    source: SourceKind,
    text: &TextConfig,
) -> Option<TextTarget> {
    for area in areas {
        let Some(item) = content.item(&area.id) else {
            continue;
        };
        let Some((rect, anchor)) = place_area(area, &item.style, geometry, source) else {
            continue;
        };
        let size = rect.width.min(rect.height).max(text.hit_box_floor);
        if within((x, y), anchor, size) {
            return Some(TextTarget::Area(area.id.clone()));
        }
    }

    content
        .free()
        .iter()
        .rev()
        .find(|free| {
            let size = (2.0 * free.style.font_size).max(text.free_hit_box_floor);
            within((x, y), free_anchor(free), size)
        })
        .map(|free| TextTarget::Free(free.id))
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveDrag {
    target: TextTarget,
    last: (f32, f32),
}

/// Press/move/release state machine for one pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragController {
    active: Option<ActiveDrag>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin dragging `target` from pointer position (`x`, `y`).
    pub fn press(&mut self, target: TextTarget, x: f32, y: f32) {
        tracing::debug!(target = %target, x, y, "drag start");
        self.active = Some(ActiveDrag { target, last: (x, y) });
    }

    /// Hit-test and press in one step. Returns the grabbed item, if any.
    #[allow(clippy::too_many_arguments)]
    pub fn press_at(
        &mut self,
        x: f32,
        y: f32,
        areas: &[TextArea],
        content: &TextContent,
        geometry: CanvasGeometry,
        source: SourceKind,
        text: &TextConfig,
    ) -> Option<TextTarget> {
        let target = hit_test(x, y, areas, content, geometry, source, text)?;
        self.press(target.clone(), x, y);
        Some(target)
    }

    /// Apply the movement since the last position. Returns the delta applied,
    /// or `None` when no drag is active or the item no longer exists.
    pub fn move_to(&mut self, x: f32, y: f32, content: &mut TextContent) -> Option<(f32, f32)> {
        let drag = self.active.as_mut()?;
        let (dx, dy) = (x - drag.last.0, y - drag.last.1);
        drag.last = (x, y);

        match &drag.target {
            TextTarget::Area(id) => {
                let item = content.item_mut(id)?;
                item.style.offset_x += dx;
                item.style.offset_y += dy;
            }
            TextTarget::Free(id) => {
                let free = content.free_mut(*id)?;
                free.x += dx;
                free.y += dy;
            }
        }
        Some((dx, dy))
    }

    /// End the drag (pointer up).
    pub fn release(&mut self) -> Option<TextTarget> {
        let drag = self.active.take()?;
        tracing::debug!(target = %drag.target, "drag end");
        Some(drag.target)
    }

    /// End the drag because the pointer left the canvas.
    pub fn leave(&mut self) -> Option<TextTarget> {
        self.release()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{AreaId, Template, TextStyle};
    use pretty_assertions::assert_eq;

    fn setup() -> (Template, TextContent, CanvasGeometry) {
        let template = Template::with_source(
            "t",
            "mem.png",
            vec![
                TextArea::new(0.0, 0.0, 400.0, 100.0).with_default_text("TOP"),
                TextArea::new(0.0, 300.0, 400.0, 100.0).with_default_text("BOTTOM"),
            ],
            SourceKind::Native,
        );
        let content = TextContent::for_template(&template);
        let geometry = CanvasGeometry {
            width: 400,
            height: 400,
            scale: 1.0,
        };
        (template, content, geometry)
    }

    #[test]
    fn test_incremental_accumulation() {
        let (_, mut content, _) = setup();
        let id = AreaId::positional(0);
        let mut drag = DragController::new();
        drag.press(TextTarget::Area(id.clone()), 0.0, 0.0);
        for x in [3.0, 4.0, -2.0] {
            drag.move_to(x, 0.0, &mut content);
        }
        // Net delta equals final minus start, whatever the path
        assert_eq!(content.item(&id).unwrap().style.offset_x, -2.0);

        let mut content2 = setup().1;
        let mut drag = DragController::new();
        drag.press(TextTarget::Area(id.clone()), 0.0, 0.0);
        drag.move_to(3.0, 0.0, &mut content2);
        drag.press(TextTarget::Area(id.clone()), 3.0, 0.0);
        drag.move_to(7.0, 0.0, &mut content2);
        drag.press(TextTarget::Area(id.clone()), 7.0, 0.0);
        drag.move_to(5.0, 0.0, &mut content2);
        assert_eq!(content2.item(&id).unwrap().style.offset_x, 5.0);
    }

    #[test]
    fn test_relative_moves_sum() {
        // Moves of (3,0), (4,0), (-2,0) from the press point add to +5
        let (_, mut content, _) = setup();
        let id = AreaId::positional(1);
        let mut drag = DragController::new();
        drag.press(TextTarget::Area(id.clone()), 10.0, 10.0);
        let mut pos = (10.0, 10.0);
        for (dx, dy) in [(3.0, 0.0), (4.0, 0.0), (-2.0, 0.0)] {
            pos = (pos.0 + dx, pos.1 + dy);
            assert_eq!(drag.move_to(pos.0, pos.1, &mut content), Some((dx, dy)));
        }
        let style = &content.item(&id).unwrap().style;
        assert_eq!((style.offset_x, style.offset_y), (5.0, 0.0));
    }

    #[test]
    fn test_hit_test_areas_in_order() {
        let (template, content, geometry) = setup();
        let cfg = TextConfig::default();
        let hit = |x, y| hit_test(x, y, &template.text_areas, &content, geometry, template.source, &cfg);
        // Anchors are (200, 50) and (200, 350); hit box is 100 wide
        assert_eq!(hit(200.0, 50.0), Some(TextTarget::Area(AreaId::positional(0))));
        assert_eq!(hit(249.0, 99.0), Some(TextTarget::Area(AreaId::positional(0))));
        assert_eq!(hit(200.0, 350.0), Some(TextTarget::Area(AreaId::positional(1))));
        assert_eq!(hit(200.0, 200.0), None);
        assert_eq!(hit(10.0, 50.0), None);
    }

    #[test]
    fn test_hit_box_floor() {
        let template = Template::with_source("t", "m.png", vec![TextArea::new(100.0, 100.0, 10.0, 10.0)], SourceKind::Native);
        let content = TextContent::for_template(&template);
        let geometry = CanvasGeometry {
            width: 400,
            height: 400,
            scale: 1.0,
        };
        let cfg = TextConfig::default();
        // Anchor (105, 105); floor 50 makes the box reach 25 px each way
        let hit = hit_test(129.0, 81.0, &template.text_areas, &content, geometry, template.source, &cfg);
        assert!(hit.is_some());
        let miss = hit_test(131.0, 105.0, &template.text_areas, &content, geometry, template.source, &cfg);
        assert!(miss.is_none());
    }

    #[test]
    fn test_hit_follows_offset() {
        let (template, mut content, geometry) = setup();
        let cfg = TextConfig::default();
        content.item_mut(&AreaId::positional(0)).unwrap().style.offset_y = 150.0;
        // Anchor moved from (200, 50) to (200, 200)
        let hit = hit_test(200.0, 200.0, &template.text_areas, &content, geometry, template.source, &cfg);
        assert_eq!(hit, Some(TextTarget::Area(AreaId::positional(0))));
    }

    #[test]
    fn test_free_text_drag() {
        let mut content = TextContent::new();
        let id = content.add_free("caption", 100.0, 100.0, TextStyle::caption());
        let cfg = TextConfig::default();
        let geometry = CanvasGeometry {
            width: 800,
            height: 800,
            scale: 1.0,
        };

        let mut drag = DragController::new();
        // Free hit box is max(100, 48) = 100
        assert_eq!(drag.press_at(149.0, 60.0, &[], &content, geometry, SourceKind::Native, &cfg), Some(TextTarget::Free(id)));
        drag.move_to(159.0, 80.0, &mut content);
        assert_eq!(drag.release(), Some(TextTarget::Free(id)));
        assert_eq!((content.free()[0].x, content.free()[0].y), (110.0, 120.0));

        // After release, moves do nothing
        assert_eq!(drag.move_to(500.0, 500.0, &mut content), None);
        assert_eq!(content.free()[0].x, 110.0);
    }

    #[test]
    fn test_leave_ends_drag() {
        let mut drag = DragController::new();
        drag.press(TextTarget::Area(AreaId::positional(0)), 0.0, 0.0);
        assert!(drag.is_dragging());
        assert!(drag.leave().is_some());
        assert!(!drag.is_dragging());
        assert!(drag.leave().is_none());
    }
}
