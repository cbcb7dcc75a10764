use crate::error::{UiError, UiResult};
use crate::schedule::{Easing, ScheduleHandle, ScheduledItem, SchedulerHost, timeline_progress};
use crate::style::{Length, Overflow, ParsedValue, PositionType, PropertyId, Style};
use crate::ui::{Event, EventKind, ListenPhase};
use crate::view::{ElementBehavior, ElementId, LocalTransform, Panel, view_data_path};
use glam::Vec2;
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

const SCROLL_FIELD: &str = "scroll";
const ANIMATION_FRAME_MS: u64 = 16;

pub struct ScrollViewProps {
    pub width: f32,
    pub height: f32,
    /// Pixels scrolled per unit of wheel delta.
    pub wheel_step: f32,
    /// Persists the scroll offset under this key when set.
    pub view_data_key: Option<String>,
}

impl ScrollViewProps {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            wheel_step: 1.0,
            view_data_key: None,
        }
    }
}

pub struct ScrollView {
    content: ElementId,
    wheel_step: f32,
    offset: Cell<Vec2>,
    animation: Cell<Option<ScheduleHandle>>,
}

impl ScrollView {
    pub fn content(&self) -> ElementId {
        self.content
    }

    pub fn offset(&self) -> Vec2 {
        self.offset.get()
    }

    /// How far the content can move before its far edge enters the viewport.
    pub fn max_offset(&self, panel: &mut Panel, id: ElementId) -> UiResult<Vec2> {
        panel.validate()?;
        let viewport = panel.element(id)?.rect();
        let content = panel.element(self.content)?.rect();
        Ok(Vec2::new(
            (content.width - viewport.width).max(0.0),
            (content.height - viewport.height).max(0.0),
        ))
    }

    /// Clamps, applies and persists; returns whether the offset moved.
    pub fn scroll_to(&self, panel: &mut Panel, id: ElementId, offset: Vec2) -> UiResult<bool> {
        let max = self.max_offset(panel, id)?;
        let clamped = offset.clamp(Vec2::ZERO, max);
        if clamped == self.offset.get() {
            return Ok(false);
        }
        self.apply_offset(panel, id, clamped)?;
        Ok(true)
    }

    fn apply_offset(&self, panel: &mut Panel, id: ElementId, offset: Vec2) -> UiResult<()> {
        self.offset.set(offset);
        panel.set_local_transform(self.content, LocalTransform::translation(-offset.x, -offset.y))?;
        let key = panel.element(id)?.view_data_key().map(str::to_string);
        if let Some(key) = key {
            panel
                .store_mut()
                .set(&view_data_path(&key, SCROLL_FIELD), format_offset(offset));
        }
        Ok(())
    }

    fn cancel_animation(&self, panel: &mut Panel) -> UiResult<()> {
        if let Some(handle) = self.animation.take()
            && panel.scheduler().is_scheduled(handle)
        {
            panel.scheduler_mut().unschedule(handle)?;
        }
        Ok(())
    }

    fn on_wheel(&self, panel: &mut Panel, id: ElementId, event: &mut Event) -> UiResult<()> {
        let delta = event.pointer.wheel_delta * self.wheel_step;
        if delta == Vec2::ZERO {
            return Ok(());
        }
        self.cancel_animation(panel)?;
        if self.scroll_to(panel, id, self.offset.get() + delta)? {
            // Nested scroll views: the innermost one that can still move wins.
            event.stop_propagation();
            event.mark_handled();
        }
        Ok(())
    }
}

impl ElementBehavior for ScrollView {
    fn type_name(&self) -> &'static str {
        "ScrollView"
    }

    fn on_attach(&self, panel: &mut Panel, id: ElementId) -> UiResult<()> {
        let Some(key) = panel.element(id)?.view_data_key().map(str::to_string) else {
            return Ok(());
        };
        let stored = panel.store().get(&view_data_path(&key, SCROLL_FIELD));
        match stored.as_deref().map(parse_offset) {
            Some(Some(offset)) => self.apply_offset(panel, id, offset),
            Some(None) => {
                tracing::warn!(key = %key, "ignoring malformed stored scroll offset");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn on_detach(&self, panel: &mut Panel, _id: ElementId) {
        if let Err(err) = self.cancel_animation(panel) {
            tracing::warn!(%err, "failed to cancel scroll animation");
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A clipped viewport whose logical children live in a translated content container.
pub fn build_scroll_view(panel: &mut Panel, props: ScrollViewProps) -> UiResult<ElementId> {
    let root = panel.create_element()?;
    panel.set_name(root, "scroll-view")?;
    panel.apply_style(
        root,
        Style::new()
            .with_size(props.width, props.height)
            .with_overflow(Overflow::Hidden),
    )?;
    panel.set_view_data_key(root, props.view_data_key.as_deref())?;

    let content = panel.create_element()?;
    panel.set_name(content, "scroll-content")?;
    panel.apply_style(content, scroll_content_style(props.width))?;
    panel.hierarchy_add(root, content)?;
    panel.set_content_container(root, content)?;

    panel.register_callback(root, EventKind::Wheel, ListenPhase::BubbleUp, move |event, panel| {
        let Some(behavior) = scroll_view_behavior(panel, root) else {
            return Ok(());
        };
        with_scroll_view(&behavior, |view| view.on_wheel(panel, root, event))
    })?;

    panel.set_behavior(
        root,
        Rc::new(ScrollView {
            content,
            wheel_step: props.wheel_step,
            offset: Cell::new(Vec2::ZERO),
            animation: Cell::new(None),
        }),
    )?;
    Ok(root)
}

pub fn scroll_offset(panel: &Panel, id: ElementId) -> Option<Vec2> {
    panel
        .get(id)?
        .behavior_as::<ScrollView>()
        .map(ScrollView::offset)
}

pub fn set_scroll_offset(panel: &mut Panel, id: ElementId, offset: Vec2) -> UiResult<bool> {
    let behavior = require_scroll_view(panel, id)?;
    with_scroll_view(&behavior, |view| {
        view.cancel_animation(panel)?;
        view.scroll_to(panel, id, offset)
    })
}

/// Eases the offset to `target` over `duration_ms` of scheduler time.
pub fn scroll_to_animated(
    panel: &mut Panel,
    id: ElementId,
    target: Vec2,
    duration_ms: u64,
    easing: Easing,
) -> UiResult<ScheduleHandle> {
    let behavior = require_scroll_view(panel, id)?;
    let (from, to) = with_scroll_view(&behavior, |view| {
        view.cancel_animation(panel)?;
        let max = view.max_offset(panel, id)?;
        Ok((view.offset(), target.clamp(Vec2::ZERO, max)))
    })?;

    let start_ms = panel.scheduler().now_ms();
    let item = ScheduledItem::new(move |panel: &mut Panel, state| {
        let Some(behavior) = scroll_view_behavior(panel, id) else {
            return Ok(());
        };
        let t = timeline_progress(start_ms, state.now_ms, duration_ms);
        let offset = Vec2::new(
            easing.interpolate(from.x, to.x, t),
            easing.interpolate(from.y, to.y, t),
        );
        with_scroll_view(&behavior, |view| view.scroll_to(panel, id, offset).map(|_| ()))
    })
    .every(ANIMATION_FRAME_MS)
    .for_duration(duration_ms);
    let handle = panel.scheduler_mut().schedule(item)?;
    with_scroll_view(&behavior, |view| {
        view.animation.set(Some(handle));
        Ok(())
    })?;
    Ok(handle)
}

/// Pinned to the top-left corner and as tall as its children.
fn scroll_content_style(width: f32) -> Style {
    Style::new()
        .with(PropertyId::Position, ParsedValue::Position(PositionType::Absolute))
        .with(PropertyId::Left, ParsedValue::Length(Length::px(0.0)))
        .with(PropertyId::Top, ParsedValue::Length(Length::px(0.0)))
        .with(PropertyId::Width, ParsedValue::Length(Length::px(width)))
}

fn scroll_view_behavior(panel: &Panel, id: ElementId) -> Option<Rc<dyn ElementBehavior>> {
    panel
        .get(id)?
        .behavior()
        .filter(|behavior| behavior.as_any().is::<ScrollView>())
        .cloned()
}

fn require_scroll_view(panel: &Panel, id: ElementId) -> UiResult<Rc<dyn ElementBehavior>> {
    panel.element(id)?;
    scroll_view_behavior(panel, id).ok_or(UiError::UnknownElement)
}

fn with_scroll_view<T>(
    behavior: &Rc<dyn ElementBehavior>,
    f: impl FnOnce(&ScrollView) -> UiResult<T>,
) -> UiResult<T> {
    match behavior.as_any().downcast_ref::<ScrollView>() {
        Some(view) => f(view),
        None => Err(UiError::UnknownElement),
    }
}

fn format_offset(offset: Vec2) -> String {
    format!("{},{}", offset.x, offset.y)
}

fn parse_offset(raw: &str) -> Option<Vec2> {
    let (x, y) = raw.split_once(',')?;
    Some(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelSettings;
    use crate::schedule::ManualTimeSource;
    use crate::ui::InputRecord;
    use crate::view::{MemoryStore, TaffyLayoutEngine};

    fn panel(clock: &ManualTimeSource) -> Panel {
        Panel::with_parts(
            PanelSettings::default().with_viewport(400.0, 300.0),
            Box::new(TaffyLayoutEngine::new()),
            Box::new(clock.clone()),
        )
        .expect("panel")
    }

    /// A 100x100 view over ten 40px rows: 300px of vertical overflow.
    fn scroll_view(panel: &mut Panel, key: Option<&str>) -> ElementId {
        let mut props = ScrollViewProps::new(100.0, 100.0);
        props.view_data_key = key.map(str::to_string);
        let view = build_scroll_view(panel, props).expect("scroll view");
        for _ in 0..10 {
            let row = panel.create_element().expect("row");
            panel
                .apply_style(row, Style::new().with_size(100.0, 40.0))
                .expect("row style");
            panel.add(view, row).expect("row add");
        }
        let root = panel.root();
        panel.add(root, view).expect("add");
        view
    }

    #[test]
    fn logical_children_land_in_the_content() {
        let clock = ManualTimeSource::new(0);
        let mut panel = panel(&clock);
        let view = scroll_view(&mut panel, None);
        let content = panel
            .element(view)
            .expect("view")
            .behavior_as::<ScrollView>()
            .map(ScrollView::content)
            .expect("content");
        assert_eq!(panel.logical_children(view).len(), 10);
        assert_eq!(panel.element(view).expect("view").children(), &[content]);
        assert_eq!(panel.element(content).expect("content").child_count(), 10);
    }

    #[test]
    fn wheel_scrolls_and_clamps() {
        let clock = ManualTimeSource::new(0);
        let mut panel = panel(&clock);
        let view = scroll_view(&mut panel, None);

        let handled = panel
            .send_input(InputRecord::wheel(50.0, 50.0, 0.0, 120.0))
            .expect("wheel");
        assert!(handled);
        assert_eq!(scroll_offset(&panel, view), Some(Vec2::new(0.0, 120.0)));

        // The row under the pointer moved with the content.
        let picked = panel.pick(Vec2::new(50.0, 50.0)).expect("row");
        let content = panel.element(view).expect("view").children()[0];
        assert_eq!(panel.element(content).expect("content").children()[4], picked);

        panel
            .send_input(InputRecord::wheel(50.0, 50.0, 0.0, 1000.0))
            .expect("wheel");
        assert_eq!(scroll_offset(&panel, view), Some(Vec2::new(0.0, 300.0)));

        panel
            .send_input(InputRecord::wheel(50.0, 50.0, 0.0, -1000.0))
            .expect("wheel");
        assert_eq!(scroll_offset(&panel, view), Some(Vec2::ZERO));
    }

    #[test]
    fn offset_survives_a_rebuild_through_the_store() {
        let clock = ManualTimeSource::new(0);
        let mut panel = panel(&clock).with_store(MemoryStore::new());
        let view = scroll_view(&mut panel, Some("inbox"));
        set_scroll_offset(&mut panel, view, Vec2::new(0.0, 80.0)).expect("scroll");
        assert_eq!(panel.store().get("inbox/scroll").as_deref(), Some("0,80"));

        panel.destroy(view).expect("destroy");
        let rebuilt = scroll_view(&mut panel, Some("inbox"));
        assert_eq!(scroll_offset(&panel, rebuilt), Some(Vec2::new(0.0, 80.0)));
        let content = panel.element(rebuilt).expect("view").children()[0];
        assert_eq!(
            panel
                .element(content)
                .expect("content")
                .local_transform()
                .translation,
            Vec2::new(0.0, -80.0)
        );
    }

    #[test]
    fn animated_scroll_eases_to_the_target() {
        let clock = ManualTimeSource::new(1_000);
        let mut panel = panel(&clock);
        let view = scroll_view(&mut panel, None);

        let handle = scroll_to_animated(&mut panel, view, Vec2::new(0.0, 200.0), 100, Easing::Linear)
            .expect("animate");
        panel.tick().expect("tick");
        assert_eq!(scroll_offset(&panel, view), Some(Vec2::ZERO));

        clock.advance(50);
        panel.tick().expect("tick");
        assert_eq!(scroll_offset(&panel, view), Some(Vec2::new(0.0, 100.0)));

        clock.advance(50);
        panel.tick().expect("tick");
        assert_eq!(scroll_offset(&panel, view), Some(Vec2::new(0.0, 200.0)));
        assert!(!panel.scheduler().is_scheduled(handle));
    }

    #[test]
    fn wheel_interrupts_an_animation() {
        let clock = ManualTimeSource::new(0);
        let mut panel = panel(&clock);
        let view = scroll_view(&mut panel, None);
        let handle = scroll_to_animated(&mut panel, view, Vec2::new(0.0, 300.0), 100, Easing::EaseOut)
            .expect("animate");
        panel
            .send_input(InputRecord::wheel(50.0, 50.0, 0.0, 10.0))
            .expect("wheel");
        assert!(!panel.scheduler().is_scheduled(handle));
        assert_eq!(scroll_offset(&panel, view), Some(Vec2::new(0.0, 10.0)));
    }
}
