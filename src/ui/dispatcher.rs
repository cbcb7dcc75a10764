use crate::error::{UiError, UiResult};
use crate::ui::{
    Event, EventKind, FocusDirection, InputRecord, KeyCode, ListenPhase, PropagationPhase,
};
use crate::view::{ElementId, Panel, PseudoStates};
use glam::Vec2;

/// Pointer bookkeeping that outlives a single dispatch.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    pub(crate) capture: Option<ElementId>,
    pub(crate) element_under_pointer: Option<ElementId>,
    /// Hovered elements below the root, topmost first.
    pub(crate) hover_chain: Vec<ElementId>,
    pub(crate) pointer_down_target: Option<ElementId>,
    pub(crate) pointer_down_click_count: u32,
}

impl EventDispatcher {
    pub fn capture_holder(&self) -> Option<ElementId> {
        self.capture
    }

    pub fn element_under_pointer(&self) -> Option<ElementId> {
        self.element_under_pointer
    }

    /// Drops remembered references to an element leaving the panel. Capture
    /// is kept so the next captured dispatch releases it loudly. Hover falls
    /// back to the nearest hovered ancestor still remembered.
    pub(crate) fn forget(&mut self, id: ElementId) {
        self.hover_chain.retain(|hovered| *hovered != id);
        if self.element_under_pointer == Some(id) {
            self.element_under_pointer = self.hover_chain.first().copied();
        }
        if self.pointer_down_target == Some(id) {
            self.pointer_down_target = None;
        }
    }
}

impl Panel {
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Routes `event` through capture, target, bubble and default-action phases.
    ///
    /// Handlers may mutate the panel and dispatch other events; dispatching an
    /// event that is already in flight is an error.
    pub fn dispatch(&mut self, event: &mut Event) -> UiResult<()> {
        if event.is_dispatching() {
            return Err(UiError::EventAlreadyDispatching);
        }
        event.set_dispatching(true);
        let result = self.dispatch_inner(event);
        event.set_dispatching(false);
        event.set_phase(PropagationPhase::None);
        event.set_current_target(None);
        result
    }

    /// Wraps a raw platform record into a pooled event and dispatches it.
    /// Returns whether anything handled it.
    pub fn send_input(&mut self, record: InputRecord) -> UiResult<bool> {
        let mut event = self.event_pool.acquire(record.event_kind());
        event.fill_from_input(&record);
        self.dispatch(&mut event)?;
        Ok(event.is_handled())
    }

    fn dispatch_inner(&mut self, event: &mut Event) -> UiResult<()> {
        let kind = event.kind();
        let captured = (kind.is_pointer() && !kind.is_enter_leave())
            || kind.is_native_command()
            || kind == EventKind::Passthrough;
        if captured && let Some(holder) = self.dispatcher.capture {
            if self.tree.is_in_panel(holder) {
                event.set_target(Some(holder));
                self.invoke_target(holder, event)?;
                self.run_default_action(Some(holder), event)?;
                return self.after_dispatch(Some(holder), event);
            }
            tracing::warn!(?holder, ?kind, "pointer capture holder left the panel; releasing capture");
            self.force_release_capture(holder)?;
        }

        let target = self.resolve_target(event);
        event.set_target(target);
        match target {
            Some(target) => {
                self.tree.element(target)?;
                self.propagate(target, event)?;
            }
            None if kind.is_enter_leave() => return Ok(()),
            None => {}
        }
        self.run_default_action(target, event)?;
        self.after_dispatch(target, event)
    }

    fn resolve_target(&mut self, event: &Event) -> Option<ElementId> {
        let kind = event.kind();
        if let Some(target) = event.target() {
            return Some(target);
        }
        let root = self.tree.root();
        match kind {
            _ if kind.is_keyboard() => Some(self.focus.focused.unwrap_or(root)),
            _ if kind.is_enter_leave() => None,
            _ if kind.is_pointer() || kind.is_drag() => self.pick(event.pointer.position),
            EventKind::ValidateCommand | EventKind::ExecuteCommand => {
                Some(self.focus.focused.unwrap_or(root))
            }
            EventKind::Passthrough => {
                let picked = event
                    .input
                    .as_ref()
                    .and_then(InputRecord::position)
                    .and_then(|position| self.pick(position));
                Some(picked.or(self.focus.focused).unwrap_or(root))
            }
            _ => None,
        }
    }

    fn propagate(&mut self, target: ElementId, event: &mut Event) -> UiResult<()> {
        let kind = event.kind();
        let path = self.tree.ancestors(target);
        let capture: Vec<ElementId> = path
            .iter()
            .rev()
            .copied()
            .filter(|id| self.listens(*id, kind, ListenPhase::TrickleDown))
            .collect();
        let bubble: Vec<ElementId> = path
            .iter()
            .copied()
            .filter(|id| self.listens(*id, kind, ListenPhase::BubbleUp))
            .collect();

        if event.capturable() {
            event.set_phase(PropagationPhase::Capture);
            for id in capture {
                self.invoke(id, ListenPhase::TrickleDown, event)?;
                if event.is_propagation_stopped() {
                    return Ok(());
                }
            }
        }

        self.invoke_target(target, event)?;
        if event.is_propagation_stopped() || !event.bubbles() {
            return Ok(());
        }

        event.set_phase(PropagationPhase::BubbleUp);
        for id in bubble {
            self.invoke(id, ListenPhase::BubbleUp, event)?;
            if event.is_propagation_stopped() {
                break;
            }
        }
        Ok(())
    }

    fn listens(&self, id: ElementId, kind: EventKind, phase: ListenPhase) -> bool {
        self.tree
            .get(id)
            .is_some_and(|element| element.listeners.has(kind, phase))
    }

    /// Both phases' handlers run on the target itself, trickle-down first.
    fn invoke_target(&mut self, target: ElementId, event: &mut Event) -> UiResult<()> {
        event.set_phase(PropagationPhase::AtTarget);
        self.invoke(target, ListenPhase::TrickleDown, event)?;
        if !event.is_immediate_propagation_stopped() {
            self.invoke(target, ListenPhase::BubbleUp, event)?;
        }
        Ok(())
    }

    fn invoke(&mut self, id: ElementId, phase: ListenPhase, event: &mut Event) -> UiResult<()> {
        let Some(element) = self.tree.get(id) else {
            return Ok(());
        };
        let callbacks = element.listeners.collect(event.kind(), phase);
        if callbacks.is_empty() {
            return Ok(());
        }
        event.set_current_target(Some(id));
        if self.settings.trace_dispatch {
            tracing::trace!(kind = ?event.kind(), phase = ?event.phase(), current = ?id, "dispatch");
        }
        for callback in callbacks {
            if event.is_immediate_propagation_stopped() {
                break;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => callback(event, self)?,
                Err(_) => tracing::warn!(?id, kind = ?event.kind(), "listener re-entered; skipping"),
            }
        }
        Ok(())
    }

    /// Runs unless the default was prevented; propagation stops do not suppress it.
    fn run_default_action(&mut self, target: Option<ElementId>, event: &mut Event) -> UiResult<()> {
        if event.is_default_prevented() {
            return Ok(());
        }
        event.set_phase(PropagationPhase::DefaultAction);
        event.set_current_target(target);
        if self.settings.trace_dispatch {
            tracing::trace!(kind = ?event.kind(), ?target, "default action");
        }

        match event.kind() {
            EventKind::PointerDown => {
                let focus = target.and_then(|target| {
                    std::iter::once(target)
                        .chain(self.tree.ancestors(target))
                        .find(|id| self.is_focusable(*id))
                });
                self.switch_focus(focus, FocusDirection::Pointer)?;
            }
            EventKind::KeyDown if event.key.code == KeyCode::Tab => {
                if event.key.modifiers.shift {
                    self.focus_previous()?;
                } else {
                    self.focus_next()?;
                }
                event.mark_handled();
            }
            _ => {}
        }

        let Some(target) = target else {
            return Ok(());
        };
        let Some(behavior) = self.tree.get(target).and_then(|element| element.behavior.clone())
        else {
            return Ok(());
        };
        if event.kind() == EventKind::Passthrough
            && let Some(input) = event.input.clone()
            && behavior.on_input(self, target, &input)?
        {
            event.mark_handled();
        }
        behavior.default_action(self, target, event)
    }

    fn after_dispatch(&mut self, target: Option<ElementId>, event: &Event) -> UiResult<()> {
        match event.kind() {
            EventKind::PointerMove if self.dispatcher.capture.is_none() => {
                self.update_hover(target, event.pointer.position)
            }
            EventKind::PointerDown => {
                self.dispatcher.pointer_down_target = target;
                self.dispatcher.pointer_down_click_count = event.pointer.click_count;
                match target {
                    Some(target) => self.set_pseudo_state(target, PseudoStates::ACTIVE, true),
                    None => Ok(()),
                }
            }
            EventKind::PointerUp => {
                let Some(down) = self.dispatcher.pointer_down_target.take() else {
                    return Ok(());
                };
                if !self.tree.contains(down) {
                    return Ok(());
                }
                self.set_pseudo_state(down, PseudoStates::ACTIVE, false)?;
                let clicked = target
                    .is_some_and(|target| target == down || self.tree.is_ancestor_of(down, target));
                if !clicked {
                    return Ok(());
                }
                let mut click = self.event_pool.acquire(EventKind::Click);
                click.pointer = event.pointer;
                click.pointer.click_count = self.dispatcher.pointer_down_click_count;
                click.set_target(Some(down));
                self.dispatch(&mut click)
            }
            _ => Ok(()),
        }
    }

    /// Diffs the topmost element under the pointer: leave, enter, out, over.
    fn update_hover(&mut self, picked: Option<ElementId>, position: Vec2) -> UiResult<()> {
        let root = self.tree.root();
        let new_top = picked.filter(|id| *id != root);
        let old_top = self
            .dispatcher
            .element_under_pointer
            .filter(|id| self.tree.is_in_panel(*id));
        if old_top == new_top {
            return Ok(());
        }
        let old_chain: Vec<ElementId> = std::mem::take(&mut self.dispatcher.hover_chain)
            .into_iter()
            .filter(|id| self.tree.is_in_panel(*id))
            .collect();
        let new_chain = self.hover_chain(new_top);
        self.dispatcher.element_under_pointer = new_top;
        self.dispatcher.hover_chain = new_chain.clone();
        let leaving: Vec<ElementId> = old_chain
            .iter()
            .filter(|id| !new_chain.contains(id))
            .copied()
            .collect();
        let entering: Vec<ElementId> = new_chain
            .iter()
            .rev()
            .filter(|id| !old_chain.contains(id))
            .copied()
            .collect();

        for id in leaving {
            self.set_pseudo_state(id, PseudoStates::HOVER, false)?;
            self.send_hover_event(EventKind::PointerLeave, id, new_top, position)?;
        }
        for id in entering {
            self.set_pseudo_state(id, PseudoStates::HOVER, true)?;
            self.send_hover_event(EventKind::PointerEnter, id, old_top, position)?;
        }
        if let Some(old) = old_top {
            self.send_hover_event(EventKind::PointerOut, old, new_top, position)?;
        }
        if let Some(new) = new_top {
            self.send_hover_event(EventKind::PointerOver, new, old_top, position)?;
        }
        Ok(())
    }

    /// `top` and its ancestors below the root.
    fn hover_chain(&self, top: Option<ElementId>) -> Vec<ElementId> {
        let Some(top) = top else {
            return Vec::new();
        };
        let root = self.tree.root();
        std::iter::once(top)
            .chain(self.tree.ancestors(top))
            .filter(|id| *id != root)
            .collect()
    }

    fn send_hover_event(
        &mut self,
        kind: EventKind,
        target: ElementId,
        related: Option<ElementId>,
        position: Vec2,
    ) -> UiResult<()> {
        if !self.tree.contains(target) {
            return Ok(());
        }
        let mut event = self.event_pool.acquire(kind);
        event.pointer.position = position;
        event.set_target(Some(target));
        event.set_related_target(related);
        self.dispatch(&mut event)
    }

    /// Routes every pointer and native command event to `id` until released.
    /// The previous holder hears PointerCaptureOut before the slot changes.
    pub fn capture_pointer(&mut self, id: ElementId) -> UiResult<()> {
        if !self.tree.element(id)?.in_panel() {
            return Err(UiError::NotInPanel);
        }
        let previous = self.dispatcher.capture;
        if previous == Some(id) {
            return Ok(());
        }
        if let Some(previous) = previous {
            let mut out = Event::new(EventKind::PointerCaptureOut)
                .with_target(previous)
                .with_related_target(Some(id));
            self.dispatch(&mut out)?;
        }
        self.dispatcher.capture = Some(id);
        tracing::debug!(?id, ?previous, "pointer captured");
        let mut captured = Event::new(EventKind::PointerCapture)
            .with_target(id)
            .with_related_target(previous);
        self.dispatch(&mut captured)
    }

    /// Returns whether `id` held the capture.
    pub fn release_pointer(&mut self, id: ElementId) -> UiResult<bool> {
        if self.dispatcher.capture != Some(id) {
            return Ok(false);
        }
        self.dispatcher.capture = None;
        tracing::debug!(?id, "pointer released");
        if self.tree.contains(id) {
            let mut out = Event::new(EventKind::PointerCaptureOut).with_target(id);
            self.dispatch(&mut out)?;
        }
        Ok(true)
    }

    pub fn has_pointer_capture(&self, id: ElementId) -> bool {
        self.dispatcher.capture == Some(id)
    }

    fn force_release_capture(&mut self, holder: ElementId) -> UiResult<()> {
        self.dispatcher.capture = None;
        if !self.tree.contains(holder) {
            return Ok(());
        }
        let mut lost = Event::new(EventKind::PointerCaptureOut).with_target(holder);
        self.dispatch(&mut lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelSettings;
    use crate::schedule::ManualTimeSource;
    use crate::style::{Overflow, Style};
    use crate::ui::{KeyModifiers, MouseButton};
    use crate::view::{ElementBehavior, PickingMode, Rect, TaffyLayoutEngine};
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tracing_test::traced_test;

    type Log = Rc<RefCell<Vec<String>>>;

    fn panel() -> Panel {
        Panel::with_parts(
            PanelSettings::default().with_viewport(400.0, 300.0),
            Box::new(TaffyLayoutEngine::new()),
            Box::new(ManualTimeSource::new(0)),
        )
        .expect("panel")
    }

    fn placed(panel: &mut Panel, parent: ElementId, rect: Rect) -> ElementId {
        let id = panel.create_element().expect("create");
        panel.add(parent, id).expect("add");
        panel.set_rect(id, rect).expect("rect");
        id
    }

    fn record(panel: &mut Panel, id: ElementId, kind: EventKind, phase: ListenPhase, label: &str, log: &Log) {
        let log = log.clone();
        let label = label.to_string();
        panel
            .register_callback(id, kind, phase, move |_, _| {
                log.borrow_mut().push(label.clone());
                Ok(())
            })
            .expect("listener");
    }

    /// Root → container (clips, 0,0,100,100) → button (20,20,30,30).
    fn scenario() -> (Panel, ElementId, ElementId) {
        let mut panel = panel();
        let root = panel.root();
        let container = placed(&mut panel, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        panel
            .apply_style(container, Style::new().with_overflow(Overflow::Hidden))
            .expect("clip");
        let button = placed(&mut panel, container, Rect::new(20.0, 20.0, 30.0, 30.0));
        (panel, container, button)
    }

    struct ClickCounter {
        log: Log,
    }

    impl ElementBehavior for ClickCounter {
        fn type_name(&self) -> &'static str {
            "ClickCounter"
        }

        fn default_action(&self, _panel: &mut Panel, _id: ElementId, event: &mut Event) -> UiResult<()> {
            if event.kind() == EventKind::Click {
                self.log.borrow_mut().push("button default".to_string());
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn phases_run_in_order() {
        let (mut panel, container, button) = scenario();
        let root = panel.root();
        let log = Log::default();
        for (id, name) in [(root, "A"), (container, "B")] {
            record(&mut panel, id, EventKind::Click, ListenPhase::TrickleDown, &format!("{name}-capture"), &log);
            record(&mut panel, id, EventKind::Click, ListenPhase::BubbleUp, &format!("{name}-bubble"), &log);
        }
        record(&mut panel, button, EventKind::Click, ListenPhase::BubbleUp, "T-target", &log);

        let mut click = Event::new(EventKind::Click).with_target(button);
        panel.dispatch(&mut click).expect("dispatch");
        assert_eq!(
            *log.borrow(),
            vec!["A-capture", "B-capture", "T-target", "B-bubble", "A-bubble"]
        );
        assert_eq!(click.phase(), PropagationPhase::None);
        assert!(!click.is_dispatching());
    }

    #[test]
    fn stop_in_capture_skips_target_and_bubble() {
        let (mut panel, container, button) = scenario();
        let log = Log::default();
        panel
            .register_callback(container, EventKind::Click, ListenPhase::TrickleDown, |event, _| {
                event.stop_propagation();
                Ok(())
            })
            .expect("listener");
        record(&mut panel, button, EventKind::Click, ListenPhase::BubbleUp, "T-target", &log);
        record(&mut panel, container, EventKind::Click, ListenPhase::BubbleUp, "B-bubble", &log);

        let mut click = Event::new(EventKind::Click).with_target(button);
        panel.dispatch(&mut click).expect("dispatch");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn stop_propagation_keeps_default_action() {
        let (mut panel, container, button) = scenario();
        let log = Log::default();
        panel
            .set_behavior(button, Rc::new(ClickCounter { log: log.clone() }))
            .expect("behavior");
        panel
            .register_callback(button, EventKind::Click, ListenPhase::BubbleUp, |event, _| {
                event.stop_propagation();
                Ok(())
            })
            .expect("listener");
        record(&mut panel, container, EventKind::Click, ListenPhase::BubbleUp, "container bubble", &log);

        let mut click = Event::new(EventKind::Click).with_target(button);
        panel.dispatch(&mut click).expect("dispatch");
        assert_eq!(*log.borrow(), vec!["button default"]);

        log.borrow_mut().clear();
        panel
            .register_callback(button, EventKind::Click, ListenPhase::TrickleDown, |event, _| {
                event.prevent_default();
                Ok(())
            })
            .expect("listener");
        let mut click = Event::new(EventKind::Click).with_target(button);
        panel.dispatch(&mut click).expect("dispatch");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn picking_in_the_clipped_scenario() {
        let (mut panel, container, button) = scenario();
        assert_eq!(panel.pick(Vec2::new(25.0, 25.0)), Some(button));
        assert_eq!(panel.pick(Vec2::new(60.0, 60.0)), Some(container));
        panel.set_picking_mode(container, PickingMode::Ignore).expect("ignore");
        assert_eq!(panel.pick(Vec2::new(60.0, 60.0)), None);
        assert_eq!(panel.pick(Vec2::new(150.0, 150.0)), None);
    }

    #[test]
    fn moving_in_enters_from_the_outside_in() {
        let (mut panel, container, button) = scenario();
        let log = Log::default();
        for (id, name) in [(container, "Container"), (button, "Button")] {
            for (kind, verb) in [
                (EventKind::PointerEnter, "enter"),
                (EventKind::PointerLeave, "leave"),
                (EventKind::PointerOver, "over"),
                (EventKind::PointerOut, "out"),
            ] {
                record(&mut panel, id, kind, ListenPhase::TrickleDown, &format!("{verb}({name})"), &log);
            }
        }
        panel.send_input(InputRecord::pointer_move(300.0, 200.0)).expect("outside");
        assert!(log.borrow().is_empty());

        panel.send_input(InputRecord::pointer_move(25.0, 25.0)).expect("inside");
        assert_eq!(
            *log.borrow(),
            vec!["enter(Container)", "enter(Button)", "over(Button)"]
        );
        assert!(panel.element(button).expect("button").pseudo_states().contains(PseudoStates::HOVER));

        log.borrow_mut().clear();
        panel.send_input(InputRecord::pointer_move(70.0, 70.0)).expect("container");
        assert_eq!(
            *log.borrow(),
            vec!["leave(Button)", "out(Button)", "over(Container)"]
        );
        assert!(!panel.element(button).expect("button").pseudo_states().contains(PseudoStates::HOVER));
        assert!(panel.element(container).expect("container").pseudo_states().contains(PseudoStates::HOVER));
    }

    #[test]
    fn capture_routes_pointer_events_to_the_holder() {
        let (mut panel, container, button) = scenario();
        let root = panel.root();
        let other = placed(&mut panel, root, Rect::new(200.0, 0.0, 50.0, 50.0));
        let log = Log::default();
        record(&mut panel, button, EventKind::PointerMove, ListenPhase::BubbleUp, "button move", &log);
        record(&mut panel, other, EventKind::PointerMove, ListenPhase::BubbleUp, "other move", &log);
        record(&mut panel, container, EventKind::PointerMove, ListenPhase::TrickleDown, "container capture", &log);
        record(&mut panel, button, EventKind::PointerCaptureOut, ListenPhase::BubbleUp, "button lost", &log);
        record(&mut panel, other, EventKind::PointerCapture, ListenPhase::BubbleUp, "other got", &log);

        panel.capture_pointer(button).expect("capture");
        assert!(panel.has_pointer_capture(button));
        panel.send_input(InputRecord::pointer_move(220.0, 10.0)).expect("move");
        assert_eq!(*log.borrow(), vec!["button move"]);

        log.borrow_mut().clear();
        panel.capture_pointer(other).expect("steal");
        assert_eq!(*log.borrow(), vec!["button lost", "other got"]);

        log.borrow_mut().clear();
        panel.release_pointer(other).expect("release");
        panel.send_input(InputRecord::pointer_move(220.0, 10.0)).expect("move");
        assert_eq!(*log.borrow(), vec!["other move"]);
    }

    #[test]
    #[traced_test]
    fn capture_holder_leaving_the_panel_is_released() {
        let (mut panel, container, button) = scenario();
        let log = Log::default();
        record(&mut panel, button, EventKind::PointerCaptureOut, ListenPhase::BubbleUp, "lost", &log);
        record(&mut panel, button, EventKind::PointerMove, ListenPhase::BubbleUp, "button move", &log);
        panel.capture_pointer(button).expect("capture");
        panel.remove(container, button).expect("remove");

        panel.send_input(InputRecord::pointer_move(25.0, 25.0)).expect("move");
        assert_eq!(*log.borrow(), vec!["lost"]);
        assert!(!panel.has_pointer_capture(button));
        assert!(logs_contain("pointer capture holder left the panel"));
    }

    #[test]
    fn capture_also_routes_passthrough_input() {
        let (mut panel, _container, button) = scenario();
        let root = panel.root();
        let other = placed(&mut panel, root, Rect::new(200.0, 0.0, 50.0, 50.0));
        let log = Log::default();
        record(&mut panel, button, EventKind::Passthrough, ListenPhase::BubbleUp, "button", &log);
        record(&mut panel, other, EventKind::Passthrough, ListenPhase::BubbleUp, "other", &log);

        panel.capture_pointer(button).expect("capture");
        panel
            .send_input(InputRecord::Other {
                name: "custom".into(),
                position: Some(Vec2::new(220.0, 10.0)),
            })
            .expect("custom");
        assert_eq!(*log.borrow(), vec!["button"]);
    }

    #[test]
    fn removing_the_hovered_element_hands_hover_to_its_parent() {
        let (mut panel, container, button) = scenario();
        let log = Log::default();
        for (kind, verb) in [
            (EventKind::PointerEnter, "enter"),
            (EventKind::PointerLeave, "leave"),
            (EventKind::PointerOver, "over"),
            (EventKind::PointerOut, "out"),
        ] {
            record(&mut panel, container, kind, ListenPhase::TrickleDown, &format!("{verb}(Container)"), &log);
        }
        panel.send_input(InputRecord::pointer_move(25.0, 25.0)).expect("inside");
        panel.remove(container, button).expect("remove");
        assert_eq!(panel.dispatcher().element_under_pointer(), Some(container));
        assert!(panel.element(container).expect("container").pseudo_states().contains(PseudoStates::HOVER));

        log.borrow_mut().clear();
        panel.send_input(InputRecord::pointer_move(300.0, 250.0)).expect("outside");
        assert_eq!(*log.borrow(), vec!["leave(Container)", "out(Container)"]);
        assert!(!panel.element(container).expect("container").pseudo_states().contains(PseudoStates::HOVER));

        log.borrow_mut().clear();
        panel.send_input(InputRecord::pointer_move(60.0, 60.0)).expect("back");
        assert_eq!(*log.borrow(), vec!["enter(Container)", "over(Container)"]);
    }

    #[test]
    fn redispatching_an_in_flight_event_fails() {
        let (mut panel, _, button) = scenario();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        panel
            .register_callback(button, EventKind::KeyDown, ListenPhase::BubbleUp, move |event, panel| {
                *sink.borrow_mut() = Some(panel.dispatch(event));
                Ok(())
            })
            .expect("listener");
        let mut key = Event::key(EventKind::KeyDown, KeyCode::Char('a'), KeyModifiers::NONE).with_target(button);
        panel.dispatch(&mut key).expect("dispatch");
        assert_eq!(*seen.borrow(), Some(Err(UiError::EventAlreadyDispatching)));
    }

    #[test]
    fn press_and_release_synthesizes_click() {
        let (mut panel, container, button) = scenario();
        let log = Log::default();
        panel
            .register_callback(button, EventKind::Click, ListenPhase::BubbleUp, {
                let log = log.clone();
                move |event, _| {
                    log.borrow_mut().push(format!("click x{}", event.pointer.click_count));
                    Ok(())
                }
            })
            .expect("listener");

        let mut down = InputRecord::pointer_down(25.0, 25.0, MouseButton::Left);
        if let InputRecord::PointerDown { click_count, .. } = &mut down {
            *click_count = 2;
        }
        panel.send_input(down).expect("down");
        assert!(panel.element(button).expect("button").pseudo_states().contains(PseudoStates::ACTIVE));
        panel.send_input(InputRecord::pointer_up(26.0, 26.0, MouseButton::Left)).expect("up");
        assert_eq!(*log.borrow(), vec!["click x2"]);
        assert!(!panel.element(button).expect("button").pseudo_states().contains(PseudoStates::ACTIVE));

        panel.send_input(InputRecord::pointer_down(25.0, 25.0, MouseButton::Left)).expect("down");
        panel.send_input(InputRecord::pointer_up(70.0, 70.0, MouseButton::Left)).expect("up elsewhere");
        assert_eq!(log.borrow().len(), 1);
        let _ = container;
    }

    #[test]
    fn pointer_down_moves_focus() {
        let (mut panel, container, button) = scenario();
        panel.set_focusable(container, true).expect("focusable");
        panel.send_input(InputRecord::pointer_down(25.0, 25.0, MouseButton::Left)).expect("down");
        assert_eq!(panel.focused(), Some(container));

        panel.send_input(InputRecord::pointer_down(300.0, 250.0, MouseButton::Left)).expect("down outside");
        assert_eq!(panel.focused(), None);
        let _ = button;
    }
}
