use crate::config::TabOrder;
use crate::error::UiResult;
use crate::ui::{Event, EventKind};
use crate::view::{ElementId, Panel, PseudoStates};
use glam::Vec2;
use std::cmp::Ordering;

/// How focus is moving; carried by every focus event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusDirection {
    #[default]
    None,
    Next,
    Previous,
    Pointer,
}

#[derive(Debug, Default)]
pub struct FocusController {
    pub(crate) focused: Option<ElementId>,
}

impl FocusController {
    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusRingEntry {
    pub id: ElementId,
    pub tab_index: i32,
    /// Depth-first visit index.
    pub order: usize,
    /// Top-left corner in panel space.
    pub position: Vec2,
}

/// Explicit positive tab indices first, ascending; everything else by `order`.
pub fn sort_focus_ring(entries: &mut [FocusRingEntry], order: TabOrder) {
    let positional = |a: &FocusRingEntry, b: &FocusRingEntry| match order {
        TabOrder::ChildOrder => a.order.cmp(&b.order),
        TabOrder::PositionXY => a
            .position
            .x
            .total_cmp(&b.position.x)
            .then(a.position.y.total_cmp(&b.position.y))
            .then(a.order.cmp(&b.order)),
        TabOrder::PositionYX => a
            .position
            .y
            .total_cmp(&b.position.y)
            .then(a.position.x.total_cmp(&b.position.x))
            .then(a.order.cmp(&b.order)),
    };
    entries.sort_by(|a, b| match (a.tab_index > 0, b.tab_index > 0) {
        (true, true) => a
            .tab_index
            .cmp(&b.tab_index)
            .then_with(|| positional(a, b)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => positional(a, b),
    });
}

/// The neighbour of `current` in `ring`, wrapping at both ends. Without a
/// current element, forward starts at the first entry and backward at the last.
pub fn next_in_ring(ring: &[ElementId], current: Option<ElementId>, forward: bool) -> Option<ElementId> {
    let len = ring.len();
    if len == 0 {
        return None;
    }
    let index = match current.and_then(|current| ring.iter().position(|id| *id == current)) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    Some(ring[index])
}

impl Panel {
    pub fn focused(&self) -> Option<ElementId> {
        self.focus.focused
    }

    /// Enabled, displayed along its whole ancestor chain, in the panel and flagged focusable.
    pub fn is_focusable(&self, id: ElementId) -> bool {
        let Some(element) = self.tree.get(id) else {
            return false;
        };
        if !element.in_panel()
            || !element.is_focusable_flag()
            || element.pseudo_states().contains(PseudoStates::DISABLED)
        {
            return false;
        }
        std::iter::once(id)
            .chain(self.tree.ancestors(id))
            .all(|id| self.tree.get(id).is_some_and(|element| element.is_displayed()))
    }

    /// Moves focus to `next`, or clears it when `next` is `None` or not focusable.
    ///
    /// The losing element hears FocusOut before the winner hears FocusIn; the
    /// focus slot changes only after both, followed by Blur and Focus.
    pub fn switch_focus(&mut self, next: Option<ElementId>, direction: FocusDirection) -> UiResult<()> {
        let current = self.focus.focused;
        if next == current {
            return Ok(());
        }
        let next = next.filter(|id| self.is_focusable(*id));
        if next == current {
            return Ok(());
        }

        if let Some(old) = current {
            self.send_focus_event(EventKind::FocusOut, old, next, direction)?;
        }
        if let Some(new) = next {
            self.send_focus_event(EventKind::FocusIn, new, current, direction)?;
        }

        self.focus.focused = next;
        tracing::debug!(from = ?current, to = ?next, ?direction, "focus switched");
        if let Some(old) = current
            && self.tree.contains(old)
        {
            self.set_pseudo_state(old, PseudoStates::FOCUSED, false)?;
        }
        if let Some(new) = next {
            self.set_pseudo_state(new, PseudoStates::FOCUSED, true)?;
        }

        if let Some(old) = current {
            self.send_focus_event(EventKind::Blur, old, next, direction)?;
        }
        if let Some(new) = next {
            self.send_focus_event(EventKind::Focus, new, current, direction)?;
        }
        Ok(())
    }

    /// Returns whether `id` ended up focused.
    pub fn focus(&mut self, id: ElementId) -> UiResult<bool> {
        self.tree.element(id)?;
        self.switch_focus(Some(id), FocusDirection::None)?;
        Ok(self.focus.focused == Some(id))
    }

    pub fn blur(&mut self) -> UiResult<()> {
        self.switch_focus(None, FocusDirection::None)
    }

    /// Focusable elements with a non-negative tab index, in navigation order.
    pub fn focus_ring(&mut self) -> UiResult<Vec<ElementId>> {
        let order = self.settings.tab_order;
        if order != TabOrder::ChildOrder {
            self.validate()?;
        }
        let mut entries = Vec::new();
        for (index, id) in self.tree.descendants(self.tree.root()).into_iter().enumerate() {
            if !self.is_focusable(id) {
                continue;
            }
            let element = self.tree.element(id)?;
            let tab_index = element.tab_index();
            if tab_index < 0 {
                continue;
            }
            let corner = element.rect().position();
            let position = match order {
                TabOrder::ChildOrder => Vec2::ZERO,
                _ => self.tree.world_transform(id)?.transform_point2(corner),
            };
            entries.push(FocusRingEntry {
                id,
                tab_index,
                order: index,
                position,
            });
        }
        sort_focus_ring(&mut entries, order);
        Ok(entries.into_iter().map(|entry| entry.id).collect())
    }

    pub fn focus_next(&mut self) -> UiResult<Option<ElementId>> {
        self.step_focus(true)
    }

    pub fn focus_previous(&mut self) -> UiResult<Option<ElementId>> {
        self.step_focus(false)
    }

    fn step_focus(&mut self, forward: bool) -> UiResult<Option<ElementId>> {
        let ring = self.focus_ring()?;
        let direction = if forward {
            FocusDirection::Next
        } else {
            FocusDirection::Previous
        };
        if let Some(next) = next_in_ring(&ring, self.focus.focused, forward) {
            self.switch_focus(Some(next), direction)?;
        }
        Ok(self.focus.focused)
    }

    fn send_focus_event(
        &mut self,
        kind: EventKind,
        target: ElementId,
        related: Option<ElementId>,
        direction: FocusDirection,
    ) -> UiResult<()> {
        if !self.tree.contains(target) {
            return Ok(());
        }
        let mut event = Event::new(kind)
            .with_target(target)
            .with_related_target(related);
        event.focus_direction = direction;
        self.dispatch(&mut event)
    }
}
