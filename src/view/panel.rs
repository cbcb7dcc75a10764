use crate::config::PanelSettings;
use crate::error::{UiError, UiResult};
use crate::schedule::{Scheduler, SchedulerHost, SystemTimeSource, TimeSource};
use crate::style::{Declaration, ParsedValue, PropertyId, Style, StyleResolver, StyleSheet};
use crate::ui::{
    Event, EventDispatcher, EventKind, EventPool, FocusController, FocusDirection, ListenPhase,
    ListenerHandle,
};
use crate::view::{
    DirtyFlags, Element, ElementBehavior, ElementId, ElementTree, KeyValueStore, LayoutEngine,
    LocalTransform, MeasureFunc, MembershipChange, MemoryStore, PickingMode, PositionMode,
    PseudoStates, Query, Rect, TaffyLayoutEngine, ValidationStats,
};
use glam::{Affine2, Vec2};
use smol_str::SmolStr;
use std::rc::Rc;

/// One UI surface: the element tree plus the dispatcher, focus and scheduler
/// state that drive it.
pub struct Panel {
    pub(crate) tree: ElementTree,
    pub(crate) dispatcher: EventDispatcher,
    pub(crate) focus: FocusController,
    scheduler: Scheduler<Panel>,
    pub(crate) event_pool: EventPool,
    pub(crate) settings: PanelSettings,
    resolver: Box<dyn StyleResolver>,
    store: Box<dyn KeyValueStore>,
}

impl SchedulerHost for Panel {
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

impl Panel {
    pub fn new(settings: PanelSettings) -> UiResult<Self> {
        Self::with_parts(
            settings,
            Box::new(TaffyLayoutEngine::new()),
            Box::new(SystemTimeSource::new()),
        )
    }

    pub fn new_from_env() -> UiResult<Self> {
        Self::new(PanelSettings::new_from_env())
    }

    pub fn with_parts(
        settings: PanelSettings,
        layout: Box<dyn LayoutEngine>,
        clock: Box<dyn TimeSource>,
    ) -> UiResult<Self> {
        let tree = ElementTree::new(layout)?;
        let scheduler = Scheduler::new(clock, settings.scheduler_budget_ms);
        let event_pool = EventPool::new(settings.event_pool_capacity);
        let mut panel = Self {
            tree,
            dispatcher: EventDispatcher::default(),
            focus: FocusController::default(),
            scheduler,
            event_pool,
            settings,
            resolver: Box::new(StyleSheet::new()),
            store: Box::new(MemoryStore::new()),
        };
        panel.pin_root_size()?;
        Ok(panel)
    }

    pub fn with_style_resolver(mut self, resolver: impl StyleResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        let root = self.tree.root();
        if let Err(err) = self.tree.mark_dirty(root, DirtyFlags::STYLES) {
            tracing::warn!(%err, "could not invalidate styles for the new resolver");
        }
        self
    }

    pub fn with_store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Replaces the resolver; every element re-resolves on the next validation.
    pub fn set_style_resolver(&mut self, resolver: impl StyleResolver + 'static) -> UiResult<()> {
        self.resolver = Box::new(resolver);
        self.tree.mark_dirty(self.tree.root(), DirtyFlags::STYLES)
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) -> UiResult<()> {
        self.settings.viewport_width = width.max(0.0);
        self.settings.viewport_height = height.max(0.0);
        self.pin_root_size()
    }

    /// The root always spans the viewport.
    fn pin_root_size(&mut self) -> UiResult<()> {
        let root = self.tree.root();
        let (width, height) = (self.settings.viewport_width, self.settings.viewport_height);
        let element = self.tree.element_mut(root)?;
        element.inline_style.set_size(width, height);
        self.tree.mark_dirty(root, DirtyFlags::STYLES | DirtyFlags::REPAINT)
    }

    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn root(&self) -> ElementId {
        self.tree.root()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.tree.get(id)
    }

    pub fn element(&self, id: ElementId) -> UiResult<&Element> {
        self.tree.element(id)
    }

    pub fn create_element(&mut self) -> UiResult<ElementId> {
        self.tree.create_element()
    }

    pub fn event_pool(&self) -> &EventPool {
        &self.event_pool
    }

    pub fn scheduler(&self) -> &Scheduler<Panel> {
        &self.scheduler
    }

    /// Runs due scheduled callbacks; see [`Scheduler::tick`].
    pub fn tick(&mut self) -> UiResult<usize> {
        Scheduler::tick(self)
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    pub fn query(&self) -> Query<'_> {
        Query::new(&self.tree, self.tree.root())
    }

    pub fn query_in(&self, scope: ElementId) -> Query<'_> {
        Query::new(&self.tree, scope)
    }

    // Element state

    pub fn set_name(&mut self, id: ElementId, name: impl Into<SmolStr>) -> UiResult<()> {
        self.tree.element_mut(id)?.name = name.into();
        self.tree.mark_dirty(id, DirtyFlags::STYLES)
    }

    pub fn add_class(&mut self, id: ElementId, class: impl Into<SmolStr>) -> UiResult<()> {
        let class = class.into();
        let element = self.tree.element_mut(id)?;
        if element.classes.contains(&class) {
            return Ok(());
        }
        element.classes.push(class);
        self.tree.mark_dirty(id, DirtyFlags::STYLES)
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) -> UiResult<()> {
        let element = self.tree.element_mut(id)?;
        let before = element.classes.len();
        element.classes.retain(|c| c != class);
        if element.classes.len() == before {
            return Ok(());
        }
        self.tree.mark_dirty(id, DirtyFlags::STYLES)
    }

    /// Sets or clears `states`. A real change re-resolves the element's style.
    pub fn set_pseudo_state(&mut self, id: ElementId, states: PseudoStates, on: bool) -> UiResult<()> {
        let element = self.tree.element_mut(id)?;
        let before = element.pseudo;
        element.pseudo.set(states, on);
        if element.pseudo == before {
            return Ok(());
        }
        self.tree.mark_dirty(id, DirtyFlags::STYLES | DirtyFlags::REPAINT)
    }

    pub fn set_focusable(&mut self, id: ElementId, focusable: bool) -> UiResult<()> {
        self.tree.element_mut(id)?.focusable = focusable;
        Ok(())
    }

    pub fn set_tab_index(&mut self, id: ElementId, tab_index: i32) -> UiResult<()> {
        self.tree.element_mut(id)?.tab_index = tab_index;
        Ok(())
    }

    pub fn set_picking_mode(&mut self, id: ElementId, mode: PickingMode) -> UiResult<()> {
        self.tree.element_mut(id)?.picking_mode = mode;
        Ok(())
    }

    /// Pins the element to `rect` in its parent's content space.
    pub fn set_rect(&mut self, id: ElementId, rect: Rect) -> UiResult<()> {
        let element = self.tree.element_mut(id)?;
        element.core.position_mode = PositionMode::Manual;
        element.core.manual_rect = rect;
        self.push_layout_style(id)?;
        self.tree.mark_dirty(id, DirtyFlags::LAYOUT | DirtyFlags::REPAINT)
    }

    pub fn set_position_mode(&mut self, id: ElementId, mode: PositionMode) -> UiResult<()> {
        let element = self.tree.element_mut(id)?;
        if element.core.position_mode == mode {
            return Ok(());
        }
        element.core.position_mode = mode;
        self.push_layout_style(id)?;
        self.tree.mark_dirty(id, DirtyFlags::LAYOUT | DirtyFlags::REPAINT)
    }

    pub fn set_local_transform(&mut self, id: ElementId, transform: LocalTransform) -> UiResult<()> {
        self.tree.element_mut(id)?.core.transform = transform;
        self.tree.mark_dirty(id, DirtyFlags::TRANSFORM | DirtyFlags::REPAINT)
    }

    /// Installs the element's behavior; its type name takes part in style matching.
    pub fn set_behavior(&mut self, id: ElementId, behavior: Rc<dyn ElementBehavior>) -> UiResult<()> {
        let element = self.tree.element_mut(id)?;
        element.behavior = Some(behavior.clone());
        let in_panel = element.in_panel;
        self.tree.mark_dirty(id, DirtyFlags::STYLES | DirtyFlags::REPAINT)?;
        if in_panel {
            behavior.on_attach(self, id)?;
        }
        Ok(())
    }

    pub fn set_measure(&mut self, id: ElementId, measure: Option<MeasureFunc>) -> UiResult<()> {
        self.tree.set_measure(id, measure)
    }

    /// Routes logical child operations on `id` to `container`, which must be `id` or inside it.
    pub fn set_content_container(&mut self, id: ElementId, container: ElementId) -> UiResult<()> {
        self.tree.set_content_container(id, container)
    }

    pub fn set_cache_as_bitmap(&mut self, id: ElementId, enabled: bool) -> UiResult<()> {
        self.tree.element_mut(id)?.cache_as_bitmap = enabled;
        self.tree.mark_dirty(id, DirtyFlags::REPAINT)
    }

    pub fn set_view_data_key(&mut self, id: ElementId, key: Option<&str>) -> UiResult<()> {
        self.tree.element_mut(id)?.view_data_key = key.map(SmolStr::new);
        Ok(())
    }

    // Inline style

    /// Writes one inline declaration straight into the element's own style
    /// record and the layout engine.
    pub fn set_style_property(
        &mut self,
        id: ElementId,
        property: PropertyId,
        value: ParsedValue,
    ) -> UiResult<()> {
        let element = self.tree.element_mut(id)?;
        let declaration = Declaration { property, value };
        Rc::make_mut(&mut element.style).apply_declaration(&declaration);
        element.inline_style.insert(declaration.property, declaration.value);
        self.push_layout_style(id)?;

        let mut flags = DirtyFlags::REPAINT;
        if property.affects_layout() {
            flags |= DirtyFlags::LAYOUT;
        }
        if property.is_inherited() {
            // Children pick the new value up when they re-resolve.
            flags |= DirtyFlags::STYLES;
        }
        self.tree.mark_dirty(id, flags)
    }

    /// Merges `style` into the inline declarations; resolved on the next validation.
    pub fn apply_style(&mut self, id: ElementId, style: Style) -> UiResult<()> {
        let element = self.tree.element_mut(id)?;
        let inline = std::mem::take(&mut element.inline_style);
        element.inline_style = inline.merge(style);
        self.tree.mark_dirty(id, DirtyFlags::STYLES | DirtyFlags::REPAINT)
    }

    pub fn remove_style_property(&mut self, id: ElementId, property: PropertyId) -> UiResult<()> {
        if self.tree.element_mut(id)?.inline_style.remove(property).is_none() {
            return Ok(());
        }
        self.tree.mark_dirty(id, DirtyFlags::STYLES | DirtyFlags::REPAINT)
    }

    pub fn clear_inline_style(&mut self, id: ElementId) -> UiResult<()> {
        self.tree.element_mut(id)?.inline_style.clear();
        self.tree.mark_dirty(id, DirtyFlags::STYLES | DirtyFlags::REPAINT)
    }

    fn push_layout_style(&mut self, id: ElementId) -> UiResult<()> {
        let element = self.tree.element(id)?;
        let node = element.layout_node;
        let style = element.layout_style();
        self.tree.layout.set_style(node, &style)
    }

    // Dirty state, validation and geometry

    pub fn mark_dirty(&mut self, id: ElementId, flags: DirtyFlags) -> UiResult<()> {
        self.tree.mark_dirty(id, flags)
    }

    pub fn clear_dirty(&mut self, id: ElementId, flags: DirtyFlags) {
        self.tree.clear_dirty(id, flags);
    }

    pub fn world_transform(&mut self, id: ElementId) -> UiResult<Affine2> {
        self.tree.world_transform(id)
    }

    /// Brings styles and geometry up to date.
    pub fn validate(&mut self) -> UiResult<ValidationStats> {
        let viewport = (self.settings.viewport_width, self.settings.viewport_height);
        self.tree
            .validate(self.resolver.as_ref(), viewport, self.settings.trace_layout)
    }

    /// Topmost pickable element under `point`, against freshly validated geometry.
    pub fn pick(&mut self, point: Vec2) -> Option<ElementId> {
        if let Err(err) = self.validate() {
            tracing::warn!(%err, "validation failed before pick");
            return None;
        }
        self.tree.pick(point)
    }

    pub fn pick_all(&mut self, point: Vec2) -> Vec<ElementId> {
        if let Err(err) = self.validate() {
            tracing::warn!(%err, "validation failed before pick");
            return Vec::new();
        }
        self.tree.pick_all(point)
    }

    // Listeners

    pub fn register_callback<F>(
        &mut self,
        id: ElementId,
        kind: EventKind,
        phase: ListenPhase,
        callback: F,
    ) -> UiResult<ListenerHandle>
    where
        F: FnMut(&mut Event, &mut Panel) -> UiResult<()> + 'static,
    {
        Ok(self.tree.element_mut(id)?.listeners.add(kind, phase, callback))
    }

    pub fn unregister_callback(&mut self, id: ElementId, handle: ListenerHandle) -> UiResult<bool> {
        Ok(self.tree.element_mut(id)?.listeners.remove(handle))
    }

    // Physical hierarchy

    pub fn hierarchy_insert(&mut self, parent: ElementId, index: usize, child: ElementId) -> UiResult<()> {
        if self.tree.is_in_panel(child) && !self.tree.is_in_panel(parent) {
            self.blur_if_inside(child)?;
        }
        let change = self.tree.insert_child(parent, index, child)?;
        self.apply_membership(change)
    }

    pub fn hierarchy_add(&mut self, parent: ElementId, child: ElementId) -> UiResult<()> {
        let index = self.tree.element(parent)?.children.len();
        let index = index - usize::from(self.tree.parent(child) == Some(parent));
        self.hierarchy_insert(parent, index, child)
    }

    /// Unlinks `child`; it stays alive for re-insertion until [`Panel::destroy`].
    pub fn hierarchy_remove(&mut self, parent: ElementId, child: ElementId) -> UiResult<()> {
        if self.tree.parent(child) != Some(parent) {
            return Err(UiError::NotAChild);
        }
        self.blur_if_inside(child)?;
        let change = self.tree.remove_child(parent, child)?;
        self.apply_membership(change)
    }

    pub fn hierarchy_remove_at(&mut self, parent: ElementId, index: usize) -> UiResult<ElementId> {
        let children = self.tree.element(parent)?.children();
        let child = *children.get(index).ok_or(UiError::IndexOutOfRange {
            index,
            len: children.len(),
        })?;
        self.hierarchy_remove(parent, child)?;
        Ok(child)
    }

    pub fn hierarchy_clear(&mut self, parent: ElementId) -> UiResult<()> {
        while let Some(child) = self.tree.element(parent)?.children.last().copied() {
            self.hierarchy_remove(parent, child)?;
        }
        Ok(())
    }

    // Logical hierarchy: operations on a composite land in its content container.

    pub fn insert(&mut self, parent: ElementId, index: usize, child: ElementId) -> UiResult<()> {
        let container = self.tree.content_container(parent);
        self.hierarchy_insert(container, index, child)?;
        if container != parent {
            self.tree.element_mut(child)?.logical_parent = Some(parent);
        }
        Ok(())
    }

    pub fn add(&mut self, parent: ElementId, child: ElementId) -> UiResult<()> {
        let container = self.tree.content_container(parent);
        self.hierarchy_add(container, child)?;
        if container != parent {
            self.tree.element_mut(child)?.logical_parent = Some(parent);
        }
        Ok(())
    }

    pub fn remove(&mut self, parent: ElementId, child: ElementId) -> UiResult<()> {
        self.hierarchy_remove(self.tree.content_container(parent), child)
    }

    pub fn remove_at(&mut self, parent: ElementId, index: usize) -> UiResult<ElementId> {
        self.hierarchy_remove_at(self.tree.content_container(parent), index)
    }

    pub fn clear(&mut self, parent: ElementId) -> UiResult<()> {
        self.hierarchy_clear(self.tree.content_container(parent))
    }

    pub fn logical_children(&self, id: ElementId) -> &[ElementId] {
        self.tree.logical_children(id)
    }

    pub fn logical_parent(&self, id: ElementId) -> Option<ElementId> {
        self.tree.get(id)?.logical_parent()
    }

    /// Detaches `id` and frees it with its whole subtree.
    pub fn destroy(&mut self, id: ElementId) -> UiResult<()> {
        if id == self.tree.root() {
            return Err(UiError::RootElement);
        }
        self.tree.element(id)?;
        if let Some(parent) = self.tree.parent(id) {
            self.hierarchy_remove(parent, id)?;
        }
        let subtree = self.tree.descendants(id);
        if let Some(holder) = self.dispatcher.capture
            && subtree.contains(&holder)
        {
            tracing::debug!(?holder, "pointer capture holder destroyed");
            self.dispatcher.capture = None;
        }
        self.tree.destroy(id)?;
        Ok(())
    }

    /// Moves focus away before `subtree` leaves the panel, so the blur is heard in place.
    fn blur_if_inside(&mut self, subtree: ElementId) -> UiResult<()> {
        if let Some(focused) = self.focus.focused
            && (focused == subtree || self.tree.is_ancestor_of(subtree, focused))
        {
            self.switch_focus(None, FocusDirection::None)?;
        }
        Ok(())
    }

    fn apply_membership(&mut self, change: MembershipChange) -> UiResult<()> {
        for id in &change.detached {
            self.dispatcher.forget(*id);
            if self.focus.focused == Some(*id) {
                self.focus.focused = None;
            }
            self.set_pseudo_state(
                *id,
                PseudoStates::HOVER | PseudoStates::ACTIVE | PseudoStates::FOCUSED,
                false,
            )?;
        }
        for id in change.detached {
            let behavior = self.tree.get(id).and_then(|element| element.behavior.clone());
            if let Some(behavior) = behavior {
                behavior.on_detach(self, id);
            }
        }
        for id in change.attached {
            let behavior = self.tree.get(id).and_then(|element| element.behavior.clone());
            if let Some(behavior) = behavior {
                behavior.on_attach(self, id)?;
            }
        }
        Ok(())
    }
}
