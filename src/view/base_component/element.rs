use super::{ElementCore, ElementId, LocalTransform, PositionMode, Rect};
use crate::error::UiResult;
use crate::style::{
    ComputedStyle, EdgeInsets, Length, PositionType, SizeValue, Style, StyleTarget,
};
use crate::ui::{Event, InputRecord, Listeners};
use crate::view::render_backend::{PaintContext, RenderCache, RenderError};
use crate::view::{DirtyFlags, LayoutNodeId, MeasureFunc, Panel};
use bitflags::bitflags;
use glam::Affine2;
use smol_str::SmolStr;
use std::any::Any;
use std::rc::Rc;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct PseudoStates: u8 {
        const ACTIVE = 1 << 0;
        const HOVER = 1 << 1;
        const CHECKED = 1 << 2;
        const SELECTED = 1 << 3;
        const DISABLED = 1 << 4;
        const FOCUSED = 1 << 5;
        const INVISIBLE = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PickingMode {
    #[default]
    Position,
    Ignore,
}

/// Per-kind behavior attached to an element: widgets implement this.
///
/// Every hook receives the panel so it can mutate the tree or dispatch; a
/// behavior keeps its own state behind interior mutability because hooks may
/// re-enter through nested dispatch.
pub trait ElementBehavior: Any {
    fn type_name(&self) -> &'static str;

    /// Built-in reaction run after propagation unless the event's default was prevented.
    fn default_action(&self, _panel: &mut Panel, _id: ElementId, _event: &mut Event) -> UiResult<()> {
        Ok(())
    }

    /// Raw records that have no typed event. Returns whether the record was consumed.
    fn on_input(&self, _panel: &mut Panel, _id: ElementId, _input: &InputRecord) -> UiResult<bool> {
        Ok(false)
    }

    fn on_attach(&self, _panel: &mut Panel, _id: ElementId) -> UiResult<()> {
        Ok(())
    }

    fn on_detach(&self, _panel: &mut Panel, _id: ElementId) {}

    fn paint(&self, _element: &Element, _ctx: &mut PaintContext<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
}

pub struct Element {
    pub(crate) id: u64,
    pub(crate) name: SmolStr,
    pub(crate) classes: Vec<SmolStr>,
    pub(crate) core: ElementCore,
    pub(crate) style: Rc<ComputedStyle>,
    pub(crate) inline_style: Style,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) logical_parent: Option<ElementId>,
    pub(crate) content_container: Option<ElementId>,
    pub(crate) pseudo: PseudoStates,
    pub(crate) dirty: DirtyFlags,
    pub(crate) layout_node: LayoutNodeId,
    pub(crate) measure: Option<MeasureFunc>,
    pub(crate) picking_mode: PickingMode,
    pub(crate) focusable: bool,
    pub(crate) tab_index: i32,
    pub(crate) listeners: Listeners,
    pub(crate) behavior: Option<Rc<dyn ElementBehavior>>,
    pub(crate) cache_as_bitmap: bool,
    pub(crate) render_cache: Option<RenderCache>,
    pub(crate) in_panel: bool,
    pub(crate) view_data_key: Option<SmolStr>,
}

impl Element {
    pub(crate) fn new(layout_node: LayoutNodeId, style: Rc<ComputedStyle>) -> Self {
        Self {
            id: super::next_ui_node_id(),
            name: SmolStr::default(),
            classes: Vec::new(),
            core: ElementCore::new(),
            style,
            inline_style: Style::new(),
            parent: None,
            children: Vec::new(),
            logical_parent: None,
            content_container: None,
            pseudo: PseudoStates::empty(),
            dirty: DirtyFlags::empty(),
            layout_node,
            measure: None,
            picking_mode: PickingMode::Position,
            focusable: false,
            tab_index: 0,
            listeners: Listeners::default(),
            behavior: None,
            cache_as_bitmap: false,
            render_cache: None,
            in_panel: false,
            view_data_key: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[SmolStr] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn type_name(&self) -> &'static str {
        self.behavior
            .as_ref()
            .map(|behavior| behavior.type_name())
            .unwrap_or("Element")
    }

    /// Rect in the parent's content space.
    pub fn rect(&self) -> Rect {
        self.core.rect
    }

    pub fn position_mode(&self) -> PositionMode {
        self.core.position_mode
    }

    pub fn local_transform(&self) -> LocalTransform {
        self.core.transform
    }

    /// Last computed world transform; may be stale while TRANSFORM is dirty.
    pub fn cached_world_transform(&self) -> Affine2 {
        self.core.world_transform
    }

    pub fn style(&self) -> &ComputedStyle {
        &self.style
    }

    pub fn shared_style(&self) -> &Rc<ComputedStyle> {
        &self.style
    }

    pub fn inline_style(&self) -> &Style {
        &self.inline_style
    }

    pub fn has_inline_style(&self) -> bool {
        !self.inline_style.is_empty()
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn logical_parent(&self) -> Option<ElementId> {
        self.logical_parent.or(self.parent)
    }

    pub fn pseudo_states(&self) -> PseudoStates {
        self.pseudo
    }

    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn picking_mode(&self) -> PickingMode {
        self.picking_mode
    }

    pub fn is_focusable_flag(&self) -> bool {
        self.focusable
    }

    pub fn tab_index(&self) -> i32 {
        self.tab_index
    }

    pub fn in_panel(&self) -> bool {
        self.in_panel
    }

    pub fn is_displayed(&self) -> bool {
        self.style.is_displayed() && !self.pseudo.contains(PseudoStates::INVISIBLE)
    }

    pub fn clips_children(&self) -> bool {
        self.style.clips_children()
    }

    pub fn cache_as_bitmap(&self) -> bool {
        self.cache_as_bitmap
    }

    pub fn has_render_cache(&self) -> bool {
        self.render_cache.is_some()
    }

    pub fn view_data_key(&self) -> Option<&str> {
        self.view_data_key.as_deref()
    }

    pub fn behavior(&self) -> Option<&Rc<dyn ElementBehavior>> {
        self.behavior.as_ref()
    }

    pub fn behavior_as<T: ElementBehavior>(&self) -> Option<&T> {
        self.behavior.as_ref()?.as_any().downcast_ref::<T>()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn style_target(&self) -> StyleTarget<'_> {
        StyleTarget {
            type_name: self.type_name(),
            name: &self.name,
            classes: &self.classes,
            pseudo: self.pseudo,
        }
    }

    /// The style the layout engine should see; manual elements are pinned to their rect.
    pub(crate) fn layout_style(&self) -> ComputedStyle {
        let mut style = (*self.style).clone();
        if self.core.position_mode == PositionMode::Manual {
            let rect = self.core.manual_rect;
            let auto = SizeValue::Auto;
            let px = |v: f32| SizeValue::Length(Length::Px(v));
            style.position = PositionType::Absolute;
            style.inset = EdgeInsets {
                top: px(rect.y),
                left: px(rect.x),
                right: auto,
                bottom: auto,
            };
            style.width = px(rect.width);
            style.height = px(rect.height);
            style.margin = EdgeInsets::uniform(Length::Zero);
        }
        style
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .field("name", &self.name)
            .field("rect", &self.core.rect)
            .field("children", &self.children.len())
            .field("pseudo", &self.pseudo)
            .field("dirty", &self.dirty)
            .finish()
    }
}
