use crate::error::{UiError, UiResult};
use crate::style::{
    AlignItems, AlignSelf, ComputedStyle, Display, EdgeInsets, FlexDirection, FlexWrap,
    JustifyContent, Length, Overflow, PositionType, SizeValue,
};
use crate::view::Rect;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;
use taffy::{AvailableSpace, NodeId, TaffyTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureMode {
    Undefined,
    Exactly,
    AtMost,
}

/// Intrinsic size callback: `(width, width_mode, height, height_mode) -> (width, height)`.
pub type MeasureFunc = Rc<dyn Fn(f32, MeasureMode, f32, MeasureMode) -> (f32, f32)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutNodeId(pub u64);

/// Flexbox solver the tree mirrors its structure and styles into.
pub trait LayoutEngine {
    fn create_node(&mut self, style: &ComputedStyle) -> UiResult<LayoutNodeId>;
    fn remove_node(&mut self, node: LayoutNodeId);
    fn set_style(&mut self, node: LayoutNodeId, style: &ComputedStyle) -> UiResult<()>;
    fn insert_child(
        &mut self,
        parent: LayoutNodeId,
        index: usize,
        child: LayoutNodeId,
    ) -> UiResult<()>;
    fn remove_child(&mut self, parent: LayoutNodeId, child: LayoutNodeId) -> UiResult<()>;
    fn set_measure(&mut self, node: LayoutNodeId, measure: MeasureFunc) -> UiResult<()>;
    fn clear_measure(&mut self, node: LayoutNodeId) -> UiResult<()>;
    fn has_measure(&self, node: LayoutNodeId) -> bool;
    fn mark_dirty(&mut self, node: LayoutNodeId) -> UiResult<()>;
    fn is_dirty(&self, node: LayoutNodeId) -> bool;
    fn compute(&mut self, root: LayoutNodeId, available_width: f32, available_height: f32)
    -> UiResult<()>;
    /// Rect relative to the parent's origin, as of the last compute.
    fn layout(&self, node: LayoutNodeId) -> Rect;
    /// Whether this node or a descendant changed in a compute not yet acknowledged.
    fn has_new_layout(&self, node: LayoutNodeId) -> bool;
    fn mark_layout_seen(&mut self, node: LayoutNodeId);
}

pub struct TaffyLayoutEngine {
    tree: TaffyTree<MeasureFunc>,
    previous: FxHashMap<NodeId, Rect>,
    fresh: FxHashSet<NodeId>,
}

impl Default for TaffyLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TaffyLayoutEngine {
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
            previous: FxHashMap::default(),
            fresh: FxHashSet::default(),
        }
    }

    /// Records which nodes moved or resized since the previous compute.
    fn collect_fresh(&mut self, node: NodeId) -> bool {
        let children = self.tree.children(node).unwrap_or_default();
        let mut child_fresh = false;
        for child in children {
            child_fresh |= self.collect_fresh(child);
        }

        let current = self.read_layout(node);
        let changed = self.previous.insert(node, current) != Some(current);
        let fresh = changed || child_fresh;
        if fresh {
            self.fresh.insert(node);
        }
        fresh
    }

    fn read_layout(&self, node: NodeId) -> Rect {
        match self.tree.layout(node) {
            Ok(layout) => Rect::new(
                layout.location.x,
                layout.location.y,
                layout.size.width,
                layout.size.height,
            ),
            Err(_) => Rect::ZERO,
        }
    }
}

fn node_id(node: LayoutNodeId) -> NodeId {
    NodeId::from(node.0)
}

fn layout_err(err: taffy::TaffyError) -> UiError {
    UiError::Layout(err.to_string())
}

impl LayoutEngine for TaffyLayoutEngine {
    fn create_node(&mut self, style: &ComputedStyle) -> UiResult<LayoutNodeId> {
        let node = self.tree.new_leaf(to_taffy_style(style)).map_err(layout_err)?;
        Ok(LayoutNodeId(u64::from(node)))
    }

    fn remove_node(&mut self, node: LayoutNodeId) {
        let node = node_id(node);
        self.previous.remove(&node);
        self.fresh.remove(&node);
        if let Err(err) = self.tree.remove(node) {
            tracing::warn!(%err, "removing unknown layout node");
        }
    }

    fn set_style(&mut self, node: LayoutNodeId, style: &ComputedStyle) -> UiResult<()> {
        self.tree
            .set_style(node_id(node), to_taffy_style(style))
            .map_err(layout_err)
    }

    fn insert_child(
        &mut self,
        parent: LayoutNodeId,
        index: usize,
        child: LayoutNodeId,
    ) -> UiResult<()> {
        self.tree
            .insert_child_at_index(node_id(parent), index, node_id(child))
            .map_err(layout_err)
    }

    fn remove_child(&mut self, parent: LayoutNodeId, child: LayoutNodeId) -> UiResult<()> {
        self.tree
            .remove_child(node_id(parent), node_id(child))
            .map(|_| ())
            .map_err(layout_err)
    }

    fn set_measure(&mut self, node: LayoutNodeId, measure: MeasureFunc) -> UiResult<()> {
        let node = node_id(node);
        self.tree
            .set_node_context(node, Some(measure))
            .map_err(layout_err)?;
        self.tree.mark_dirty(node).map_err(layout_err)
    }

    fn clear_measure(&mut self, node: LayoutNodeId) -> UiResult<()> {
        let node = node_id(node);
        self.tree.set_node_context(node, None).map_err(layout_err)?;
        self.tree.mark_dirty(node).map_err(layout_err)
    }

    fn has_measure(&self, node: LayoutNodeId) -> bool {
        self.tree.get_node_context(node_id(node)).is_some()
    }

    fn mark_dirty(&mut self, node: LayoutNodeId) -> UiResult<()> {
        self.tree.mark_dirty(node_id(node)).map_err(layout_err)
    }

    fn is_dirty(&self, node: LayoutNodeId) -> bool {
        self.tree.dirty(node_id(node)).unwrap_or(false)
    }

    fn compute(
        &mut self,
        root: LayoutNodeId,
        available_width: f32,
        available_height: f32,
    ) -> UiResult<()> {
        let root = node_id(root);
        let available = taffy::Size {
            width: AvailableSpace::Definite(available_width),
            height: AvailableSpace::Definite(available_height),
        };
        self.tree
            .compute_layout_with_measure(
                root,
                available,
                |known, available, _node, context, _style| {
                    let Some(measure) = context else {
                        return taffy::Size::ZERO;
                    };
                    let (width, width_mode) = measure_axis(known.width, available.width);
                    let (height, height_mode) = measure_axis(known.height, available.height);
                    let (measured_width, measured_height) =
                        measure(width, width_mode, height, height_mode);
                    taffy::Size {
                        width: known.width.unwrap_or(measured_width),
                        height: known.height.unwrap_or(measured_height),
                    }
                },
            )
            .map_err(layout_err)?;
        self.collect_fresh(root);
        Ok(())
    }

    fn layout(&self, node: LayoutNodeId) -> Rect {
        self.read_layout(node_id(node))
    }

    fn has_new_layout(&self, node: LayoutNodeId) -> bool {
        self.fresh.contains(&node_id(node))
    }

    fn mark_layout_seen(&mut self, node: LayoutNodeId) {
        self.fresh.remove(&node_id(node));
    }
}

fn measure_axis(known: Option<f32>, available: AvailableSpace) -> (f32, MeasureMode) {
    match (known, available) {
        (Some(size), _) => (size, MeasureMode::Exactly),
        (None, AvailableSpace::Definite(size)) => (size, MeasureMode::AtMost),
        (None, _) => (f32::INFINITY, MeasureMode::Undefined),
    }
}

fn to_dimension(value: SizeValue) -> taffy::Dimension {
    match value {
        SizeValue::Auto => taffy::Dimension::Auto,
        SizeValue::Length(Length::Px(v)) => taffy::Dimension::Length(v),
        SizeValue::Length(Length::Percent(v)) => taffy::Dimension::Percent(v / 100.0),
        SizeValue::Length(Length::Zero) => taffy::Dimension::Length(0.0),
    }
}

fn to_lpa(value: SizeValue) -> taffy::LengthPercentageAuto {
    match value {
        SizeValue::Auto => taffy::LengthPercentageAuto::Auto,
        SizeValue::Length(length) => to_lpa_length(length),
    }
}

fn to_lpa_length(length: Length) -> taffy::LengthPercentageAuto {
    match length {
        Length::Px(v) => taffy::LengthPercentageAuto::Length(v),
        Length::Percent(v) => taffy::LengthPercentageAuto::Percent(v / 100.0),
        Length::Zero => taffy::LengthPercentageAuto::Length(0.0),
    }
}

fn to_lp(length: Length) -> taffy::LengthPercentage {
    match length {
        Length::Px(v) => taffy::LengthPercentage::Length(v),
        Length::Percent(v) => taffy::LengthPercentage::Percent(v / 100.0),
        Length::Zero => taffy::LengthPercentage::Length(0.0),
    }
}

fn to_rect<T: Copy, U>(insets: EdgeInsets<T>, f: impl Fn(T) -> U) -> taffy::Rect<U> {
    taffy::Rect {
        left: f(insets.left),
        right: f(insets.right),
        top: f(insets.top),
        bottom: f(insets.bottom),
    }
}

fn to_taffy_style(style: &ComputedStyle) -> taffy::Style {
    let overflow = match style.overflow {
        Overflow::Visible => taffy::Overflow::Visible,
        Overflow::Hidden => taffy::Overflow::Hidden,
    };
    taffy::Style {
        display: match style.display {
            Display::Flex => taffy::Display::Flex,
            Display::None => taffy::Display::None,
        },
        position: match style.position {
            PositionType::Relative => taffy::Position::Relative,
            PositionType::Absolute => taffy::Position::Absolute,
        },
        inset: to_rect(style.inset, to_lpa),
        size: taffy::Size {
            width: to_dimension(style.width),
            height: to_dimension(style.height),
        },
        min_size: taffy::Size {
            width: to_dimension(style.min_width),
            height: to_dimension(style.min_height),
        },
        max_size: taffy::Size {
            width: to_dimension(style.max_width),
            height: to_dimension(style.max_height),
        },
        margin: to_rect(style.margin, to_lpa_length),
        padding: to_rect(style.padding, to_lp),
        border: to_rect(style.border_widths, to_lp),
        gap: taffy::Size {
            width: to_lp(style.gap),
            height: to_lp(style.gap),
        },
        flex_direction: match style.flex_direction {
            FlexDirection::Row => taffy::FlexDirection::Row,
            FlexDirection::Column => taffy::FlexDirection::Column,
            FlexDirection::RowReverse => taffy::FlexDirection::RowReverse,
            FlexDirection::ColumnReverse => taffy::FlexDirection::ColumnReverse,
        },
        flex_wrap: match style.flex_wrap {
            FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
            FlexWrap::Wrap => taffy::FlexWrap::Wrap,
        },
        justify_content: Some(match style.justify_content {
            JustifyContent::Start => taffy::JustifyContent::FlexStart,
            JustifyContent::Center => taffy::JustifyContent::Center,
            JustifyContent::End => taffy::JustifyContent::FlexEnd,
            JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
            JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
            JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
        }),
        align_items: Some(match style.align_items {
            AlignItems::Start => taffy::AlignItems::FlexStart,
            AlignItems::Center => taffy::AlignItems::Center,
            AlignItems::End => taffy::AlignItems::FlexEnd,
            AlignItems::Stretch => taffy::AlignItems::Stretch,
        }),
        align_self: match style.align_self {
            AlignSelf::Auto => None,
            AlignSelf::Start => Some(taffy::AlignSelf::FlexStart),
            AlignSelf::Center => Some(taffy::AlignSelf::Center),
            AlignSelf::End => Some(taffy::AlignSelf::FlexEnd),
            AlignSelf::Stretch => Some(taffy::AlignSelf::Stretch),
        },
        flex_grow: style.flex_grow,
        flex_shrink: style.flex_shrink,
        flex_basis: to_dimension(style.flex_basis),
        overflow: taffy::Point {
            x: overflow,
            y: overflow,
        },
        ..Default::default()
    }
}
