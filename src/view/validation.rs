use crate::error::UiResult;
use crate::style::StyleResolver;
use crate::view::{DirtyFlags, ElementId, ElementTree, Rect};
use std::rc::Rc;

/// What a validation pass touched; all zero when nothing was dirty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub styles_resolved: usize,
    pub layout_computed: bool,
    pub rects_changed: usize,
}

impl ElementTree {
    /// Styles first, then layout. Picking and painting call this before reading geometry.
    pub fn validate(
        &mut self,
        resolver: &dyn StyleResolver,
        viewport: (f32, f32),
        trace_layout: bool,
    ) -> UiResult<ValidationStats> {
        let styles_resolved = self.validate_styles(resolver)?;
        let (layout_computed, rects_changed) =
            self.validate_layout(viewport.0, viewport.1, trace_layout)?;
        Ok(ValidationStats {
            styles_resolved,
            layout_computed,
            rects_changed,
        })
    }

    /// Walks STYLES/STYLES_PATH paths from the root and re-resolves marked elements.
    pub fn validate_styles(&mut self, resolver: &dyn StyleResolver) -> UiResult<usize> {
        let root = self.root;
        if !self
            .dirty_flags(root)
            .intersects(DirtyFlags::STYLES | DirtyFlags::STYLES_PATH)
        {
            return Ok(0);
        }

        let mut resolved = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let flags = self.dirty_flags(id);
            if !flags.intersects(DirtyFlags::STYLES | DirtyFlags::STYLES_PATH) {
                continue;
            }
            if flags.contains(DirtyFlags::STYLES) {
                self.resolve_style(id, resolver)?;
                resolved += 1;
            }
            self.clear_dirty(id, DirtyFlags::STYLES | DirtyFlags::STYLES_PATH);
            stack.extend(self.children(id).iter().rev().copied());
        }
        Ok(resolved)
    }

    fn resolve_style(&mut self, id: ElementId, resolver: &dyn StyleResolver) -> UiResult<()> {
        let parent_style = self
            .parent(id)
            .and_then(|parent| self.get(parent))
            .map(|parent| parent.style.clone());
        let element = self.element(id)?;
        let shared = resolver.resolve(&element.style_target(), parent_style.as_deref());
        let effective = if element.inline_style.is_empty() {
            shared
        } else {
            let mut own = (*shared).clone();
            own.apply(&element.inline_style);
            Rc::new(own)
        };

        let changed = *effective != *element.style;
        let element = self.element_mut(id)?;
        element.style = effective;
        if changed {
            let node = element.layout_node;
            let layout_style = element.layout_style();
            self.layout.set_style(node, &layout_style)?;
            self.mark_dirty(id, DirtyFlags::REPAINT)?;
        }
        Ok(())
    }

    /// Runs the engine when its root is dirty and copies changed rects back.
    ///
    /// A changed rect marks TRANSFORM (flowing to the subtree) and REPAINT. The
    /// walk only descends where the engine reports new layout. Returns whether
    /// the engine ran and how many rects changed.
    pub fn validate_layout(
        &mut self,
        width: f32,
        height: f32,
        trace_layout: bool,
    ) -> UiResult<(bool, usize)> {
        let root = self.root;
        let root_node = self.element(root)?.layout_node;
        if !self.layout.is_dirty(root_node) {
            self.clear_layout_bits();
            return Ok((false, 0));
        }

        self.layout.compute(root_node, width, height)?;
        let mut changed = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let element = self.element(id)?;
            let node = element.layout_node;
            let previous = element.core.rect;
            let rect = self.layout.layout(node);
            if rect != previous {
                if trace_layout {
                    tracing::trace!(?id, ?previous, ?rect, "layout changed");
                }
                self.element_mut(id)?.core.rect = rect;
                self.mark_dirty(id, DirtyFlags::TRANSFORM | DirtyFlags::REPAINT)?;
                changed += 1;
            }
            if self.layout.has_new_layout(node) {
                self.layout.mark_layout_seen(node);
                stack.extend(self.children(id).iter().rev().copied());
            }
        }
        self.clear_layout_bits();
        Ok((true, changed))
    }

    fn clear_layout_bits(&mut self) {
        for id in std::mem::take(&mut self.layout_dirty) {
            self.clear_dirty(id, DirtyFlags::LAYOUT);
        }
    }

    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        self.get(id).map(|element| element.core.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, Selector, Style, StyleSheet};
    use crate::view::TaffyLayoutEngine;

    fn tree_with_rows() -> (ElementTree, ElementId, ElementId) {
        let mut tree = ElementTree::new(Box::new(TaffyLayoutEngine::new())).expect("tree");
        let root = tree.root();
        let a = tree.create_element().expect("a");
        let b = tree.create_element().expect("b");
        tree.insert_child(root, 0, a).expect("a");
        tree.insert_child(root, 1, b).expect("b");
        for (id, height) in [(a, 20.0), (b, 30.0)] {
            let element = tree.element_mut(id).expect("element");
            element.inline_style = Style::new().with_size(50.0, height);
            tree.mark_dirty(id, DirtyFlags::STYLES).expect("dirty");
        }
        (tree, a, b)
    }

    #[test]
    fn styles_then_layout_then_idle() {
        let (mut tree, a, b) = tree_with_rows();
        let sheet = StyleSheet::new();

        let first = tree.validate(&sheet, (800.0, 600.0), false).expect("first");
        assert!(first.layout_computed);
        assert_eq!(tree.rect(a), Some(Rect::new(0.0, 0.0, 50.0, 20.0)));
        assert_eq!(tree.rect(b), Some(Rect::new(0.0, 20.0, 50.0, 30.0)));

        let second = tree.validate(&sheet, (800.0, 600.0), false).expect("second");
        assert_eq!(second, ValidationStats::default());
        assert_eq!(tree.rect(b), Some(Rect::new(0.0, 20.0, 50.0, 30.0)));
        for id in tree.descendants(tree.root()) {
            let flags = tree.dirty_flags(id);
            assert!(!flags.intersects(DirtyFlags::STYLES | DirtyFlags::STYLES_PATH | DirtyFlags::LAYOUT));
        }
    }

    #[test]
    fn elements_without_inline_style_share_the_resolved_record() {
        let mut tree = ElementTree::new(Box::new(TaffyLayoutEngine::new())).expect("tree");
        let root = tree.root();
        let a = tree.create_element().expect("a");
        let b = tree.create_element().expect("b");
        let c = tree.create_element().expect("c");
        for id in [a, b, c] {
            tree.insert_child(root, 0, id).expect("insert");
        }
        tree.element_mut(c).expect("c").inline_style =
            Style::new().with_background(Color::rgb(9, 9, 9));
        let sheet = StyleSheet::new().with_rule(
            Selector::any(),
            Style::new().with_background(Color::rgb(1, 2, 3)),
        );

        tree.validate_styles(&sheet).expect("styles");
        let style_a = tree.get(a).expect("a").shared_style().clone();
        let style_b = tree.get(b).expect("b").shared_style().clone();
        assert!(Rc::ptr_eq(&style_a, &style_b));
        assert_eq!(style_a.background_color, Color::rgb(1, 2, 3));
        assert_eq!(
            tree.get(c).expect("c").style().background_color,
            Color::rgb(9, 9, 9)
        );
    }

    #[test]
    fn changed_rect_marks_transform_on_subtree() {
        let (mut tree, a, _) = tree_with_rows();
        let sheet = StyleSheet::new();
        let inner = tree.create_element().expect("inner");
        tree.insert_child(a, 0, inner).expect("inner");
        tree.validate(&sheet, (800.0, 600.0), false).expect("validate");
        tree.world_transform(inner).expect("world");

        let element = tree.element_mut(a).expect("a");
        element.inline_style = Style::new().with_size(50.0, 20.0).with_margin(5.0);
        tree.mark_dirty(a, DirtyFlags::STYLES).expect("dirty");
        tree.validate(&sheet, (800.0, 600.0), false).expect("validate");

        assert_eq!(tree.rect(a), Some(Rect::new(5.0, 5.0, 50.0, 20.0)));
        assert!(tree.dirty_flags(inner).contains(DirtyFlags::TRANSFORM));
    }
}
