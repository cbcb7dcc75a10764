use crate::error::UiResult;
use crate::view::{ElementId, ElementTree};
use bitflags::bitflags;
use glam::Affine2;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        /// Own style must be re-resolved.
        const STYLES = 1 << 0;
        /// Some descendant's style must be re-resolved.
        const STYLES_PATH = 1 << 1;
        /// Cached world transform is stale.
        const TRANSFORM = 1 << 2;
        /// Intrinsic size changed.
        const LAYOUT = 1 << 3;
        const REPAINT = 1 << 4;
    }
}

const DOWNWARD: DirtyFlags = DirtyFlags::STYLES.union(DirtyFlags::TRANSFORM);

impl ElementTree {
    /// Accumulates `flags` on `id` and propagates them.
    ///
    /// STYLES and TRANSFORM flow down to every descendant not already carrying
    /// them. REPAINT flows up to the root; STYLES leaves STYLES_PATH on each
    /// ancestor. Nothing happens when `id` already has every requested bit.
    pub fn mark_dirty(&mut self, id: ElementId, flags: DirtyFlags) -> UiResult<()> {
        let element = self.element_mut(id)?;
        if element.dirty.contains(flags) {
            return Ok(());
        }
        let newly_layout = flags.contains(DirtyFlags::LAYOUT)
            && !element.dirty.contains(DirtyFlags::LAYOUT);
        element.dirty |= flags;
        let node = element.layout_node;

        if newly_layout {
            self.layout_dirty.push(id);
            if self.layout.has_measure(node) {
                self.layout.mark_dirty(node)?;
            }
        }

        let down = flags & DOWNWARD;
        if !down.is_empty() {
            let mut stack: Vec<ElementId> = self.children(id).to_vec();
            while let Some(current) = stack.pop() {
                let Some(element) = self.elements.get_mut(current) else {
                    continue;
                };
                if element.dirty.contains(down) {
                    continue;
                }
                element.dirty |= down;
                stack.extend(element.children.iter().copied());
            }
        }

        let mut up = DirtyFlags::empty();
        if flags.contains(DirtyFlags::REPAINT) {
            up |= DirtyFlags::REPAINT;
        }
        if flags.contains(DirtyFlags::STYLES) {
            up |= DirtyFlags::STYLES_PATH;
        }
        if !up.is_empty() {
            self.mark_ancestors(id, up);
        }
        Ok(())
    }

    /// Removes exactly `flags` from `id`.
    pub fn clear_dirty(&mut self, id: ElementId, flags: DirtyFlags) {
        if let Some(element) = self.elements.get_mut(id) {
            element.dirty.remove(flags);
        }
    }

    pub fn dirty_flags(&self, id: ElementId) -> DirtyFlags {
        self.elements
            .get(id)
            .map_or(DirtyFlags::empty(), |element| element.dirty)
    }

    /// REPAINT reaches every ancestor even past ones already marked, since a
    /// hidden subtree can keep its bit while the path above it was cleared.
    fn mark_ancestors(&mut self, id: ElementId, up: DirtyFlags) {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            let Some(element) = self.elements.get_mut(current) else {
                break;
            };
            if element.dirty.contains(up) && !up.contains(DirtyFlags::REPAINT) {
                break;
            }
            element.dirty |= up;
            cursor = element.parent;
        }
    }

    /// A freshly linked subtree is fully dirty regardless of the bits it carried.
    pub(crate) fn mark_inserted(&mut self, parent: ElementId, child: ElementId) -> UiResult<()> {
        let full = DirtyFlags::STYLES | DirtyFlags::TRANSFORM | DirtyFlags::REPAINT;
        for node in self.descendants(child) {
            if let Some(element) = self.elements.get_mut(node) {
                element.dirty |= full;
            }
        }
        self.mark_ancestors(child, DirtyFlags::STYLES_PATH | DirtyFlags::REPAINT);
        self.mark_dirty(parent, DirtyFlags::LAYOUT)
    }

    /// Lazily recomputes the cached world transform.
    ///
    /// `world = parent.world * translate(parent.rect.position) * local`; a node
    /// without parent uses its local transform alone. Maps the element's parent
    /// content space to panel space.
    pub fn world_transform(&mut self, id: ElementId) -> UiResult<Affine2> {
        let element = self.element(id)?;
        if !element.dirty.contains(DirtyFlags::TRANSFORM) {
            return Ok(element.core.world_transform);
        }

        let mut stale = vec![id];
        let mut cursor = element.parent;
        while let Some(current) = cursor {
            let Some(element) = self.elements.get(current) else {
                break;
            };
            if !element.dirty.contains(DirtyFlags::TRANSFORM) {
                break;
            }
            stale.push(current);
            cursor = element.parent;
        }

        let mut world = Affine2::IDENTITY;
        for node in stale.into_iter().rev() {
            let base = match self.parent(node).and_then(|p| self.elements.get(p)) {
                Some(parent) => {
                    parent.core.world_transform
                        * Affine2::from_translation(parent.core.rect.position())
                }
                None => Affine2::IDENTITY,
            };
            let element = self.element_mut(node)?;
            world = base * element.core.local_matrix();
            element.core.world_transform = world;
            element.dirty.remove(DirtyFlags::TRANSFORM);
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{LocalTransform, Rect, TaffyLayoutEngine};
    use glam::Vec2;

    struct Chain {
        tree: ElementTree,
        a: ElementId,
        b: ElementId,
        c: ElementId,
    }

    fn chain() -> Chain {
        let mut tree = ElementTree::new(Box::new(TaffyLayoutEngine::new())).expect("tree");
        let root = tree.root();
        let a = tree.create_element().expect("a");
        let b = tree.create_element().expect("b");
        let c = tree.create_element().expect("c");
        tree.insert_child(root, 0, a).expect("a");
        tree.insert_child(a, 0, b).expect("b");
        tree.insert_child(b, 0, c).expect("c");
        for id in tree.descendants(root) {
            tree.clear_dirty(id, DirtyFlags::all());
        }
        Chain { tree, a, b, c }
    }

    #[test]
    fn dirty_bits_accumulate_and_clear_exactly() {
        let Chain { mut tree, c, .. } = chain();
        tree.mark_dirty(c, DirtyFlags::REPAINT).expect("repaint");
        tree.mark_dirty(c, DirtyFlags::LAYOUT).expect("layout");
        assert_eq!(
            tree.dirty_flags(c),
            DirtyFlags::REPAINT | DirtyFlags::LAYOUT
        );
        tree.clear_dirty(c, DirtyFlags::LAYOUT);
        assert_eq!(tree.dirty_flags(c), DirtyFlags::REPAINT);
    }

    #[test]
    fn styles_flow_down_and_leave_a_path_upward() {
        let Chain { mut tree, a, b, c } = chain();
        let root = tree.root();
        tree.mark_dirty(a, DirtyFlags::STYLES).expect("styles");

        assert!(tree.dirty_flags(b).contains(DirtyFlags::STYLES));
        assert!(tree.dirty_flags(c).contains(DirtyFlags::STYLES));
        assert!(tree.dirty_flags(root).contains(DirtyFlags::STYLES_PATH));
        assert!(!tree.dirty_flags(root).contains(DirtyFlags::STYLES));
    }

    #[test]
    fn downward_walk_skips_already_dirty_subtrees_only() {
        let Chain { mut tree, a, b, c } = chain();
        tree.mark_dirty(b, DirtyFlags::TRANSFORM).expect("b");
        tree.clear_dirty(c, DirtyFlags::TRANSFORM);
        tree.mark_dirty(a, DirtyFlags::TRANSFORM).expect("a");
        // b was already marked, so its subtree is not revisited.
        assert!(!tree.dirty_flags(c).contains(DirtyFlags::TRANSFORM));

        let sibling = tree.create_element().expect("sibling");
        tree.insert_child(a, 1, sibling).expect("insert");
        tree.clear_dirty(sibling, DirtyFlags::all());
        tree.clear_dirty(a, DirtyFlags::all());
        tree.mark_dirty(a, DirtyFlags::TRANSFORM).expect("again");
        assert!(tree.dirty_flags(sibling).contains(DirtyFlags::TRANSFORM));
    }

    #[test]
    fn repaint_reaches_root() {
        let Chain { mut tree, a, b, c } = chain();
        let root = tree.root();
        tree.mark_dirty(a, DirtyFlags::REPAINT).expect("a");
        tree.clear_dirty(root, DirtyFlags::REPAINT);
        tree.mark_dirty(c, DirtyFlags::REPAINT).expect("c");
        for id in [b, a, root] {
            assert!(tree.dirty_flags(id).contains(DirtyFlags::REPAINT));
        }
    }

    #[test]
    fn world_transform_composes_parent_offsets() {
        let Chain { mut tree, a, b, .. } = chain();
        tree.element_mut(a).expect("a").core.rect = Rect::new(10.0, 20.0, 100.0, 100.0);
        tree.element_mut(b).expect("b").core.transform = LocalTransform::translation(5.0, 0.0);
        tree.mark_dirty(a, DirtyFlags::TRANSFORM).expect("dirty");

        let world = tree.world_transform(b).expect("world");
        assert_eq!(world.transform_point2(Vec2::ZERO), Vec2::new(15.0, 20.0));
        assert!(!tree.dirty_flags(b).contains(DirtyFlags::TRANSFORM));
        assert!(!tree.dirty_flags(a).contains(DirtyFlags::TRANSFORM));

        // Clean reads come from the cache.
        tree.element_mut(a).expect("a").core.rect = Rect::ZERO;
        let cached = tree.world_transform(b).expect("cached");
        assert_eq!(cached, world);
    }
}
