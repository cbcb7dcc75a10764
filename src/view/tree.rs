use crate::error::{UiError, UiResult};
use crate::style::ComputedStyle;
use crate::view::{DirtyFlags, Element, ElementId, LayoutEngine, MeasureFunc, PickingMode};
use slotmap::SlotMap;
use std::rc::Rc;

/// Elements whose panel membership changed during a structural edit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub attached: Vec<ElementId>,
    pub detached: Vec<ElementId>,
}

impl MembershipChange {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// Arena of elements mirrored into a layout engine.
///
/// Children are owned through the parent's child list; the parent link is a
/// plain id. Only the subtree under [`ElementTree::root`] is "in the panel".
pub struct ElementTree {
    pub(crate) elements: SlotMap<ElementId, Element>,
    pub(crate) layout: Box<dyn LayoutEngine>,
    pub(crate) root: ElementId,
    pub(crate) default_style: Rc<ComputedStyle>,
    pub(crate) layout_dirty: Vec<ElementId>,
}

impl ElementTree {
    pub fn new(mut layout: Box<dyn LayoutEngine>) -> UiResult<Self> {
        let default_style = Rc::new(ComputedStyle::default());
        let node = layout.create_node(&default_style)?;
        let mut elements = SlotMap::with_key();
        let mut root = Element::new(node, default_style.clone());
        root.in_panel = true;
        root.picking_mode = PickingMode::Ignore;
        root.name = "root".into();
        root.dirty = DirtyFlags::STYLES | DirtyFlags::TRANSFORM | DirtyFlags::REPAINT;
        let root = elements.insert(root);
        Ok(Self {
            elements,
            layout,
            root,
            default_style,
            layout_dirty: Vec::new(),
        })
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn element(&self, id: ElementId) -> UiResult<&Element> {
        self.elements.get(id).ok_or(UiError::UnknownElement)
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> UiResult<&mut Element> {
        self.elements.get_mut(id).ok_or(UiError::UnknownElement)
    }

    pub fn layout_engine(&self) -> &dyn LayoutEngine {
        self.layout.as_ref()
    }

    /// A detached element with the shared default style.
    pub fn create_element(&mut self) -> UiResult<ElementId> {
        let node = self.layout.create_node(&self.default_style)?;
        Ok(self
            .elements
            .insert(Element::new(node, self.default_style.clone())))
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id)?.parent
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(id)
            .map_or(&[], |element| element.children.as_slice())
    }

    pub fn child_index(&self, parent: ElementId, child: ElementId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Parent first, root last.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent(current);
        }
        out
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Depth-first pre-order, `id` included.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// The physical container that receives logical children of `id`.
    pub fn content_container(&self, id: ElementId) -> ElementId {
        self.elements
            .get(id)
            .and_then(|element| element.content_container)
            .filter(|container| self.contains(*container))
            .unwrap_or(id)
    }

    pub fn logical_children(&self, id: ElementId) -> &[ElementId] {
        self.children(self.content_container(id))
    }

    pub(crate) fn set_content_container(
        &mut self,
        id: ElementId,
        container: ElementId,
    ) -> UiResult<()> {
        self.element(container)?;
        if container != id && !self.is_ancestor_of(id, container) {
            return Err(UiError::NotAChild);
        }
        self.element_mut(id)?.content_container = (container != id).then_some(container);
        Ok(())
    }

    pub fn is_in_panel(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|element| element.in_panel)
    }

    /// Links `child` under `parent` at `index`, detaching it from any previous parent.
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> UiResult<MembershipChange> {
        self.element(parent)?;
        self.element(child)?;
        if parent == child {
            return Err(UiError::SelfParenting);
        }
        if self.is_ancestor_of(child, parent) {
            return Err(UiError::CyclicInsert);
        }

        let mut change = MembershipChange::default();
        let same_parent = self.parent(child) == Some(parent);
        let len = self.children(parent).len() - usize::from(same_parent);
        if index > len {
            return Err(UiError::IndexOutOfRange { index, len });
        }

        let was_in_panel = self.is_in_panel(child);
        if let Some(old_parent) = self.parent(child) {
            self.unlink(old_parent, child)?;
            if old_parent != parent {
                self.mark_dirty(old_parent, DirtyFlags::LAYOUT | DirtyFlags::REPAINT)?;
            }
        }

        let parent_node = self.element(parent)?.layout_node;
        let child_node = self.element(child)?.layout_node;
        let had_children = !self.element(parent)?.children.is_empty();
        if !had_children && self.element(parent)?.measure.is_some() {
            self.layout.clear_measure(parent_node)?;
        }
        self.layout.insert_child(parent_node, index, child_node)?;
        self.element_mut(parent)?.children.insert(index, child);
        self.element_mut(child)?.parent = Some(parent);

        let now_in_panel = self.is_in_panel(parent);
        if now_in_panel != was_in_panel {
            let subtree = self.set_membership(child, now_in_panel);
            if now_in_panel {
                change.attached = subtree;
            } else {
                change.detached = subtree;
            }
        }

        self.mark_inserted(parent, child)?;
        tracing::debug!(?parent, ?child, index, "element inserted");
        Ok(change)
    }

    /// Unlinks `child` from `parent`; the subtree stays alive in the arena.
    pub fn remove_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
    ) -> UiResult<MembershipChange> {
        self.element(parent)?;
        self.element(child)?;
        if self.parent(child) != Some(parent) {
            return Err(UiError::NotAChild);
        }
        let was_in_panel = self.is_in_panel(child);
        self.unlink(parent, child)?;
        self.mark_dirty(parent, DirtyFlags::LAYOUT | DirtyFlags::REPAINT)?;

        let mut change = MembershipChange::default();
        if was_in_panel {
            change.detached = self.set_membership(child, false);
        }
        tracing::debug!(?parent, ?child, "element removed");
        Ok(change)
    }

    /// Detaches `id` and frees it together with its subtree and layout nodes.
    pub fn destroy(&mut self, id: ElementId) -> UiResult<MembershipChange> {
        if id == self.root {
            return Err(UiError::RootElement);
        }
        self.element(id)?;
        let change = match self.parent(id) {
            Some(parent) => self.remove_child(parent, id)?,
            None => MembershipChange::default(),
        };
        for node in self.descendants(id).into_iter().rev() {
            if let Some(element) = self.elements.remove(node) {
                self.layout.remove_node(element.layout_node);
            }
        }
        self.layout_dirty.retain(|dirty| self.elements.contains_key(*dirty));
        Ok(change)
    }

    /// Installs or drops the intrinsic measure; it only reaches the engine while `id` is a leaf.
    pub(crate) fn set_measure(&mut self, id: ElementId, measure: Option<MeasureFunc>) -> UiResult<()> {
        let element = self.element_mut(id)?;
        element.measure = measure.clone();
        let node = element.layout_node;
        let leaf = element.children.is_empty();
        match measure {
            Some(measure) if leaf => self.layout.set_measure(node, measure)?,
            _ if self.layout.has_measure(node) => self.layout.clear_measure(node)?,
            _ => {}
        }
        self.mark_dirty(id, DirtyFlags::LAYOUT)
    }

    fn unlink(&mut self, parent: ElementId, child: ElementId) -> UiResult<()> {
        let parent_node = self.element(parent)?.layout_node;
        let child_node = self.element(child)?.layout_node;
        self.layout.remove_child(parent_node, child_node)?;

        let parent_element = self.element_mut(parent)?;
        parent_element.children.retain(|c| *c != child);
        let now_empty = parent_element.children.is_empty();
        let measure = parent_element.measure.clone();
        if now_empty && let Some(measure) = measure {
            self.layout.set_measure(parent_node, measure)?;
        }

        let child_element = self.element_mut(child)?;
        child_element.parent = None;
        child_element.logical_parent = None;
        Ok(())
    }

    fn set_membership(&mut self, id: ElementId, in_panel: bool) -> Vec<ElementId> {
        let subtree = self.descendants(id);
        for node in &subtree {
            if let Some(element) = self.elements.get_mut(*node) {
                element.in_panel = in_panel;
            }
        }
        subtree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::TaffyLayoutEngine;

    fn tree() -> ElementTree {
        ElementTree::new(Box::new(TaffyLayoutEngine::new())).expect("tree")
    }

    #[test]
    fn insert_reparents_and_reports_membership() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_element().expect("a");
        let b = tree.create_element().expect("b");
        let child = tree.create_element().expect("child");

        let change = tree.insert_child(root, 0, a).expect("insert a");
        assert_eq!(change.attached, vec![a]);
        tree.insert_child(root, 1, b).expect("insert b");
        tree.insert_child(a, 0, child).expect("insert child");
        assert!(tree.is_in_panel(child));

        let change = tree.insert_child(b, 0, child).expect("move child");
        assert!(change.is_empty());
        assert_eq!(tree.children(a), &[] as &[ElementId]);
        assert_eq!(tree.children(b), &[child]);
        assert_eq!(tree.parent(child), Some(b));
    }

    #[test]
    fn insert_rejects_bad_arguments() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_element().expect("a");
        let b = tree.create_element().expect("b");
        tree.insert_child(root, 0, a).expect("insert a");
        tree.insert_child(a, 0, b).expect("insert b");

        assert_eq!(tree.insert_child(a, 0, a), Err(UiError::SelfParenting));
        assert_eq!(tree.insert_child(b, 0, a), Err(UiError::CyclicInsert));
        let c = tree.create_element().expect("c");
        assert_eq!(
            tree.insert_child(a, 5, c),
            Err(UiError::IndexOutOfRange { index: 5, len: 1 })
        );

        tree.destroy(c).expect("destroy");
        assert_eq!(tree.insert_child(a, 0, c), Err(UiError::UnknownElement));
    }

    #[test]
    fn remove_keeps_subtree_and_destroy_frees_it() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_element().expect("a");
        let b = tree.create_element().expect("b");
        tree.insert_child(root, 0, a).expect("insert a");
        tree.insert_child(a, 0, b).expect("insert b");

        let change = tree.remove_child(root, a).expect("remove");
        assert_eq!(change.detached, vec![a, b]);
        assert!(tree.contains(b));
        assert!(!tree.is_in_panel(b));
        assert_eq!(tree.remove_child(root, a), Err(UiError::NotAChild));

        tree.destroy(a).expect("destroy");
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn traversal_orders() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.create_element().expect("a");
        let a1 = tree.create_element().expect("a1");
        let b = tree.create_element().expect("b");
        tree.insert_child(root, 0, a).expect("a");
        tree.insert_child(a, 0, a1).expect("a1");
        tree.insert_child(root, 1, b).expect("b");

        assert_eq!(tree.descendants(root), vec![root, a, a1, b]);
        assert_eq!(tree.ancestors(a1), vec![a, root]);
        assert!(tree.is_ancestor_of(root, a1));
        assert!(!tree.is_ancestor_of(a1, a1));
        assert_eq!(tree.child_index(root, b), Some(1));
    }

    #[test]
    fn measure_follows_child_count() {
        let mut tree = tree();
        let root = tree.root();
        let leaf = tree.create_element().expect("leaf");
        let child = tree.create_element().expect("child");
        tree.insert_child(root, 0, leaf).expect("leaf");
        tree.set_measure(leaf, Some(Rc::new(|_, _, _, _| (10.0, 10.0))))
            .expect("measure");
        let node = tree.element(leaf).expect("leaf").layout_node;
        assert!(tree.layout_engine().has_measure(node));

        tree.insert_child(leaf, 0, child).expect("child");
        assert!(!tree.layout_engine().has_measure(node));
        tree.remove_child(leaf, child).expect("remove");
        assert!(tree.layout_engine().has_measure(node));
    }

    #[test]
    fn content_container_must_be_inside() {
        let mut tree = tree();
        let root = tree.root();
        let outer = tree.create_element().expect("outer");
        let inner = tree.create_element().expect("inner");
        let stranger = tree.create_element().expect("stranger");
        tree.insert_child(root, 0, outer).expect("outer");
        tree.insert_child(outer, 0, inner).expect("inner");

        tree.set_content_container(outer, inner).expect("container");
        assert_eq!(tree.content_container(outer), inner);
        assert_eq!(
            tree.set_content_container(outer, stranger),
            Err(UiError::NotAChild)
        );
    }
}
